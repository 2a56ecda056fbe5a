//! Bluesky AT-Protocol provider: search and author-feed modes against the
//! public and authenticated XRPC surfaces.

pub mod normalize;
pub mod provider;

pub use provider::BlueskyProvider;

/// Registers the built-in `bluesky` provider factory. Called once at
/// process startup (see `driftnet::configure`).
pub fn register(override_existing: bool) -> driftnet_core::Result<()> {
    driftnet_providers::registry::register(
        "bluesky",
        Box::new(|| Box::new(BlueskyProvider::new())),
        override_existing,
    )
}
