//! Tracing subscriber bootstrap, mirroring the ergonomics of a typical
//! `init_tracing()` helper: env-filterable, safe to call once at process
//! start.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber that writes formatted logs to
/// stderr, honoring `RUST_LOG` when set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
