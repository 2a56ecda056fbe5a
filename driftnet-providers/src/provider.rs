use async_trait::async_trait;
use driftnet_core::Result;

use crate::types::{Batch, Filters, ProviderOptions, Session};

/// The provider abstraction: turns an external, paginated,
/// partially-authenticated HTTP feed into normalized batches of posts.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn configure(&mut self, options: ProviderOptions) -> Result<Session>;

    async fn fetch_since(
        &self,
        cursor: Option<String>,
        limit: u32,
        filters: &Filters,
    ) -> Result<Batch>;
}

/// Constructs a fresh, unconfigured provider instance. Registered per name
/// in the [`crate::registry`].
pub type ProviderFactory = Box<dyn Fn() -> Box<dyn Provider> + Send + Sync>;

impl std::fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Provider")
    }
}
