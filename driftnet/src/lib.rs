//! Public API facade: `configure`, `collect`, `query`, `status` over a
//! canonical social-media store. Thin wrappers (the CLI, tests) depend
//! only on this crate.

use driftnet_core::{DatabaseTarget, Result, Settings};
use driftnet_store::Store;

pub mod prelude {
    pub use crate::{Runtime, RuntimeInfo};
    pub use driftnet_engine::{
        CollectAuth, CollectReport, CollectRequest, QueryPage, QueryRequest, StatusRequest,
        StatusSnapshot,
    };
}

#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub database: DatabaseTarget,
}

/// A configured runtime: a connected store plus the built-in provider
/// registrations. One `Runtime` is enough for any number of concurrent
/// `collect`/`query`/`status` calls.
pub struct Runtime {
    pub info: RuntimeInfo,
    store: Store,
}

impl Runtime {
    /// Connects to `database_url` (or in-memory SQLite when `None`/empty)
    /// and registers the built-in providers.
    pub async fn configure(database_url: Option<&str>) -> Result<Self> {
        let settings = match database_url {
            Some(url) if !url.is_empty() => Settings::in_memory().with_database_url(url)?,
            _ => Settings::load()?,
        };
        Self::configure_with_settings(settings).await
    }

    pub async fn configure_with_settings(settings: Settings) -> Result<Self> {
        driftnet_core::init_tracing();
        driftnet_bluesky::register(true)?;
        let store = Store::connect(&settings.database).await?;
        tracing::info!(target: "driftnet", database = ?settings.database, "runtime configured");
        Ok(Self {
            info: RuntimeInfo {
                database: settings.database,
            },
            store,
        })
    }

    pub async fn collect(&self, request: driftnet_engine::CollectRequest) -> Result<driftnet_engine::CollectReport> {
        tracing::info!(target: "driftnet", provider = %request.provider, "collect requested");
        driftnet_engine::collect(&self.store, request).await
    }

    pub async fn query(&self, request: driftnet_engine::QueryRequest) -> Result<driftnet_engine::QueryPage> {
        tracing::debug!(target: "driftnet", entity = %request.entity, "query requested");
        driftnet_engine::query(&self.store, request).await
    }

    pub async fn status(&self, request: driftnet_engine::StatusRequest) -> Result<driftnet_engine::StatusSnapshot> {
        tracing::debug!(target: "driftnet", provider = ?request.provider, "status requested");
        driftnet_engine::status(&self.store, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnet_engine::CollectRequest;

    #[tokio::test]
    async fn configure_in_memory_runs_migrations() {
        let runtime = Runtime::configure(None).await.unwrap();
        assert_eq!(runtime.info.database, DatabaseTarget::Memory);
    }

    #[tokio::test]
    async fn collect_validates_source_xor_q() {
        let runtime = Runtime::configure(None).await.unwrap();
        let err = runtime
            .collect(CollectRequest {
                provider: "bluesky".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, driftnet_core::Error::InvalidArgument(_)));
    }
}
