use driftnet_core::Result;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::SqlxErrorExt;
use crate::models::{Provider, ProviderRow};

/// Persists the registry's view of providers: name, version, and the
/// declared capability map. `upsert` is idempotent — re-registering a
/// provider under the same name simply refreshes version/capabilities.
pub struct ProviderRepository {
    pool: SqlitePool,
}

impl ProviderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, name: &str, version: &str, capabilities: &Value) -> Result<()> {
        let capabilities_text = capabilities.to_string();
        sqlx::query(
            "INSERT INTO provider (name, version, capabilities) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET version = excluded.version, capabilities = excluded.capabilities",
        )
        .bind(name)
        .bind(version)
        .bind(capabilities_text)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<Option<Provider>> {
        let row: Option<ProviderRow> =
            sqlx::query_as("SELECT name, version, capabilities FROM provider WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| e.into_driftnet_error())?;
        Ok(row.map(Provider::from))
    }

    pub async fn list(&self) -> Result<Vec<Provider>> {
        let rows: Vec<ProviderRow> = sqlx::query_as("SELECT name, version, capabilities FROM provider")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_driftnet_error())?;
        Ok(rows.into_iter().map(Provider::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnet_core::DatabaseTarget;

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let pool = crate::pool::connect(&DatabaseTarget::Memory).await.unwrap();
        let repo = ProviderRepository::new(pool);
        repo.upsert("bluesky", "1.0.0", &serde_json::json!({"search": true}))
            .await
            .unwrap();
        let found = repo.get("bluesky").await.unwrap().unwrap();
        assert_eq!(found.version, "1.0.0");
        assert_eq!(found.capabilities["search"], true);
    }

    #[tokio::test]
    async fn upsert_twice_refreshes_version() {
        let pool = crate::pool::connect(&DatabaseTarget::Memory).await.unwrap();
        let repo = ProviderRepository::new(pool);
        repo.upsert("bluesky", "1.0.0", &serde_json::json!({}))
            .await
            .unwrap();
        repo.upsert("bluesky", "1.1.0", &serde_json::json!({}))
            .await
            .unwrap();
        let found = repo.get("bluesky").await.unwrap().unwrap();
        assert_eq!(found.version, "1.1.0");
    }
}
