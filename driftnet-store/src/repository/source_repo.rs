use driftnet_core::Result;
use sqlx::SqlitePool;

use crate::error::SqlxErrorExt;
use crate::models::Source;

/// Sources are identified by `(provider, descriptor)` — a stable external
/// key such as a search string or an actor handle. `get_or_create` is the
/// only write path: sources are never mutated once created.
pub struct SourceRepository {
    pool: SqlitePool,
}

impl SourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_or_create(
        &self,
        provider: &str,
        descriptor: &str,
        label: Option<&str>,
    ) -> Result<Source> {
        sqlx::query("INSERT OR IGNORE INTO source (provider, descriptor, label) VALUES (?, ?, ?)")
            .bind(provider)
            .bind(descriptor)
            .bind(label)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_driftnet_error())?;

        let source: Source = sqlx::query_as(
            "SELECT id, provider, descriptor, label FROM source WHERE provider = ? AND descriptor = ?",
        )
        .bind(provider)
        .bind(descriptor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(source)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Source>> {
        let source: Option<Source> =
            sqlx::query_as("SELECT id, provider, descriptor, label FROM source WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| e.into_driftnet_error())?;
        Ok(source)
    }

    pub async fn find_by_provider_and_descriptor(
        &self,
        provider: &str,
        descriptor: &str,
    ) -> Result<Option<Source>> {
        let source: Option<Source> = sqlx::query_as(
            "SELECT id, provider, descriptor, label FROM source WHERE provider = ? AND descriptor = ?",
        )
        .bind(provider)
        .bind(descriptor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(source)
    }

    pub async fn find_all_for_provider(&self, provider: &str) -> Result<Vec<Source>> {
        let sources: Vec<Source> = sqlx::query_as(
            "SELECT id, provider, descriptor, label FROM source WHERE provider = ? ORDER BY descriptor",
        )
        .bind(provider)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnet_core::DatabaseTarget;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let pool = crate::pool::connect(&DatabaseTarget::Memory).await.unwrap();
        sqlx::query("INSERT INTO provider (name) VALUES ('bluesky')")
            .execute(&pool)
            .await
            .unwrap();
        let repo = SourceRepository::new(pool);
        let first = repo.get_or_create("bluesky", "#rustlang", None).await.unwrap();
        let second = repo.get_or_create("bluesky", "#rustlang", None).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
