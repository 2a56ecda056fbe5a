use chrono::Utc;
use driftnet_core::Result;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::SqlxErrorExt;
use crate::models::Cursor;

/// Cursors are keyed by `(provider, source_id)` — at most one resume
/// position per source. `upsert` always overwrites: the collector is the
/// sole writer and always knows the latest position.
pub struct CursorRepository {
    pool: SqlitePool,
}

impl CursorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, provider: &str, source_id: i64, position: &Value) -> Result<()> {
        let position_text = position.to_string();
        let updated_at = driftnet_core::time::to_rfc3339_z(&Utc::now());
        sqlx::query(
            "INSERT INTO cursor (provider, source_id, position, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(provider, source_id) DO UPDATE SET position = excluded.position, updated_at = excluded.updated_at",
        )
        .bind(provider)
        .bind(source_id)
        .bind(position_text)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(())
    }

    pub async fn get(&self, provider: &str, source_id: i64) -> Result<Option<Cursor>> {
        let row: Option<crate::models::CursorRow> = sqlx::query_as(
            "SELECT id, provider, source_id, position, updated_at FROM cursor WHERE provider = ? AND source_id = ?",
        )
        .bind(provider)
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        row.map(Cursor::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnet_core::DatabaseTarget;

    #[tokio::test]
    async fn upsert_overwrites_existing_position() {
        let pool = crate::pool::connect(&DatabaseTarget::Memory).await.unwrap();
        sqlx::query("INSERT INTO provider (name) VALUES ('bluesky')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO source (id, provider, descriptor) VALUES (1, 'bluesky', '#rustlang')")
            .execute(&pool)
            .await
            .unwrap();
        let repo = CursorRepository::new(pool);
        repo.upsert("bluesky", 1, &serde_json::json!({"cursor": "a"}))
            .await
            .unwrap();
        repo.upsert("bluesky", 1, &serde_json::json!({"cursor": "b"}))
            .await
            .unwrap();
        let cursor = repo.get("bluesky", 1).await.unwrap().unwrap();
        assert_eq!(cursor.position["cursor"], "b");
    }
}
