use chrono::Utc;
use driftnet_core::Result;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::SqlxErrorExt;
use crate::models::{FetchJob, FetchJobStatus};

/// Tracks the lifecycle of a single `collect()` invocation: a `running`
/// row created at the start, finalized to `succeeded` or `failed` once the
/// paging loop exits.
pub struct FetchJobRepository {
    pool: SqlitePool,
}

impl FetchJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn start(&self, provider: &str, source_id: i64) -> Result<i64> {
        let started_at = driftnet_core::time::to_rfc3339_z(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO fetch_job (provider, source_id, started_at, status, stats) VALUES (?, ?, ?, 'running', '{}')",
        )
        .bind(provider)
        .bind(source_id)
        .bind(started_at)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(result.last_insert_rowid())
    }

    pub async fn finish(&self, id: i64, status: FetchJobStatus, stats: &Value) -> Result<()> {
        let finished_at = driftnet_core::time::to_rfc3339_z(&Utc::now());
        let stats_text = stats.to_string();
        sqlx::query(
            "UPDATE fetch_job SET finished_at = ?, status = ?, stats = ? WHERE id = ?",
        )
        .bind(finished_at)
        .bind(status.as_str())
        .bind(stats_text)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<FetchJob>> {
        let row: Option<crate::models::FetchJobRow> = sqlx::query_as(
            "SELECT id, provider, source_id, started_at, finished_at, status, stats FROM fetch_job WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        row.map(FetchJob::try_from).transpose()
    }

    pub async fn latest_for_source(&self, provider: &str, source_id: i64) -> Result<Option<FetchJob>> {
        let row: Option<crate::models::FetchJobRow> = sqlx::query_as(
            "SELECT id, provider, source_id, started_at, finished_at, status, stats FROM fetch_job
             WHERE provider = ? AND source_id = ? ORDER BY started_at DESC LIMIT 1",
        )
        .bind(provider)
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        row.map(FetchJob::try_from).transpose()
    }

    /// Returns up to `limit` most-recent jobs for `(provider, source_id)`,
    /// newest first. Unlike [`latest_for_source`](Self::latest_for_source),
    /// this is not capped to a single row per source.
    pub async fn for_source(&self, provider: &str, source_id: i64, limit: u64) -> Result<Vec<FetchJob>> {
        let rows: Vec<crate::models::FetchJobRow> = sqlx::query_as(
            "SELECT id, provider, source_id, started_at, finished_at, status, stats FROM fetch_job
             WHERE provider = ? AND source_id = ? ORDER BY started_at DESC LIMIT ?",
        )
        .bind(provider)
        .bind(source_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        rows.into_iter().map(FetchJob::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnet_core::DatabaseTarget;

    #[tokio::test]
    async fn start_then_finish_updates_status() {
        let pool = crate::pool::connect(&DatabaseTarget::Memory).await.unwrap();
        sqlx::query("INSERT INTO provider (name) VALUES ('bluesky')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO source (id, provider, descriptor) VALUES (1, 'bluesky', '#rustlang')")
            .execute(&pool)
            .await
            .unwrap();
        let repo = FetchJobRepository::new(pool);
        let id = repo.start("bluesky", 1).await.unwrap();
        repo.finish(id, FetchJobStatus::Succeeded, &serde_json::json!({"fetched": 3}))
            .await
            .unwrap();
        let job = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(job.status, FetchJobStatus::Succeeded);
        assert!(job.finished_at.is_some());
        assert_eq!(job.stats["fetched"], 3);
    }

    #[tokio::test]
    async fn for_source_returns_multiple_rows() {
        let pool = crate::pool::connect(&DatabaseTarget::Memory).await.unwrap();
        sqlx::query("INSERT INTO provider (name) VALUES ('bluesky')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO source (id, provider, descriptor) VALUES (1, 'bluesky', '#rustlang')")
            .execute(&pool)
            .await
            .unwrap();
        let repo = FetchJobRepository::new(pool);
        let first = repo.start("bluesky", 1).await.unwrap();
        repo.finish(first, FetchJobStatus::Succeeded, &serde_json::json!({}))
            .await
            .unwrap();
        let second = repo.start("bluesky", 1).await.unwrap();
        repo.finish(second, FetchJobStatus::Succeeded, &serde_json::json!({}))
            .await
            .unwrap();

        let jobs = repo.for_source("bluesky", 1, 5).await.unwrap();
        assert_eq!(jobs.len(), 2);
    }
}
