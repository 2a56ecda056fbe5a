use chrono::{DateTime, Utc};
use driftnet_core::Result;
use driftnet_data::{Dialect, QueryBuilder};
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::error::SqlxErrorExt;
use crate::models::{Post, PostEntities, PostRow};

/// A post observed by a provider, staged for insertion.
pub struct NewPost {
    pub provider: String,
    pub external_id: String,
    pub author_id: i64,
    pub text: String,
    pub lang: Option<String>,
    pub created_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub metrics: Value,
    pub entities: PostEntities,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostInsertOutcome {
    pub inserted: u64,
    pub duplicates: u64,
}

/// A keyset page request over the `post` table.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub provider: Option<String>,
    pub author_ids: Option<Vec<i64>>,
    pub text_like: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub after: Option<(DateTime<Utc>, i64)>,
    pub limit: u64,
}

pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a batch of posts, ignoring rows that collide on
    /// `(provider, external_id)`. The collision count feeds the
    /// collector's per-page duplicate-conflict stats.
    pub async fn insert_batch(&self, posts: &[NewPost]) -> Result<PostInsertOutcome> {
        let mut outcome = PostInsertOutcome::default();
        for post in posts {
            let created_at = driftnet_core::time::to_rfc3339_z(&post.created_at);
            let collected_at = driftnet_core::time::to_rfc3339_z(&post.collected_at);
            let metrics = post.metrics.to_string();
            let entities = serde_json::to_string(&post.entities).unwrap_or_else(|_| "{}".to_string());

            let result = sqlx::query(
                "INSERT OR IGNORE INTO post
                 (provider, external_id, author_id, text, lang, created_at, collected_at, metrics, entities)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&post.provider)
            .bind(&post.external_id)
            .bind(post.author_id)
            .bind(&post.text)
            .bind(&post.lang)
            .bind(created_at)
            .bind(collected_at)
            .bind(metrics)
            .bind(entities)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_driftnet_error())?;

            if result.rows_affected() == 1 {
                outcome.inserted += 1;
            } else {
                outcome.duplicates += 1;
            }
        }
        Ok(outcome)
    }

    pub async fn find_by_provider_and_external_id(
        &self,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Post>> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, provider, external_id, author_id, text, lang, created_at, collected_at, metrics, entities
             FROM post WHERE provider = ? AND external_id = ?",
        )
        .bind(provider)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        row.map(Post::try_from).transpose()
    }

    /// Fetches one keyset page, ordered newest-first by `(created_at, id)`.
    /// The caller requests `limit` rows; the seek predicate (`after`)
    /// excludes everything at or after the cursor's position.
    pub async fn query_page(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let mut builder = QueryBuilder::new_with_dialect("post", Dialect::Sqlite);

        if let Some(provider) = &query.provider {
            builder = builder.where_eq("provider", provider.clone());
        }
        if let Some(text_like) = &query.text_like {
            builder = builder.where_like("text", format!("%{text_like}%"));
        }
        if let Some(since) = query.since {
            builder = builder.where_gte("created_at", driftnet_core::time::to_rfc3339_z(&since));
        }
        if let Some(until) = query.until {
            builder = builder.where_lte("created_at", driftnet_core::time::to_rfc3339_z(&until));
        }
        if let Some((after_ts, after_id)) = query.after {
            builder = builder.where_raw(
                "created_at < ? OR (created_at = ? AND id < ?)",
                vec![
                    driftnet_core::time::to_rfc3339_z(&after_ts),
                    driftnet_core::time::to_rfc3339_z(&after_ts),
                    after_id.to_string(),
                ],
            );
        }
        if let Some(author_ids) = &query.author_ids {
            if author_ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders: Vec<String> = author_ids.iter().map(|_| "?".to_string()).collect();
            let fragment = format!("author_id IN ({})", placeholders.join(", "));
            let params = author_ids.iter().map(|id| id.to_string()).collect();
            builder = builder.where_raw(fragment, params);
        }

        builder = builder
            .order_by("created_at", false)
            .order_by("id", false)
            .limit(query.limit);

        let (sql, params) = builder.build_select(
            "id, provider, external_id, author_id, text, lang, created_at, collected_at, metrics, entities",
        );

        let mut sqlx_query = sqlx::query(&sql);
        for param in &params {
            sqlx_query = sqlx_query.bind(param);
        }

        let rows = sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_driftnet_error())?;

        rows.into_iter()
            .map(|row| {
                let post_row = PostRow {
                    id: row.try_get("id").map_err(|e| e.into_driftnet_error())?,
                    provider: row.try_get("provider").map_err(|e| e.into_driftnet_error())?,
                    external_id: row.try_get("external_id").map_err(|e| e.into_driftnet_error())?,
                    author_id: row.try_get("author_id").map_err(|e| e.into_driftnet_error())?,
                    text: row.try_get("text").map_err(|e| e.into_driftnet_error())?,
                    lang: row.try_get("lang").map_err(|e| e.into_driftnet_error())?,
                    created_at: row.try_get("created_at").map_err(|e| e.into_driftnet_error())?,
                    collected_at: row.try_get("collected_at").map_err(|e| e.into_driftnet_error())?,
                    metrics: row.try_get("metrics").map_err(|e| e.into_driftnet_error())?,
                    entities: row.try_get("entities").map_err(|e| e.into_driftnet_error())?,
                };
                Post::try_from(post_row)
            })
            .collect()
    }

    /// Returns the subset of `external_ids` already persisted for
    /// `provider`, used by the collector to classify conflicts before
    /// queuing an insert batch.
    pub async fn existing_external_ids(
        &self,
        provider: &str,
        external_ids: &[String],
    ) -> Result<std::collections::HashSet<String>> {
        if external_ids.is_empty() {
            return Ok(std::collections::HashSet::new());
        }
        let placeholders: Vec<&str> = external_ids.iter().map(|_| "?").collect();
        let sql = format!(
            "SELECT external_id FROM post WHERE provider = ? AND external_id IN ({})",
            placeholders.join(", ")
        );
        let mut sqlx_query = sqlx::query(&sql).bind(provider);
        for id in external_ids {
            sqlx_query = sqlx_query.bind(id);
        }
        let rows = sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_driftnet_error())?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>("external_id").map_err(|e| e.into_driftnet_error()))
            .collect()
    }

    pub async fn count_for_provider(&self, provider: &str) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM post WHERE provider = ?")
            .bind(provider)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.into_driftnet_error())?;
        Ok(count as u64)
    }
}
