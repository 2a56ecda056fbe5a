use driftnet_core::Result;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::SqlxErrorExt;
use crate::models::Author;

/// Authors are deduplicated by `(provider, external_id)` under a
/// first-write-wins rule: once an author row exists, later observations of
/// the same external id never overwrite its handle, display name, or
/// metadata. This keeps an author's identity stable even if a provider's
/// feed briefly serves stale profile data.
pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the author if absent, otherwise leaves the existing row
    /// untouched. Returns the row's id either way.
    pub async fn upsert_first_write_wins(
        &self,
        provider: &str,
        external_id: &str,
        handle: Option<&str>,
        display_name: Option<&str>,
        metadata: &Value,
    ) -> Result<i64> {
        let metadata_text = metadata.to_string();
        sqlx::query(
            "INSERT OR IGNORE INTO author (provider, external_id, handle, display_name, metadata)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(provider)
        .bind(external_id)
        .bind(handle)
        .bind(display_name)
        .bind(metadata_text)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;

        let (id,): (i64,) = sqlx::query_as(
            "SELECT id FROM author WHERE provider = ? AND external_id = ?",
        )
        .bind(provider)
        .bind(external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(id)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Author>> {
        let row: Option<crate::models::AuthorRow> = sqlx::query_as(
            "SELECT id, provider, external_id, handle, display_name, metadata FROM author WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_driftnet_error())?;
        Ok(row.map(Author::from))
    }

    /// Resolves the author id for a `@handle` reference, optionally scoped
    /// to one provider.
    pub async fn find_id_by_handle(&self, provider: Option<&str>, handle: &str) -> Result<Option<i64>> {
        let row: Option<(i64,)> = match provider {
            Some(provider) => {
                sqlx::query_as("SELECT id FROM author WHERE provider = ? AND handle = ?")
                    .bind(provider)
                    .bind(handle)
                    .fetch_optional(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as("SELECT id FROM author WHERE handle = ?")
                    .bind(handle)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| e.into_driftnet_error())?;
        Ok(row.map(|(id,)| id))
    }

    /// Resolves the author id for an `external_id` reference, optionally
    /// scoped to one provider.
    pub async fn find_id_by_external_id(
        &self,
        provider: Option<&str>,
        external_id: &str,
    ) -> Result<Option<i64>> {
        let row: Option<(i64,)> = match provider {
            Some(provider) => {
                sqlx::query_as("SELECT id FROM author WHERE provider = ? AND external_id = ?")
                    .bind(provider)
                    .bind(external_id)
                    .fetch_optional(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as("SELECT id FROM author WHERE external_id = ?")
                    .bind(external_id)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| e.into_driftnet_error())?;
        Ok(row.map(|(id,)| id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnet_core::DatabaseTarget;

    #[tokio::test]
    async fn repeated_upsert_keeps_first_profile() {
        let pool = crate::pool::connect(&DatabaseTarget::Memory).await.unwrap();
        sqlx::query("INSERT INTO provider (name) VALUES ('bluesky')")
            .execute(&pool)
            .await
            .unwrap();
        let repo = AuthorRepository::new(pool);
        let first_id = repo
            .upsert_first_write_wins("bluesky", "did:plc:abc", Some("alice.test"), Some("Alice"), &serde_json::json!({}))
            .await
            .unwrap();
        let second_id = repo
            .upsert_first_write_wins("bluesky", "did:plc:abc", Some("alice2.test"), Some("Alice Renamed"), &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(first_id, second_id);
        let author = repo.find_by_id(first_id).await.unwrap().unwrap();
        assert_eq!(author.handle.as_deref(), Some("alice.test"));
        assert_eq!(author.display_name.as_deref(), Some("Alice"));
    }
}
