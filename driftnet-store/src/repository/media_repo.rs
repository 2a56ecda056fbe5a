use driftnet_core::Result;
use sqlx::SqlitePool;

/// Media persistence. The schema and columns are fully wired, but no
/// collector path currently populates rows here — providers report media
/// references inline on `Post::entities.media` rather than as normalized
/// rows. Kept as an explicit hook for a future provider that needs it.
pub struct MediaRepository {
    #[allow(dead_code)]
    pool: SqlitePool,
}

impl MediaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, _post_id: i64, _kind: &str, _url: &str) -> Result<()> {
        Ok(())
    }
}
