//! SQLite-backed canonical store: schema migrations, row/domain models,
//! and per-entity repositories over the ingestion engine's data model.

pub mod error;
pub mod models;
pub mod pool;
pub mod repository;

pub use error::{SqlxErrorExt, SqlxResult};
pub use pool::connect;

/// A bundle of every repository, constructed once per pool and handed to
/// the collector/query engine.
#[derive(Clone)]
pub struct Store {
    pub providers: std::sync::Arc<repository::ProviderRepository>,
    pub sources: std::sync::Arc<repository::SourceRepository>,
    pub authors: std::sync::Arc<repository::AuthorRepository>,
    pub posts: std::sync::Arc<repository::PostRepository>,
    pub media: std::sync::Arc<repository::MediaRepository>,
    pub cursors: std::sync::Arc<repository::CursorRepository>,
    pub fetch_jobs: std::sync::Arc<repository::FetchJobRepository>,
}

impl Store {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            providers: std::sync::Arc::new(repository::ProviderRepository::new(pool.clone())),
            sources: std::sync::Arc::new(repository::SourceRepository::new(pool.clone())),
            authors: std::sync::Arc::new(repository::AuthorRepository::new(pool.clone())),
            posts: std::sync::Arc::new(repository::PostRepository::new(pool.clone())),
            media: std::sync::Arc::new(repository::MediaRepository::new(pool.clone())),
            cursors: std::sync::Arc::new(repository::CursorRepository::new(pool.clone())),
            fetch_jobs: std::sync::Arc::new(repository::FetchJobRepository::new(pool)),
        }
    }

    pub async fn connect(target: &driftnet_core::DatabaseTarget) -> driftnet_core::Result<Self> {
        let pool = pool::connect(target).await?;
        Ok(Self::new(pool))
    }
}
