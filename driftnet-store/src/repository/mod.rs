pub mod author_repo;
pub mod cursor_repo;
pub mod fetch_job_repo;
pub mod media_repo;
pub mod post_repo;
pub mod provider_repo;
pub mod source_repo;

pub use author_repo::AuthorRepository;
pub use cursor_repo::CursorRepository;
pub use fetch_job_repo::FetchJobRepository;
pub use media_repo::MediaRepository;
pub use post_repo::{NewPost, PostInsertOutcome, PostQuery, PostRepository};
pub use provider_repo::ProviderRepository;
pub use source_repo::SourceRepository;
