pub mod author;
pub mod cursor;
pub mod fetch_job;
pub mod media;
pub mod post;
pub mod provider;
pub mod source;

pub use author::{Author, AuthorRow};
pub use cursor::{Cursor, CursorRow};
pub use fetch_job::{FetchJob, FetchJobRow, FetchJobStatus};
pub use media::{Media, MediaRow};
pub use post::{Post, PostEntities, PostRow};
pub use provider::{Provider, ProviderRow};
pub use source::Source;
