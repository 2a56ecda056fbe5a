pub mod error;
pub mod keyset;
pub mod settings;
pub mod telemetry;
pub mod time;

pub use error::{Error, Result};
pub use settings::{BlueskyCredentials, DatabaseTarget, Settings};
pub use telemetry::init_tracing;
