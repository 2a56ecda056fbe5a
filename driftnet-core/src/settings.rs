//! Process settings: database location and Bluesky credentials.
//!
//! Resolution order (lowest to highest priority): built-in defaults,
//! a `.env` file (never overwrites an already-set environment variable),
//! the process environment, then explicit builder overrides applied by
//! the caller via [`Settings::with_database_url`] and friends.

use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Resolved database target, after validating the `DATABASE_URL` contract
/// in the external interfaces section: either SQLite in-memory, a SQLite
/// file path, or a bare filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Memory,
    File(String),
}

impl DatabaseTarget {
    /// Parses a database URL per the accepted forms: a native filesystem
    /// path, `sqlite://:memory:`, or `sqlite:///<path>`. Any other
    /// `scheme://` is rejected.
    pub fn parse(url: &str) -> Result<Self> {
        if url.is_empty() {
            return Ok(DatabaseTarget::Memory);
        }
        if let Some(rest) = url.strip_prefix("sqlite://") {
            return if rest == ":memory:" {
                Ok(DatabaseTarget::Memory)
            } else if let Some(path) = rest.strip_prefix('/') {
                Ok(DatabaseTarget::File(path.to_string()))
            } else {
                Ok(DatabaseTarget::File(rest.to_string()))
            };
        }
        if url.contains("://") {
            return Err(Error::InvalidArgument(format!(
                "unsupported database URL scheme: {url}"
            )));
        }
        Ok(DatabaseTarget::File(url.to_string()))
    }

    /// Renders the sqlx connection string for this target.
    pub fn connect_string(&self) -> String {
        match self {
            DatabaseTarget::Memory => "sqlite::memory:".to_string(),
            DatabaseTarget::File(path) => format!("sqlite://{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlueskyCredentials {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseTarget,
    pub bluesky_credentials: Option<BlueskyCredentials>,
    pub http_timeout: Duration,
    pub default_page_size: u32,
}

impl Settings {
    /// Loads settings from a `.env` file (if present) and the process
    /// environment, per the resolution order documented on this module.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let database_url = std::env::var("DATABASE_URL").unwrap_or_default();
        let database = DatabaseTarget::parse(&database_url)?;

        let bluesky_credentials = Self::bluesky_credentials_from_env();

        Ok(Self {
            database,
            bluesky_credentials,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            default_page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Settings with no persisted state and no credentials — suitable for
    /// tests that build their own isolated runtime.
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseTarget::Memory,
            bluesky_credentials: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_database_url(mut self, url: &str) -> Result<Self> {
        self.database = DatabaseTarget::parse(url)?;
        Ok(self)
    }

    pub fn with_bluesky_credentials(mut self, identifier: &str, password: &str) -> Self {
        self.bluesky_credentials = Some(BlueskyCredentials {
            identifier: identifier.to_string(),
            password: password.to_string(),
        });
        self
    }

    fn bluesky_credentials_from_env() -> Option<BlueskyCredentials> {
        let identifier = std::env::var("BSKY_IDENTIFIER").ok()?;
        let password = std::env::var("BSKY_APP_PASSWORD")
            .or_else(|_| std::env::var("BSKY_PASSWORD"))
            .ok()?;
        Some(BlueskyCredentials {
            identifier,
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn empty_url_defaults_to_memory() {
        assert_eq!(DatabaseTarget::parse("").unwrap(), DatabaseTarget::Memory);
    }

    #[test]
    fn memory_scheme_is_recognized() {
        assert_eq!(
            DatabaseTarget::parse("sqlite://:memory:").unwrap(),
            DatabaseTarget::Memory
        );
    }

    #[test]
    fn triple_slash_path_is_a_file() {
        assert_eq!(
            DatabaseTarget::parse("sqlite:///var/data/driftnet.db").unwrap(),
            DatabaseTarget::File("var/data/driftnet.db".to_string())
        );
    }

    #[test]
    fn bare_path_is_a_file() {
        assert_eq!(
            DatabaseTarget::parse("./driftnet.db").unwrap(),
            DatabaseTarget::File("./driftnet.db".to_string())
        );
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = DatabaseTarget::parse("postgres://localhost/db").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    #[serial]
    fn password_falls_back_to_legacy_env_var() {
        std::env::remove_var("BSKY_APP_PASSWORD");
        std::env::set_var("BSKY_IDENTIFIER", "alice.bsky.social");
        std::env::set_var("BSKY_PASSWORD", "legacy-secret");
        let creds = Settings::bluesky_credentials_from_env().unwrap();
        assert_eq!(creds.identifier, "alice.bsky.social");
        assert_eq!(creds.password, "legacy-secret");
        std::env::remove_var("BSKY_IDENTIFIER");
        std::env::remove_var("BSKY_PASSWORD");
    }
}
