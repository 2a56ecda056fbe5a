use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::HttpTransport;

/// Options passed to [`crate::Provider::configure`]. Carries optional auth
/// material, HTTP transport hints, and an injectable transport for tests.
#[derive(Clone, Default)]
pub struct ProviderOptions {
    pub identifier: Option<String>,
    pub password: Option<String>,
    pub base_url_override: Option<String>,
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
    pub transport: Option<Arc<dyn HttpTransport>>,
}

impl std::fmt::Debug for ProviderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderOptions")
            .field("identifier", &self.identifier)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("base_url_override", &self.base_url_override)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBoundsSupport {
    None,
    Inclusive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_cursor: bool,
    pub supports_search_q: bool,
    pub supports_author_filter: bool,
    pub supports_lang_filter: bool,
    pub supports_time_bounds: TimeBoundsSupport,
    pub supports_media: bool,
    pub max_page_limit: u32,
    pub date_granularity: String,
}

impl Capabilities {
    pub fn as_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
pub struct SessionDefaults {
    pub page_limit_max: u32,
}

/// Declares what a configured provider instance can do and how it was
/// authenticated. Returned by `configure`.
#[derive(Debug, Clone)]
pub struct Session {
    pub provider: String,
    pub auth_state: AuthState,
    pub capabilities: Capabilities,
    pub rate_limit_policy: Option<String>,
    pub defaults: SessionDefaults,
    pub warnings: Vec<String>,
}

/// An author filter: by handle, by external id, or both (the caller
/// supplies whichever it has; providers prefer the external id when
/// both are present).
#[derive(Debug, Clone, Default)]
pub struct AuthorFilter {
    pub handle: Option<String>,
    pub external_id: Option<String>,
}

/// Free-form request filters passed to `fetch_since`. Recognized keys are
/// provider-specific; a provider reports the ones it cannot honor via
/// `Batch::ignored_filters` and leaves local enforcement to the collector.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub q: Option<String>,
    pub author: Option<AuthorFilter>,
    pub since_utc: Option<DateTime<Utc>>,
    pub until_utc: Option<DateTime<Utc>>,
    pub lang: Option<String>,
    pub domain: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NormalizedEntities {
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub media: Vec<String>,
}

/// One post as normalized by a provider, ready for the collector to
/// resolve into an `Author` row and insert.
#[derive(Debug, Clone)]
pub struct NormalizedPost {
    pub external_id: String,
    pub author_external_id: String,
    pub author_handle: Option<String>,
    pub author_display_name: Option<String>,
    pub text: String,
    pub lang: Option<String>,
    pub created_at: DateTime<Utc>,
    pub metrics: Value,
    pub entities: NormalizedEntities,
}

/// One page of results from `fetch_since`.
#[derive(Debug, Clone)]
pub struct Batch {
    pub items: Vec<NormalizedPost>,
    pub next_cursor: Option<String>,
    pub reached_until: bool,
    pub ignored_filters: Vec<String>,
    pub stats: Value,
    pub rate_limit: Option<Value>,
    pub warnings: Vec<String>,
}

impl Batch {
    pub fn empty() -> Self {
        Batch {
            items: Vec::new(),
            next_cursor: None,
            reached_until: false,
            ignored_filters: Vec::new(),
            stats: Value::Null,
            rate_limit: None,
            warnings: Vec::new(),
        }
    }
}
