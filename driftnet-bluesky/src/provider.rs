use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use driftnet_core::{Error, Result};
use driftnet_providers::{
    AuthState, Batch, Capabilities, Filters, HttpTransport, Provider, ProviderOptions,
    ReqwestTransport, Session, SessionDefaults, TimeBoundsSupport,
};
use serde_json::Value;

use crate::normalize::normalize_post;

const ANONYMOUS_BASE_URL: &str = "https://public.api.bsky.app";
const AUTHENTICATED_BASE_URL: &str = "https://api.bsky.app";
const LOGIN_URL: &str = "https://bsky.social/xrpc/com.atproto.server.createSession";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

fn capabilities() -> Capabilities {
    Capabilities {
        supports_cursor: true,
        supports_search_q: true,
        supports_author_filter: true,
        supports_lang_filter: false,
        supports_time_bounds: TimeBoundsSupport::None,
        supports_media: false,
        max_page_limit: 100,
        date_granularity: "second".to_string(),
    }
}

fn resolve_credentials(options: &ProviderOptions) -> Option<(String, String)> {
    if let (Some(identifier), Some(password)) = (&options.identifier, &options.password) {
        return Some((identifier.clone(), password.clone()));
    }
    let identifier = std::env::var("BSKY_IDENTIFIER").ok()?;
    let password = std::env::var("BSKY_APP_PASSWORD")
        .or_else(|_| std::env::var("BSKY_PASSWORD"))
        .ok()?;
    Some((identifier, password))
}

/// Implements the provider abstraction against Bluesky's AT-Protocol XRPC
/// endpoints: `searchPosts` (search mode) and `getAuthorFeed` (author
/// mode), with optional app-password login.
pub struct BlueskyProvider {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    auth_header: Option<String>,
    auth_state: AuthState,
}

impl Default for BlueskyProvider {
    fn default() -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::new(DEFAULT_TIMEOUT)),
            base_url: ANONYMOUS_BASE_URL.to_string(),
            auth_header: None,
            auth_state: AuthState::Anonymous,
        }
    }
}

impl BlueskyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn request_headers(&self) -> Vec<(String, String)> {
        match &self.auth_header {
            Some(value) => vec![("Authorization".to_string(), value.clone())],
            None => Vec::new(),
        }
    }

    async fn login(&self, identifier: &str, password: &str) -> std::result::Result<String, String> {
        let body = serde_json::json!({"identifier": identifier, "password": password});
        let response = self
            .transport
            .post_json(LOGIN_URL, &body, &[])
            .await
            .map_err(|e| e.to_string())?;
        if response.status == 401 {
            return Err("401".to_string());
        }
        if response.status != 200 {
            return Err(format!("login returned status {}", response.status));
        }
        response
            .body
            .get("accessJwt")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| "login response missing accessJwt".to_string())
    }

    fn rate_limited_error(retry_after: Option<&str>) -> Error {
        let retry_after_s = retry_after.and_then(|s| s.parse::<u64>().ok());
        Error::RateLimited { retry_after_s }
    }

    fn map_status_error(status: u16, retry_after: Option<&str>) -> Error {
        match status {
            429 => Self::rate_limited_error(retry_after),
            500..=599 => Error::TemporaryNetworkError(format!("server error {status}")),
            _ => Error::InvalidQuery(format!("provider rejected request: status {status}")),
        }
    }
}

#[async_trait]
impl Provider for BlueskyProvider {
    async fn configure(&mut self, options: ProviderOptions) -> Result<Session> {
        if let Some(transport) = options.transport.clone() {
            self.transport = transport;
        }
        if let Some(base_url) = &options.base_url_override {
            self.base_url = base_url.clone();
        }

        let mut warnings = Vec::new();

        if let Some((identifier, password)) = resolve_credentials(&options) {
            match self.login(&identifier, &password).await {
                Ok(token) => {
                    self.auth_header = Some(format!("Bearer {token}"));
                    self.auth_state = AuthState::Authenticated;
                    if options.base_url_override.is_none() {
                        self.base_url = AUTHENTICATED_BASE_URL.to_string();
                    }
                }
                Err(reason) if reason == "401" => {
                    return Err(Error::InvalidQuery(
                        "Invalid credentials; use an app password".to_string(),
                    ));
                }
                Err(reason) => {
                    tracing::warn!(target: "driftnet_bluesky", %reason, "login failed, continuing anonymously");
                    warnings.push(format!("authentication_failed: {reason}"));
                    self.auth_state = AuthState::Anonymous;
                }
            }
        }

        tracing::debug!(target: "driftnet_bluesky", auth_state = ?self.auth_state, "configured");
        Ok(Session {
            provider: "bluesky".to_string(),
            auth_state: self.auth_state,
            capabilities: capabilities(),
            rate_limit_policy: None,
            defaults: SessionDefaults { page_limit_max: 100 },
            warnings,
        })
    }

    async fn fetch_since(
        &self,
        cursor: Option<String>,
        limit: u32,
        filters: &Filters,
    ) -> Result<Batch> {
        let request_limit = limit.clamp(1, 100);
        let limit_str = request_limit.to_string();

        let mut ignored_filters = Vec::new();
        if filters.since_utc.is_some() {
            ignored_filters.push("since_utc".to_string());
        }
        if filters.until_utc.is_some() {
            ignored_filters.push("until_utc".to_string());
        }
        if filters.lang.is_some() {
            ignored_filters.push("lang".to_string());
        }
        if filters.domain.is_some() {
            ignored_filters.push("domain".to_string());
        }
        if filters.tags.is_some() {
            ignored_filters.push("tags".to_string());
        }

        let (body, is_search) = if let Some(q) = &filters.q {
            let mut query: Vec<(&str, &str)> = vec![("q", q.as_str()), ("limit", &limit_str)];
            if let Some(cursor) = &cursor {
                query.push(("cursor", cursor.as_str()));
            }
            let url = format!("{}/xrpc/app.bsky.feed.searchPosts", self.base_url);
            let response = self
                .transport
                .get(&url, &query, &self.request_headers())
                .await?;
            if response.status == 403 && self.auth_state == AuthState::Anonymous {
                return Err(Error::InvalidQuery(
                    "public search is gated; authenticate to search".to_string(),
                ));
            }
            if response.status != 200 {
                let retry_after = response.header("retry-after").map(|s| s.to_string());
                return Err(Self::map_status_error(response.status, retry_after.as_deref()));
            }
            (response.body, true)
        } else if let Some(author) = &filters.author {
            let actor = author
                .external_id
                .clone()
                .or_else(|| author.handle.as_ref().map(|h| h.trim_start_matches('@').to_string()))
                .ok_or_else(|| Error::InvalidQuery("author filter missing handle or id".to_string()))?;
            let mut query: Vec<(&str, &str)> = vec![("actor", actor.as_str()), ("limit", &limit_str)];
            if let Some(cursor) = &cursor {
                query.push(("cursor", cursor.as_str()));
            }
            let url = format!("{}/xrpc/app.bsky.feed.getAuthorFeed", self.base_url);
            let response = self
                .transport
                .get(&url, &query, &self.request_headers())
                .await?;
            if response.status != 200 {
                let retry_after = response.header("retry-after").map(|s| s.to_string());
                return Err(Self::map_status_error(response.status, retry_after.as_deref()));
            }
            (response.body, false)
        } else {
            return Err(Error::InvalidQuery(
                "fetch_since requires filters.q or filters.author".to_string(),
            ));
        };

        let next_cursor = body.get("cursor").and_then(Value::as_str).map(|s| s.to_string());

        let raw_posts: Vec<Value> = if is_search {
            body.get("posts")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        } else {
            body.get("feed")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("post").cloned())
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut items = Vec::with_capacity(raw_posts.len());
        for raw in &raw_posts {
            items.push(normalize_post(raw)?);
        }
        tracing::debug!(target: "driftnet_bluesky", is_search, raw_count = raw_posts.len(), "fetched page");

        Ok(Batch {
            items,
            next_cursor,
            reached_until: false,
            ignored_filters,
            stats: serde_json::json!({"raw_count": raw_posts.len()}),
            rate_limit: None,
            warnings: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnet_providers::{testing::ScriptedResponse, testing::ScriptedTransport, AuthorFilter};

    #[tokio::test]
    async fn author_feed_search_uses_handle_without_at_sign() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedResponse::json(
            "getAuthorFeed",
            200,
            serde_json::json!({"feed": [], "cursor": serde_json::Value::Null}),
        )]));
        let mut provider = BlueskyProvider::default();
        provider
            .configure(ProviderOptions {
                transport: Some(transport.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        let filters = Filters {
            author: Some(AuthorFilter {
                handle: Some("@alice.bsky.social".to_string()),
                external_id: None,
            }),
            ..Default::default()
        };
        provider.fetch_since(None, 10, &filters).await.unwrap();

        let requests = transport.requests();
        assert!(requests[0].url.contains("actor=alice.bsky.social"));
        assert!(!requests[0].url.contains("actor=%40"));
    }

    #[tokio::test]
    async fn anonymous_search_403_raises_invalid_query() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedResponse::json(
            "searchPosts",
            403,
            serde_json::json!({}),
        )]));
        let mut provider = BlueskyProvider::default();
        provider
            .configure(ProviderOptions {
                transport: Some(transport),
                ..Default::default()
            })
            .await
            .unwrap();

        let filters = Filters {
            q: Some("term".to_string()),
            ..Default::default()
        };
        let err = provider.fetch_since(None, 10, &filters).await.unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn login_sends_bearer_token_on_subsequent_search() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedResponse::json(
                "createSession",
                200,
                serde_json::json!({"accessJwt": "TESTTOKEN"}),
            ),
            ScriptedResponse::json(
                "searchPosts",
                200,
                serde_json::json!({"posts": [], "cursor": serde_json::Value::Null}),
            ),
        ]));
        let mut provider = BlueskyProvider::default();
        let session = provider
            .configure(ProviderOptions {
                identifier: Some("alice".to_string()),
                password: Some("app-password".to_string()),
                transport: Some(transport.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(session.auth_state, AuthState::Authenticated);

        let filters = Filters {
            q: Some("term".to_string()),
            ..Default::default()
        };
        provider.fetch_since(None, 10, &filters).await.unwrap();

        let requests = transport.requests();
        let search_request = requests.iter().find(|r| r.url.contains("searchPosts")).unwrap();
        assert!(search_request
            .headers
            .iter()
            .any(|(k, v)| k == "Authorization" && v == "Bearer TESTTOKEN"));
    }

    #[tokio::test]
    async fn invalid_login_credentials_return_invalid_query() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedResponse::json(
            "createSession",
            401,
            serde_json::json!({}),
        )]));
        let mut provider = BlueskyProvider::default();
        let err = provider
            .configure(ProviderOptions {
                identifier: Some("alice".to_string()),
                password: Some("wrong".to_string()),
                transport: Some(transport),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }
}
