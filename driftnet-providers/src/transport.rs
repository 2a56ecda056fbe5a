use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use driftnet_core::{Error, Result};
use serde_json::Value;

/// A single HTTP response as seen by a provider: status code, parsed JSON
/// body, and response headers (lower-cased names).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }
}

/// Abstracts the HTTP calls a provider makes so tests can script responses
/// without a real network. Production code implements this with
/// [`ReqwestTransport`]; tests use [`crate::testing::ScriptedTransport`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(String, String)],
    ) -> Result<HttpResponse>;

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(String, String)],
    ) -> Result<HttpResponse>;
}

/// The production transport: a single reused `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a finite timeout");
        Self { client }
    }

    fn map_response_headers(resp: &reqwest::Response) -> HashMap<String, String> {
        resp.headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect()
    }

    async fn into_http_response(resp: reqwest::Response) -> Result<HttpResponse> {
        let status = resp.status().as_u16();
        let headers = Self::map_response_headers(&resp);
        let body: Value = resp
            .json()
            .await
            .unwrap_or(Value::Null);
        Ok(HttpResponse { status, body, headers })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        let mut request = self.client.get(url).query(query);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| Error::TemporaryNetworkError(e.to_string()))?;
        Self::into_http_response(resp).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        let mut request = self.client.post(url).json(body);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| Error::TemporaryNetworkError(e.to_string()))?;
        Self::into_http_response(resp).await
    }
}
