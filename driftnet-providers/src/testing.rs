//! A scripted [`HttpTransport`] for exercising providers without a real
//! network. Each call to `get`/`post_json` consumes the next scripted
//! response matching its path; mismatches panic loudly (a test bug, not a
//! provider bug).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use driftnet_core::Result;
use serde_json::Value;

use crate::transport::{HttpResponse, HttpTransport};

#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub path_contains: String,
    pub status: u16,
    pub body: Value,
    pub headers: Vec<(String, String)>,
}

impl ScriptedResponse {
    pub fn json(path_contains: &str, status: u16, body: Value) -> Self {
        Self {
            path_contains: path_contains.to_string(),
            status,
            body,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Records every request it receives so tests can assert on headers
/// (e.g. that a bearer token was actually sent).
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, url: &str, headers: &[(String, String)]) {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.to_vec(),
        });
    }

    fn next_response(&self, url: &str) -> HttpResponse {
        let mut guard = self.responses.lock().unwrap();
        let position = guard
            .iter()
            .position(|r| url.contains(&r.path_contains))
            .unwrap_or_else(|| panic!("no scripted response matches request url {url}"));
        let scripted = guard.remove(position).unwrap();
        HttpResponse {
            status: scripted.status,
            body: scripted.body,
            headers: scripted
                .headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        let full_url = if query.is_empty() {
            url.to_string()
        } else {
            let qs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{url}?{}", qs.join("&"))
        };
        self.record(&full_url, headers);
        Ok(self.next_response(&full_url))
    }

    async fn post_json(
        &self,
        url: &str,
        _body: &Value,
        headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        self.record(url, headers);
        Ok(self.next_response(url))
    }
}
