//! HTTP transport to the JIRA REST API
//!
//! `Transport` is the seam between the operations and the wire. The reqwest
//! implementation attaches credentials, bounds every call with the configured
//! timeout and normalizes non-2xx responses into `TrackerError::RemoteHttp`.

use crate::config::{AuthScheme, JiraConfig};
use crate::error::{TrackerError, TrackerResult};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// HTTP verbs used by the tracker operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        };
        f.write_str(verb)
    }
}

/// One REST call, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Put,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Sends requests to JIRA and returns the decoded JSON body
///
/// A 2xx response with an empty body (e.g. `204 No Content`) decodes to `null`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> TrackerResult<Value>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<JiraConfig>,
}

impl HttpTransport {
    pub fn new(config: Arc<JiraConfig>) -> TrackerResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("jira-ticket-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    fn timeout_error(&self) -> TrackerError {
        TrackerError::Timeout {
            seconds: self.config.request_timeout_seconds,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> TrackerResult<Value> {
        let url = format!("{}{}", self.config.api_root(), request.path);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
        }
        .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match self.config.auth_scheme {
            AuthScheme::Bearer => builder.bearer_auth(&self.config.api_token),
            AuthScheme::Basic => {
                builder.basic_auth(&self.config.user_email, Some(&self.config.api_token))
            }
        };

        if let Some(cookie) = &self.config.session_cookie {
            builder = builder.header(COOKIE, format!("JSESSIONID={}", cookie));
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let timeout_duration = Duration::from_secs(self.config.request_timeout_seconds);

        // The timeout covers both the round trip and reading the body.
        let (status, text) = timeout(timeout_duration, async {
            let response = builder.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        })
        .await
        .map_err(|_| self.timeout_error())?
        .map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                TrackerError::from(e)
            }
        })?;

        if !status.is_success() {
            warn!("JIRA returned {} for {} {}", status, request.method, request.path);
            return Err(TrackerError::remote(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
                text,
            ));
        }

        debug!("JIRA returned {} ({} bytes)", status, text.len());

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}
