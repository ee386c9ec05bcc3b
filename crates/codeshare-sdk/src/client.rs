//! HTTP client for the CodeShare server.

use crate::Error;
use codeshare_core::{SessionId, ShareRequest, ShareResponse};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Store status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub sessions: usize,
    pub content_bytes: usize,
    pub sessions_created: u64,
    pub sessions_expired: u64,
    pub ttl_secs: u64,
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for a CodeShare server.
#[derive(Debug, Clone)]
pub struct ShareClient {
    base_url: String,
    client: reqwest::Client,
}

impl ShareClient {
    /// Create a client for the server at `base_url`.
    ///
    /// ```rust,ignore
    /// let client = ShareClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize(base_url.into()),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: normalize(base_url.into()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser link that joins `id`.
    pub fn share_url(&self, id: &SessionId) -> String {
        format!("{}/share?session={}", self.base_url, id)
    }

    /// Create a session holding `content`.
    pub async fn create(&self, content: impl Into<String>) -> Result<SessionId, Error> {
        let resp = self.send(&ShareRequest::create(content)).await?;
        resp.session_id
            .ok_or_else(|| Error::UnexpectedResponse("create returned no sessionId".into()))
    }

    /// Replace the content of a session.
    pub async fn update(&self, id: &SessionId, content: impl Into<String>) -> Result<(), Error> {
        self.send(&ShareRequest::update(id.as_str(), content))
            .await
            .map(|_| ())
    }

    /// Fetch the latest content of a session.
    pub async fn get(&self, id: &SessionId) -> Result<String, Error> {
        let resp = self.send(&ShareRequest::get(id.as_str())).await?;
        resp.content
            .ok_or_else(|| Error::UnexpectedResponse("get returned no content".into()))
    }

    /// Keep a session alive.
    pub async fn heartbeat(&self, id: &SessionId) -> Result<(), Error> {
        self.send(&ShareRequest::heartbeat(id.as_str()))
            .await
            .map(|_| ())
    }

    /// Health check.
    pub async fn health(&self) -> Result<HealthResponse, Error> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response, None).await
    }

    /// Store statistics.
    pub async fn status(&self) -> Result<StatusResponse, Error> {
        let url = format!("{}/api/status", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response, None).await
    }

    async fn send(&self, request: &ShareRequest) -> Result<ShareResponse, Error> {
        let url = format!("{}/api/share", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        let session = request.session_id.clone().unwrap_or_default();
        decode(response, Some(session)).await
    }
}

/// Check the status and parse the body.
///
/// A 404 becomes [`Error::NotFound`] when the request named a session;
/// every other non-2xx becomes [`Error::Server`] carrying the `error` field
/// or, failing that, the raw body.
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    session: Option<String>,
) -> Result<T, Error> {
    let status = response.status();
    let body = response.bytes().await?;

    if let (reqwest::StatusCode::NOT_FOUND, Some(session)) = (status, session) {
        return Err(Error::NotFound(session));
    }

    if !status.is_success() {
        let message = serde_json::from_slice::<ShareResponse>(&body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
        return Err(Error::Server {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

fn normalize(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
