use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{Method, StatusCode, header},
};

use crate::error::BackendError;

/// BackendRequest
///
/// A fully resolved call to the booking backend: method, path relative to the
/// configured origin (query string included), optional bearer token and body.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: Method,
    pub path_and_query: String,
    pub bearer: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Bytes>,
}

/// BackendResponse
///
/// The backend's status and body, read as text. Whether it is JSON is decided later.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: String,
}

// 1. Backend Contract
/// Backend
///
/// The seam between the proxy handlers and the network. `HttpBackend` talks to
/// the real service; `MockBackend` records calls and returns canned results so
/// the proxy algorithm can be tested without a server.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Sends one request and reads the full response body. Transport failures
    /// (connection refused, broken body) come back as `BackendError`; non-2xx
    /// statuses are successful sends.
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, BackendError>;
}

// 2. The Real Implementation
/// HttpBackend
///
/// reqwest-based client for the configured origin. No timeout and no retries:
/// a hung backend hangs the calling handler, and a failure is reported once.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, BackendError> {
        let url = format!("{}{}", self.base_url, request.path_and_query);
        tracing::debug!(method = %request.method, url = %url, "forwarding to backend");

        let mut builder = self.client.request(request.method, &url);

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body {
            let content_type = request
                .content_type
                .unwrap_or_else(|| "application/json".to_string());
            builder = builder.header(header::CONTENT_TYPE, content_type).body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(BackendResponse { status, body })
    }
}

// 3. The Mock Implementation (For Tests)
/// MockBackend
///
/// Returns one canned response (or a simulated network failure) for every call
/// and keeps a log of the requests it received.
#[derive(Clone)]
pub struct MockBackend {
    outcome: Result<BackendResponse, BackendError>,
    calls: Arc<Mutex<Vec<BackendRequest>>>,
}

impl MockBackend {
    /// Responds to every call with `status` and `body`.
    pub fn responding(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(BackendResponse {
                status,
                body: body.into(),
            }),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fails every call as if the backend were unreachable.
    pub fn unreachable() -> Self {
        Self {
            outcome: Err(BackendError("Mock Backend Error: connection refused".to_string())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request received so far, oldest first.
    pub fn calls(&self) -> Vec<BackendRequest> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, BackendError> {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
        self.outcome.clone()
    }
}

/// BackendState
///
/// The concrete type used to share backend access across the application state.
pub type BackendState = Arc<dyn Backend>;
