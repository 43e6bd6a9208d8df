use async_trait::async_trait;
use axum::http::{Method, StatusCode, header};
use serde_json::Value;
use thiserror::Error;

/// ApiFailure
///
/// A rejected call to the proxy surface, already reduced to something a user
/// can read. `status` is `None` when no response arrived at all.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub status: Option<StatusCode>,
    pub message: String,
}

/// ApiTransport
///
/// How the slices reach the `/api` proxy handlers. `GatewayClient` does it over
/// HTTP; tests substitute an in-memory implementation.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Calls `path` (e.g. `/api/courts?page=2`) and returns the parsed body on
    /// 2xx. A 2xx body that is not JSON comes back as a JSON string; an empty one
    /// as `null`.
    async fn request(&self, method: Method, path: &str, body: Option<Value>)
    -> Result<Value, ApiFailure>;
}

/// message_from_body
///
/// Best-effort extraction of a readable message from an error response:
/// `message` (string, or array of strings joined), then `error`, then the raw
/// text, then a status-based fallback.
pub fn message_from_body(status: StatusCode, text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        match value.get("message") {
            Some(Value::String(message)) if !message.is_empty() => return message.clone(),
            Some(Value::Array(parts)) => {
                let joined = parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if !joined.is_empty() {
                    return joined;
                }
            }
            _ => {}
        }
        if let Some(Value::String(error)) = value.get("error") {
            if !error.is_empty() {
                return error.clone();
            }
        }
    }

    let trimmed = text.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    format!("Request failed with status {}", status.as_u16())
}

/// GatewayClient
///
/// HTTP transport against a running gateway. Carries the browser's cookie
/// header so the proxy can find the bearer token.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    cookie: Option<String>,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie: None,
        }
    }

    /// Sends `cookie` as the `Cookie` header on every call.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

#[async_trait]
impl ApiTransport for GatewayClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiFailure> {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| ApiFailure {
            status: None,
            message: err.to_string(),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|err| ApiFailure {
            status: Some(status),
            message: err.to_string(),
        })?;

        if !status.is_success() {
            return Err(ApiFailure {
                status: Some(status),
                message: message_from_body(status, &text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
