use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::MessageBody;

/// GatewayError
///
/// Every failure a proxy handler can produce on its own, before or instead of
/// relaying a backend response. Each variant maps to exactly one status code and
/// is rendered as a `{"message": ...}` body so the client slices can surface it.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A create/update payload failed its shape check; the backend was not contacted.
    #[error("{0}")]
    Validation(String),

    /// The request body could not be parsed as JSON for validation.
    #[error("request body must be valid JSON")]
    InvalidBody,

    /// The route exists but does not accept this method.
    #[error("method {method} is not allowed on {path}")]
    MethodNotAllowed { method: String, path: String, allow: String },

    /// The backend could not be reached or its response could not be read.
    #[error("{0}")]
    Backend(String),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) | GatewayError::InvalidBody => StatusCode::BAD_REQUEST,
            GatewayError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(MessageBody::new(self.to_string()));

        match self {
            GatewayError::MethodNotAllowed { allow, .. } => {
                (status, [(header::ALLOW, allow)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

/// BackendError
///
/// Transport-level failure talking to the booking backend. Carries a
/// human-readable description only; the proxy turns it into a 500.
#[derive(Debug, Clone, Error)]
#[error("backend request failed: {0}")]
pub struct BackendError(pub String);

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError(err.to_string())
    }
}

impl From<BackendError> for GatewayError {
    fn from(err: BackendError) -> Self {
        GatewayError::Backend(err.to_string())
    }
}
