//! Error types for the proxy.
//!
//! `AuthError` is produced by the token cache, `ProxyError` is what request
//! handlers return; it renders itself as the `{ok: false, error: ...}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

/// Failure to obtain an access token from the OAuth endpoint.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The OAuth endpoint answered with a non-success status.
    #[error("authorization failed: {status} {body}")]
    Rejected { status: u16, body: String },

    /// The OAuth endpoint answered 2xx but without a usable access token.
    #[error("authorization failed: malformed token response: {0}")]
    MalformedResponse(String),

    /// The OAuth endpoint could not be reached.
    #[error("authorization failed: {0}")]
    Transport(String),
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Request rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// No valid token could be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The carrier API answered an authenticated call with a non-success status.
    #[error("upstream returned {status}")]
    Upstream { status: StatusCode, body: Value },

    /// Network or decoding failure talking to the carrier API.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Auth(_) | ProxyError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ProxyError::Upstream { body, .. } => body,
            other => Value::String(other.to_string()),
        };
        (status, Json(json!({ "ok": false, "error": error }))).into_response()
    }
}
