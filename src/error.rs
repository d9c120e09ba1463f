//! Error types for the transport, hub, and HTTP layers.
//!
//! Transport and hub errors never escalate past the connection or hub
//! boundary: they are logged and the offending connection is pruned.
//! [`ServerError`] is the only error that reaches an HTTP client, mapped
//! to a status code and structured JSON body.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Failure on a single connection's wire. Always terminal for that
/// connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was already closed.
    #[error("connection is closed")]
    Closed,

    /// Writing a frame to the client failed.
    #[error("write failed: {0}")]
    Write(String),

    /// Reading a frame from the client failed.
    #[error("read failed: {0}")]
    Read(String),

    /// An outbound envelope could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// An inbound frame was not a valid envelope.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

/// Failure reported by a [`crate::hub::ConnectionHub`] handle.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The hub did not accept the registration within the bounded wait.
    #[error("hub registration timed out after {0:?}")]
    RegistrationTimeout(Duration),

    /// The coordination loop has exited.
    #[error("hub is stopped")]
    Stopped,
}

/// Structured JSON error response body.
///
/// ```json
/// { "error": { "code": 3001, "message": "hub unavailable" } }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-facing error with status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The hub's coordination loop is not running.
    #[error("hub unavailable: {0}")]
    HubUnavailable(#[from] HubError),
}

impl ServerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::HubUnavailable(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::HubUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
