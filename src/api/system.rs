//! System endpoints: status banner and health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::error::ServerError;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    version: &'static str,
    connections: usize,
    paused: usize,
}

/// `GET /` — Plain-text status banner.
pub async fn status_handler() -> &'static str {
    "Log stream server is running!\nConnect to /ws for WebSocket"
}

/// `GET /health` — Service health with live connection counts.
///
/// # Errors
///
/// Returns [`ServerError::HubUnavailable`] if the hub loop has stopped.
pub async fn health_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let stats = state.hub.stats().await?;
    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            connections: stats.connections,
            paused: stats.paused,
        }),
    ))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(status_handler))
        .route("/health", get(health_handler))
}
