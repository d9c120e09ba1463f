//! HTTP surface: system endpoints plus the WebSocket upgrade route.

pub mod system;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete router with state applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(system::routes())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
