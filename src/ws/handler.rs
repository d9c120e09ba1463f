//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;

use super::adapter::split_socket;
use crate::app_state::AppState;
use crate::hub::{Connection, ConnectionHub};

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| attach_socket(socket, hub))
}

/// Wraps an upgraded socket in a [`Connection`], registers it, and starts
/// its tasks. A connection the hub refuses is already closed and is simply
/// dropped.
pub async fn attach_socket(socket: WebSocket, hub: ConnectionHub) {
    let (sink, stream) = split_socket(socket);
    let connection = Connection::new(sink, stream, hub.config());

    match hub.register(std::sync::Arc::clone(&connection)).await {
        Ok(()) => {
            connection.start();
            tracing::info!(connection_id = %connection.id(), "websocket connection started");
        }
        Err(err) => {
            tracing::warn!(connection_id = %connection.id(), %err, "websocket connection rejected");
        }
    }
}
