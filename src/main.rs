//! logstream-hub server entry point.
//!
//! Starts the hub loop, the mock event source, and the Axum HTTP server
//! with the status, health, and WebSocket endpoints.

use tracing_subscriber::EnvFilter;

use logstream_hub::api;
use logstream_hub::app_state::AppState;
use logstream_hub::config::{LogFormat, ServerConfig};
use logstream_hub::hub::ConnectionHub;
use logstream_hub::source::spawn_event_source;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting logstream-hub");

    // Start the hub
    let (hub, hub_loop) = ConnectionHub::new(config.hub.clone());
    let hub_task = tokio::spawn(hub_loop.run());

    // Start the event source
    if config.event_source_enabled {
        spawn_event_source(hub.clone(), config.event_interval);
    }

    let app = api::build_router(AppState { hub: hub.clone() });

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening, websocket endpoint at /ws");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    hub.shutdown().await;
    hub_task.await?;
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
