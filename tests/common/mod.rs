//! Shared helpers for integration tests.

#![allow(clippy::panic, dead_code)]

use std::fmt::Debug;
use std::net::SocketAddr;
use std::time::Duration;

use logstream_hub::api;
use logstream_hub::app_state::AppState;
use logstream_hub::config::HubConfig;
use logstream_hub::hub::{ConnectionHub, HubStats};

/// Unwraps a result in a test, panicking with context on failure.
pub fn ok<T, E: Debug>(result: Result<T, E>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{what}: {err:?}"),
    }
}

/// Hub config with a fast health check so tests converge quickly.
pub fn fast_config() -> HubConfig {
    HubConfig {
        health_check_interval: Duration::from_millis(50),
        ..HubConfig::default()
    }
}

/// Starts a hub and an HTTP server on an ephemeral port.
pub async fn spawn_server(config: HubConfig) -> (SocketAddr, ConnectionHub) {
    let (hub, hub_loop) = ConnectionHub::new(config);
    tokio::spawn(hub_loop.run());

    let app = api::build_router(AppState { hub: hub.clone() });
    let listener = ok(tokio::net::TcpListener::bind("127.0.0.1:0").await, "bind");
    let addr = ok(listener.local_addr(), "local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, hub)
}

/// Polls the hub until `predicate` holds on its stats.
pub async fn wait_for_stats(hub: &ConnectionHub, predicate: impl Fn(HubStats) -> bool) {
    for _ in 0..200 {
        let stats = ok(hub.stats().await, "hub stats");
        if predicate(stats) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("hub stats never reached the expected state");
}
