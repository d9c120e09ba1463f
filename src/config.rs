//! Server configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Missing or unparsable values fall back to the defaults
//! below; only `LISTEN_ADDR` is validated strictly.

use std::net::SocketAddr;
use std::time::Duration;

/// Tunables of the connection hub and its connections.
///
/// [`Default`] yields the reference values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Capacity of each connection's outbound buffer (default 100).
    pub outbound_buffer_capacity: usize,

    /// Period of the hub's health-check sweep (default 2 s).
    pub health_check_interval: Duration,

    /// Bounded wait for a registration to be accepted (default 5 s).
    pub registration_timeout: Duration,

    /// A paused connection silent for longer than this is dropped
    /// (default 10 s).
    pub paused_dead_threshold: Duration,

    /// Upper bound on a single liveness-ping write (default 1 s).
    pub ping_timeout: Duration,

    /// Capacity of each of the hub's input queues (default 64).
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_capacity: 100,
            health_check_interval: Duration::from_secs(2),
            registration_timeout: Duration::from_secs(5),
            paused_dead_threshold: Duration::from_secs(10),
            ping_timeout: Duration::from_secs(1),
            channel_capacity: 64,
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Hub and per-connection tunables.
    pub hub: HubConfig,

    /// Whether the mock event source runs.
    pub event_source_enabled: bool,

    /// Cadence of the mock event source.
    pub event_interval: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;

        let defaults = HubConfig::default();
        let hub = HubConfig {
            outbound_buffer_capacity: parse_env(
                "OUTBOUND_BUFFER_CAPACITY",
                defaults.outbound_buffer_capacity,
            )
            .max(1),
            health_check_interval: parse_env_millis(
                "HEALTH_CHECK_INTERVAL_MS",
                defaults.health_check_interval,
            ),
            registration_timeout: parse_env_millis(
                "REGISTRATION_TIMEOUT_MS",
                defaults.registration_timeout,
            ),
            paused_dead_threshold: parse_env_millis(
                "PAUSED_DEAD_THRESHOLD_MS",
                defaults.paused_dead_threshold,
            ),
            ping_timeout: parse_env_millis("PING_TIMEOUT_MS", defaults.ping_timeout),
            channel_capacity: parse_env("HUB_CHANNEL_CAPACITY", defaults.channel_capacity).max(1),
        };

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            hub,
            event_source_enabled: parse_env_bool("EVENT_SOURCE_ENABLED", true),
            event_interval: parse_env_millis("EVENT_INTERVAL_MS", Duration::from_secs(1)),
            log_format,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a millisecond count. Zero is rejected because every duration
/// here drives a timer.
fn parse_env_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map_or(default, Duration::from_millis)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}
