//! # logstream-hub
//!
//! Real-time log fan-out server. A central hub tracks connected WebSocket
//! clients, broadcasts generated log events to all of them, and manages
//! each client's liveness and flow control (paused/active) independently.
//!
//! ## Architecture
//!
//! ```text
//! Event source (source/)        Clients (WebSocket)
//!     │                              │
//!     │ broadcast                    ├── WS Handler + adapter (ws/)
//!     ▼                              │ register
//! ConnectionHub ── HubLoop (hub/) ◄──┘
//!     │ fan-out, health checks
//!     ▼
//! Connection (hub/): outbound buffer → outbound task → wire
//!                    wire → inbound task → pause/resume/ping/pong
//! ```
//!
//! Delivery is best effort: a client whose buffer is full loses the
//! newest broadcasts instead of pushing back on the hub.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod source;
pub mod ws;
