//! Domain layer: wire envelope, log events, and connection identity.
//!
//! These are plain data types shared by the hub, the WebSocket adapter,
//! and the event source.

pub mod connection_id;
pub mod envelope;
pub mod log_event;

pub use connection_id::ConnectionId;
pub use envelope::Envelope;
pub use log_event::{LogEvent, LogLevel};
