//! Fan-out core: per-client connections and the hub that coordinates them.
//!
//! Data flow: event source → [`ConnectionHub::broadcast`] → hub loop →
//! per-connection outbound buffer → outbound task → wire. Client control
//! messages (pause, resume, ping, pong) go wire → inbound task →
//! connection state, without involving the hub.

pub mod connection;
pub mod connection_hub;

#[cfg(test)]
pub(crate) mod test_wire;

pub use connection::{Connection, EnqueueOutcome, WireSink, WireStream};
pub use connection_hub::{ConnectionHub, HubLoop, HubStats};
