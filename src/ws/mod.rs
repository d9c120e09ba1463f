//! WebSocket transport: upgrade handling and the socket-to-wire adapter.
//!
//! The endpoint at `/ws` turns each upgraded socket into a hub
//! [`crate::hub::Connection`].

pub mod adapter;
pub mod handler;
