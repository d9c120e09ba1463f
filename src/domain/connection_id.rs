//! Type-safe connection identifier.
//!
//! Connections are identified by object identity inside the hub; the
//! [`ConnectionId`] exists so that every log line and membership entry can
//! name the client it concerns.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for one client connection.
///
/// Wraps a UUID v4 assigned when the connection is constructed. Used as the
/// key of the hub's membership map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
