//! Wire envelope exchanged with clients in both directions.
//!
//! Every frame is a JSON object `{ "type": ..., "data": ... }`. Outbound
//! frames are produced by serializing an [`Envelope`]; inbound frames are
//! decoded leniently so that an unrecognized `type` never fails to parse
//! and instead becomes [`Envelope::Unknown`].

use serde::{Deserialize, Serialize};

use super::LogEvent;
use crate::error::TransportError;

/// Conventional payload carried by `ping` and `pong` envelopes.
pub const HEARTBEAT: &str = "heartbeat";

/// Discriminated wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
#[serde(from = "RawEnvelope")]
pub enum Envelope {
    /// Server → client log event.
    Log(LogEvent),
    /// Client → server: stop sending log events.
    Pause,
    /// Client → server: start sending log events again.
    Resume,
    /// Liveness check, either direction.
    Ping(String),
    /// Liveness ping answer, either direction.
    Pong(String),
    /// Any `type` this layer does not recognize. Carries the original tag.
    Unknown(String),
}

impl Envelope {
    /// Builds the `ping` envelope used for health checks.
    #[must_use]
    pub fn heartbeat_ping() -> Self {
        Self::Ping(HEARTBEAT.to_string())
    }

    /// Builds the `pong` envelope sent in reply to a client ping.
    #[must_use]
    pub fn heartbeat_pong() -> Self {
        Self::Pong(HEARTBEAT.to_string())
    }

    /// Returns the wire discriminant of this envelope.
    #[must_use]
    pub fn msg_type(&self) -> &str {
        match self {
            Self::Log(_) => "log",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
            Self::Unknown(tag) => tag,
        }
    }

    /// Serializes the envelope to its JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TransportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Decode`] if the text is not a JSON object
    /// with a string `type` field. Unknown `type` values are not an error.
    pub fn from_json(text: &str) -> Result<Self, TransportError> {
        serde_json::from_str(text).map_err(TransportError::Decode)
    }
}

/// Untyped shape of an inbound frame, converted into [`Envelope`].
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl From<RawEnvelope> for Envelope {
    fn from(raw: RawEnvelope) -> Self {
        let text = || raw.data.as_str().unwrap_or(HEARTBEAT).to_string();
        match raw.kind.as_str() {
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "ping" => Self::Ping(text()),
            "pong" => Self::Pong(text()),
            "log" => match serde_json::from_value::<LogEvent>(raw.data.clone()) {
                Ok(event) => Self::Log(event),
                Err(_) => Self::Unknown(raw.kind.clone()),
            },
            _ => Self::Unknown(raw.kind.clone()),
        }
    }
}
