//! Log events produced by the event source and fanned out to clients.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a [`LogEvent`], serialized in upper case (`"INFO"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational message.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Every level, in ascending severity.
    pub const ALL: [Self; 3] = [Self::Info, Self::Warn, Self::Error];

    /// Returns the wire representation of the level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Severity of the entry.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
    /// Creation time (RFC 3339 on the wire).
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// Creates a log event stamped with the current time.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn level_serializes_uppercase() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap_or_default();
        assert_eq!(json, "\"WARN\"");
    }

    #[test]
    fn level_display_matches_wire() {
        for level in LogLevel::ALL {
            let json = serde_json::to_string(&level).unwrap_or_default();
            assert_eq!(json, format!("\"{level}\""));
        }
    }

    #[test]
    fn event_serializes_expected_fields() {
        let event = LogEvent::new(LogLevel::Error, "disk full");
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(value.get("level"), Some(&serde_json::json!("ERROR")));
        assert_eq!(value.get("message"), Some(&serde_json::json!("disk full")));
        assert!(value.get("timestamp").is_some_and(serde_json::Value::is_string));
    }

    #[test]
    fn lowercase_level_is_rejected() {
        assert!(serde_json::from_str::<LogLevel>("\"info\"").is_err());
    }
}
