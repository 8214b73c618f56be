//! Event layer errors.
//!
//! Everything that can go wrong while naming a channel or decoding a
//! message that crossed the process boundary.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`EventError::MalformedEcho`] | `EVENT_MALFORMED_ECHO` | No |
//! | [`EventError::MalformedEnvelope`] | `EVENT_MALFORMED_ENVELOPE` | No |
//! | [`EventError::InvalidChannel`] | `EVENT_INVALID_CHANNEL` | No |
//! | [`EventError::Codec`] | `EVENT_CODEC` | No |
//!
//! None of these improve on retry: the sender has to fix the message.

use serde::{Deserialize, Serialize};
use shellbus_types::ErrorCode;
use thiserror::Error;

/// Event layer error.
///
/// # Example
///
/// ```
/// use shellbus_event::EventError;
/// use shellbus_types::ErrorCode;
///
/// let err = EventError::MalformedEcho("missing `channel`".into());
/// assert_eq!(err.code(), "EVENT_MALFORMED_ECHO");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum EventError {
    /// An echo (sonar) message did not decode to `{channel, payload}`.
    #[error("malformed echo: {0}")]
    MalformedEcho(String),

    /// A client or host frame did not decode.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A channel name was empty or otherwise unusable.
    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    /// JSON encoding failed.
    #[error("codec error: {0}")]
    Codec(String),
}

impl EventError {
    pub(crate) fn codec(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl ErrorCode for EventError {
    fn code(&self) -> &'static str {
        match self {
            Self::MalformedEcho(_) => "EVENT_MALFORMED_ECHO",
            Self::MalformedEnvelope(_) => "EVENT_MALFORMED_ENVELOPE",
            Self::InvalidChannel(_) => "EVENT_INVALID_CHANNEL",
            Self::Codec(_) => "EVENT_CODEC",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellbus_types::assert_error_codes;

    fn all_variants() -> Vec<EventError> {
        vec![
            EventError::MalformedEcho("x".into()),
            EventError::MalformedEnvelope("x".into()),
            EventError::InvalidChannel("x".into()),
            EventError::Codec("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "EVENT_");
    }

    #[test]
    fn nothing_is_recoverable() {
        assert!(all_variants().iter().all(|e| !e.is_recoverable()));
    }

    #[test]
    fn display_includes_detail() {
        let err = EventError::InvalidChannel("channel name cannot be empty".into());
        assert!(err.to_string().contains("cannot be empty"));
    }
}
