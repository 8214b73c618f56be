//! Listener failures and their serializable projection.
//!
//! A listener signals failure by returning a [`ListenerError`]. The
//! dispatcher turns that (or a caught panic) into an [`ErrorEnvelope`]:
//! plain data that can be logged, stored as the listener's result and sent
//! to the other side of the boundary.

use crate::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use thiserror::Error;

const ENVELOPE_CLASS: &str = "ErrorEnvelope";

/// Error returned by a listener callback.
///
/// `name` plays the role of an exception class (`"TypeError"`,
/// `"DecodeError"`), `message` the human-readable detail.
///
/// ```
/// use shellbus_event::ListenerError;
///
/// let err = ListenerError::new("Unavailable", "login server unreachable");
/// assert_eq!(err.to_string(), "Unavailable: login server unreachable");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{name}: {message}")]
pub struct ListenerError {
    pub name: String,
    pub message: String,
}

impl ListenerError {
    /// Creates a named error.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an error with the generic name `Error`.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    /// A payload that did not match the listener's expected type.
    #[must_use]
    pub fn decode(err: &serde_json::Error) -> Self {
        Self::new("DecodeError", err.to_string())
    }

    /// A result that could not be encoded back to JSON.
    #[must_use]
    pub fn encode(err: &serde_json::Error) -> Self {
        Self::new("EncodeError", err.to_string())
    }
}

/// Which part of the pipeline produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// A subscription's message callback.
    Callback,
    /// A subscription's reply callback.
    Reply,
    /// The echo relay refused a message.
    Relay,
    /// Delivery to a surface failed.
    Transport,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Callback => "callback",
            Self::Reply => "reply",
            Self::Relay => "relay",
            Self::Transport => "transport",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum EnvelopeClass {
    ErrorEnvelope,
}

/// Serializable record of a failure.
///
/// On the wire it carries `"class": "ErrorEnvelope"`, which is how a
/// receiver tells an error apart from a legitimate payload.
///
/// # Example
///
/// ```
/// use shellbus_event::{Channel, ErrorEnvelope, ListenerError, Stage};
///
/// let channel = Channel::parse("boom").unwrap();
/// let err = ListenerError::msg("x");
/// let envelope = ErrorEnvelope::from_listener(&channel, Stage::Callback, &err);
///
/// let wire = envelope.to_value();
/// assert_eq!(wire["class"], "ErrorEnvelope");
/// assert_eq!(ErrorEnvelope::detect(&wire), Some(envelope));
/// assert_eq!(ErrorEnvelope::detect(&serde_json::json!(42)), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{name} on {channel} ({stage}): {message}")]
pub struct ErrorEnvelope {
    class: EnvelopeClass,
    pub name: String,
    pub message: String,
    pub channel: Channel,
    pub stage: Stage,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    /// Creates an envelope stamped with the current time.
    #[must_use]
    pub fn new(
        channel: Channel,
        stage: Stage,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            class: EnvelopeClass::ErrorEnvelope,
            name: name.into(),
            message: message.into(),
            channel,
            stage,
            timestamp: Utc::now(),
        }
    }

    /// Projects a listener error.
    #[must_use]
    pub fn from_listener(channel: &Channel, stage: Stage, err: &ListenerError) -> Self {
        Self::new(channel.clone(), stage, err.name.clone(), err.message.clone())
    }

    /// Projects a caught panic payload.
    #[must_use]
    pub fn from_panic(channel: &Channel, stage: Stage, panic: &(dyn Any + Send)) -> Self {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "listener panicked".to_string());
        Self::new(channel.clone(), stage, "Panic", message)
    }

    /// Serializes to a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "class": ENVELOPE_CLASS,
            "name": self.name,
            "message": self.message,
            "channel": self.channel.wire_name(),
            "stage": self.stage,
            "timestamp": self.timestamp,
        })
    }

    /// Recognizes an error envelope in a wire value.
    ///
    /// Returns `None` for anything without the `class` marker, so ordinary
    /// payloads are never mistaken for failures.
    #[must_use]
    pub fn detect(value: &Value) -> Option<Self> {
        if value.get("class").and_then(Value::as_str) != Some(ENVELOPE_CLASS) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}
