//! Frames exchanged between a surface and the host.
//!
//! ```text
//!  surface                                   host
//!    │  {"kind":"post","channel":..,"payload":..}   │   fire-and-forget
//!    │ ───────────────────────────────────────────► │   (sonar → relay)
//!    │  {"kind":"invoke","id":..,"channel":..,..}   │   blocking request
//!    │ ───────────────────────────────────────────► │
//!    │  {"kind":"response","id":..,"payload":..}    │
//!    │ ◄─────────────────────────────────────────── │
//!    │  {"kind":"event","channel":..,"payload":..}  │   fan-out
//!    │ ◄─────────────────────────────────────────── │
//! ```

use crate::{Channel, Envelope, EventError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shellbus_types::EnvelopeId;

/// Surface → host frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Deliver without waiting. On [`Channel::Sonar`] the payload is an
    /// encoded echo envelope.
    Post { channel: Channel, payload: Value },
    /// Blocking request; the host answers with [`HostFrame::Response`].
    Invoke(Envelope),
}

impl ClientFrame {
    /// Encodes to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Codec`] if serialization fails.
    pub fn encode(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(EventError::codec)
    }

    /// Decodes JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MalformedEnvelope`] for unknown kinds or
    /// missing fields.
    pub fn decode(raw: &str) -> Result<Self, EventError> {
        serde_json::from_str(raw).map_err(|e| EventError::MalformedEnvelope(e.to_string()))
    }

    /// The channel this frame targets.
    #[must_use]
    pub fn channel(&self) -> &Channel {
        match self {
            Self::Post { channel, .. } => channel,
            Self::Invoke(envelope) => &envelope.channel,
        }
    }
}

/// Host → surface frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostFrame {
    /// A dispatch pushed to every open surface.
    Event { channel: Channel, payload: Value },
    /// Answer to an [`ClientFrame::Invoke`]. The payload may be an
    /// [`ErrorEnvelope`](crate::ErrorEnvelope).
    Response { id: EnvelopeId, payload: Value },
}

impl HostFrame {
    /// Encodes to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Codec`] if serialization fails.
    pub fn encode(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(EventError::codec)
    }

    /// Decodes JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MalformedEnvelope`] for unknown kinds or
    /// missing fields.
    pub fn decode(raw: &str) -> Result<Self, EventError> {
        serde_json::from_str(raw).map_err(|e| EventError::MalformedEnvelope(e.to_string()))
    }
}
