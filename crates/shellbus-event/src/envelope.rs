//! Envelopes: the serialized form of a message crossing the boundary.
//!
//! No live object crosses between host and surface. A request travels as
//! an [`Envelope`] (with a fresh [`EnvelopeId`]), an echo travels as an
//! [`EchoEnvelope`] encoded to a JSON string and posted on the sonar
//! channel.
//!
//! ```text
//! request : {"id": "<uuid>", "channel": "ipc-ping", "payload": 5}
//! echo    : "{\"channel\":\"ipc-ping\",\"payload\":7}"   (a JSON string)
//! ```

use crate::{Channel, EventError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shellbus_types::EnvelopeId;

/// Client→host request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EnvelopeId,
    pub channel: Channel,
    pub payload: Value,
}

impl Envelope {
    /// Wraps a payload with a freshly generated id.
    #[must_use]
    pub fn new(channel: Channel, payload: Value) -> Self {
        Self {
            id: EnvelopeId::new(),
            channel,
            payload,
        }
    }
}

/// Echo relay message: "dispatch `payload` on `channel` everywhere".
///
/// The optional `id` lets a caller correlate later replies with this
/// echo; the relay itself ignores it.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use shellbus_event::{Channel, EchoEnvelope};
///
/// let echo = EchoEnvelope::new(Channel::parse("x").unwrap(), json!({"a": 1}));
/// let raw = echo.encode().unwrap();
///
/// let decoded = EchoEnvelope::decode(&raw).unwrap();
/// assert_eq!(decoded.channel.to_string(), "x");
/// assert_eq!(decoded.payload, json!({"a": 1}));
///
/// assert!(EchoEnvelope::decode(r#"{"payload": 1}"#).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoEnvelope {
    pub channel: Channel,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EnvelopeId>,
}

impl EchoEnvelope {
    /// Creates an echo without a correlation id.
    #[must_use]
    pub fn new(channel: Channel, payload: Value) -> Self {
        Self {
            channel,
            payload,
            id: None,
        }
    }

    /// Attaches a correlation id.
    #[must_use]
    pub fn with_id(mut self, id: EnvelopeId) -> Self {
        self.id = Some(id);
        self
    }

    /// Encodes to the JSON string posted on the sonar channel.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Codec`] if serialization fails.
    pub fn encode(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(EventError::codec)
    }

    /// Decodes the JSON string received on the sonar channel.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MalformedEcho`] if the text is not JSON or
    /// does not carry both `channel` and `payload`.
    pub fn decode(raw: &str) -> Result<Self, EventError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| EventError::MalformedEcho(format!("not JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Decodes an already-parsed echo object.
    ///
    /// `payload: null` is a valid payload; a missing `payload` key is not.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MalformedEcho`] for anything but an object
    /// with a string `channel` and a `payload` key.
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        let Value::Object(mut fields) = value else {
            return Err(EventError::MalformedEcho("expected a JSON object".into()));
        };

        let channel = match fields.remove("channel") {
            Some(Value::String(name)) => {
                Channel::parse(&name).map_err(|e| EventError::MalformedEcho(e.to_string()))?
            }
            Some(_) => {
                return Err(EventError::MalformedEcho(
                    "`channel` must be a string".into(),
                ))
            }
            None => return Err(EventError::MalformedEcho("missing `channel`".into())),
        };

        let payload = fields
            .remove("payload")
            .ok_or_else(|| EventError::MalformedEcho("missing `payload`".into()))?;

        let id = take_id(&mut fields)?;

        Ok(Self {
            channel,
            payload,
            id,
        })
    }
}

fn take_id(fields: &mut Map<String, Value>) -> Result<Option<EnvelopeId>, EventError> {
    match fields.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| EventError::MalformedEcho(format!("bad `id`: {e}"))),
    }
}
