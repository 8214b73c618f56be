//! Wire adapter: client frames in, host frames out.
//!
//! | Frame | Handling | Answer |
//! |-------|----------|--------|
//! | `post` on `ipc-sonar` | [`HostBus::relay_value`] | none |
//! | `post` elsewhere | [`HostBus::dispatch`] | none |
//! | `invoke` | dispatch (or relay) | `response` to the origin |

use super::{BusError, DispatchOutcome, HostBus};
use serde_json::Value;
use shellbus_event::{Channel, ClientFrame, Envelope, ErrorEnvelope, HostFrame, Stage};
use shellbus_types::SurfaceId;
use tracing::{debug, warn};

impl HostBus {
    /// Handles one frame sent by surface `origin`.
    ///
    /// Returns the frame to send back to `origin`, if any. A blocking
    /// `invoke` is always answered, even when the relay refuses it, so the
    /// caller fails fast instead of waiting out its timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Event`] for a frame that does not decode, and for
    /// a malformed echo posted on the relay channel.
    pub fn accept(&self, origin: &SurfaceId, raw: &str) -> Result<Option<HostFrame>, BusError> {
        let frame = ClientFrame::decode(raw).map_err(|err| {
            warn!(surface = %origin, error = %err, "refused malformed frame");
            err
        })?;

        match frame {
            ClientFrame::Post { channel, payload } if channel.is_sonar() => {
                debug!(surface = %origin, "echo received");
                self.relay_value(payload)?;
                Ok(None)
            }
            ClientFrame::Post { channel, payload } => {
                debug!(surface = %origin, channel = %channel, "post received");
                self.dispatch(&channel, &payload);
                Ok(None)
            }
            ClientFrame::Invoke(envelope) => Ok(Some(self.invoke(origin, envelope))),
        }
    }

    fn invoke(&self, origin: &SurfaceId, envelope: Envelope) -> HostFrame {
        let Envelope {
            id,
            channel,
            payload,
        } = envelope;
        debug!(surface = %origin, channel = %channel, id = %id, "invoke received");

        let payload = if channel.is_sonar() {
            match self.relay_value(payload) {
                Ok(outcomes) => select_response(&outcomes),
                Err(err) => ErrorEnvelope::new(
                    Channel::Sonar,
                    Stage::Relay,
                    "MalformedEcho",
                    err.to_string(),
                )
                .to_value(),
            }
        } else {
            select_response(&self.dispatch(&channel, &payload))
        };

        HostFrame::Response { id, payload }
    }
}

/// Picks the value a blocking caller receives.
///
/// The first non-null successful callback result in registration order;
/// failing that, the first failure; failing that, `null`.
#[must_use]
pub fn select_response(outcomes: &[DispatchOutcome]) -> Value {
    outcomes
        .iter()
        .find_map(|o| o.callback.as_ref().ok().filter(|v| !v.is_null()).cloned())
        .or_else(|| {
            outcomes
                .iter()
                .find_map(|o| o.callback.as_ref().err().map(ErrorEnvelope::to_value))
        })
        .unwrap_or(Value::Null)
}
