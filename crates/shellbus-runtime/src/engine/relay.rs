//! Echo relay ("sonar").
//!
//! A surface cannot address listeners it does not know about. Instead it
//! posts an [`EchoEnvelope`] on [`Channel::Sonar`]; the relay decodes it and
//! dispatches on the host exactly as if the host had sent it, which also
//! fans it out to every other surface.
//!
//! ```text
//! surface A ──post(ipc-sonar, "{\"channel\":\"x\",\"payload\":7}")──► relay
//!                                                                   │ decode
//!                                                                   ▼
//!                                             HostBus::dispatch(x, 7)
//!                                                   │            │
//!                                           host listeners   surfaces A, B, C
//! ```

use super::{BusError, DispatchOutcome, HostBus};
use serde_json::Value;
use shellbus_event::{EchoEnvelope, EventError};
use tracing::{debug, warn};

impl HostBus {
    /// Relays an encoded echo envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Event`] with [`EventError::MalformedEcho`] when
    /// the text does not decode to `{channel, payload}` or targets the relay
    /// channel itself. Nothing is dispatched in that case.
    pub fn relay(&self, raw: &str) -> Result<Vec<DispatchOutcome>, BusError> {
        let echo = EchoEnvelope::decode(raw).map_err(refuse)?;
        self.relay_echo(echo)
    }

    /// Relays the payload of a post on the sonar channel.
    ///
    /// Accepts the encoded string form and, for lenient clients, the echo
    /// object itself.
    ///
    /// # Errors
    ///
    /// Same as [`HostBus::relay`]; any other JSON type is malformed.
    pub fn relay_value(&self, payload: Value) -> Result<Vec<DispatchOutcome>, BusError> {
        let echo = match payload {
            Value::String(raw) => EchoEnvelope::decode(&raw),
            object @ Value::Object(_) => EchoEnvelope::from_value(object),
            _ => Err(EventError::MalformedEcho(
                "expected an encoded echo envelope".into(),
            )),
        }
        .map_err(refuse)?;

        self.relay_echo(echo)
    }

    fn relay_echo(&self, echo: EchoEnvelope) -> Result<Vec<DispatchOutcome>, BusError> {
        if echo.channel.is_sonar() {
            let err = EventError::MalformedEcho("echo cannot target the relay channel".into());
            return Err(refuse(err).into());
        }

        debug!(channel = %echo.channel, id = ?echo.id, "relaying echo");
        Ok(self.dispatch(&echo.channel, &echo.payload))
    }
}

fn refuse(err: EventError) -> EventError {
    warn!(error = %err, "refused malformed echo");
    err
}
