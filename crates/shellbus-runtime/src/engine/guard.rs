//! Failure containment around a single listener call.

use super::Handler;
use serde_json::Value;
use shellbus_event::{Channel, ErrorEnvelope, Stage};
use std::panic::{self, AssertUnwindSafe};

/// Runs one listener stage and projects any failure to an [`ErrorEnvelope`].
///
/// With `catch_panics` set, a panic is contained here as well and becomes
/// an envelope named `Panic`. The registry lock is never held while a
/// listener runs, so an unwinding listener cannot poison bus state.
pub(crate) fn invoke(
    handler: &Handler,
    payload: &Value,
    channel: &Channel,
    stage: Stage,
    catch_panics: bool,
) -> Result<Value, ErrorEnvelope> {
    let outcome = if catch_panics {
        match panic::catch_unwind(AssertUnwindSafe(|| handler(payload))) {
            Ok(outcome) => outcome,
            Err(panic) => return Err(ErrorEnvelope::from_panic(channel, stage, panic.as_ref())),
        }
    } else {
        handler(payload)
    };

    outcome.map_err(|err| ErrorEnvelope::from_listener(channel, stage, &err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shellbus_event::ListenerError;
    use std::sync::Arc;

    fn boom() -> Channel {
        Channel::parse("boom").unwrap()
    }

    fn listener<F>(f: F) -> Handler
    where
        F: Fn(&Value) -> Result<Value, ListenerError> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    #[test]
    fn success_passes_through() {
        let handler = listener(|p| Ok(json!({"echo": p})));
        let result = invoke(&handler, &json!(1), &boom(), Stage::Callback, true);
        assert_eq!(result.unwrap(), json!({"echo": 1}));
    }

    #[test]
    fn listener_error_becomes_envelope() {
        let handler = listener(|_| Err(ListenerError::msg("x")));
        let envelope = invoke(&handler, &Value::Null, &boom(), Stage::Reply, true).unwrap_err();
        assert_eq!(envelope.name, "Error");
        assert_eq!(envelope.message, "x");
        assert_eq!(envelope.stage, Stage::Reply);
    }

    #[test]
    fn panic_is_contained() {
        let handler = listener(|_| panic!("listener blew up"));
        let envelope = invoke(&handler, &Value::Null, &boom(), Stage::Callback, true).unwrap_err();
        assert_eq!(envelope.name, "Panic");
        assert_eq!(envelope.message, "listener blew up");
    }

    #[test]
    #[should_panic(expected = "listener blew up")]
    fn panic_propagates_when_not_caught() {
        let handler = listener(|_| panic!("listener blew up"));
        let _ = invoke(&handler, &Value::Null, &boom(), Stage::Callback, false);
    }
}
