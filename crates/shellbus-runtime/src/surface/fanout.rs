//! Surface fan-out: push a dispatch to every open surface, best effort.

use super::{SurfaceDirectory, SurfaceTransport, TransportError};
use serde_json::Value;
use shellbus_event::{Channel, ErrorEnvelope, EventError, HostFrame, Stage};
use shellbus_types::SurfaceId;
use std::panic::{self, AssertUnwindSafe};
use tracing::{trace, warn};

/// Per-surface results of one fan-out.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FanoutReport {
    pub delivered: Vec<SurfaceId>,
    pub failed: Vec<(SurfaceId, TransportError)>,
}

impl FanoutReport {
    /// Number of surfaces that were attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Sends `(channel, payload)` to every surface in `directory`.
///
/// The frame is encoded once and the same text goes to every surface. A
/// surface that fails (or, with `catch_panics`, panics) is logged and
/// recorded; the rest still receive the frame.
///
/// # Errors
///
/// Returns [`EventError::Codec`] only if the frame cannot be encoded, in
/// which case nothing was sent.
pub fn fan_out(
    directory: &dyn SurfaceDirectory,
    channel: &Channel,
    payload: &Value,
    catch_panics: bool,
) -> Result<FanoutReport, EventError> {
    let surfaces = directory.open_surfaces();
    let mut report = FanoutReport::default();
    if surfaces.is_empty() {
        return Ok(report);
    }

    let frame = HostFrame::Event {
        channel: channel.clone(),
        payload: payload.clone(),
    }
    .encode()?;

    for surface in surfaces {
        let id = surface.id().clone();
        match send_guarded(surface.as_ref(), channel, &frame, catch_panics) {
            Ok(()) => {
                trace!(surface = %id, channel = %channel, "fan-out delivered");
                report.delivered.push(id);
            }
            Err(err) => {
                let envelope = ErrorEnvelope::new(
                    channel.clone(),
                    Stage::Transport,
                    "TransportError",
                    err.to_string(),
                );
                warn!(
                    surface = %id,
                    channel = %channel,
                    error = %envelope,
                    "fan-out delivery failed"
                );
                report.failed.push((id, err));
            }
        }
    }

    Ok(report)
}

fn send_guarded(
    surface: &dyn SurfaceTransport,
    channel: &Channel,
    frame: &str,
    catch_panics: bool,
) -> Result<(), TransportError> {
    if !catch_panics {
        return surface.send(frame);
    }

    match panic::catch_unwind(AssertUnwindSafe(|| surface.send(frame))) {
        Ok(result) => result,
        Err(panic) => {
            let envelope = ErrorEnvelope::from_panic(channel, Stage::Transport, panic.as_ref());
            Err(TransportError::Panicked {
                surface: surface.id().clone(),
                message: envelope.message,
            })
        }
    }
}
