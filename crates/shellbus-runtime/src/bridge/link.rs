//! Outbound side of a client bridge.

use crate::engine::BusError;
use shellbus_event::ClientFrame;
use shellbus_types::SurfaceId;
use tokio::sync::mpsc;

/// Carries client frames to the host.
pub trait HostLink: Send + Sync {
    /// Sends one frame without waiting for the host to act on it.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::LinkClosed`] once the host side is gone, or
    /// [`BusError::Event`] if the frame cannot be encoded.
    fn send(&self, frame: &ClientFrame) -> Result<(), BusError>;
}

/// [`HostLink`] over the host runtime's inbound tokio queue.
///
/// Frames are tagged with the surface id so the host knows where to route
/// the response.
#[derive(Debug, Clone)]
pub struct ChannelLink {
    origin: SurfaceId,
    tx: mpsc::UnboundedSender<(SurfaceId, String)>,
}

impl ChannelLink {
    #[must_use]
    pub fn new(origin: SurfaceId, tx: mpsc::UnboundedSender<(SurfaceId, String)>) -> Self {
        Self { origin, tx }
    }
}

impl HostLink for ChannelLink {
    fn send(&self, frame: &ClientFrame) -> Result<(), BusError> {
        let raw = frame.encode()?;
        self.tx
            .send((self.origin.clone(), raw))
            .map_err(|_| BusError::LinkClosed)
    }
}
