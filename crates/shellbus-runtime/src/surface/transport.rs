//! Surface transports and the directory of open surfaces.
//!
//! The list of open windows belongs to whoever manages windows; the bus
//! only queries it through [`SurfaceDirectory`] at fan-out time.

use super::TransportError;
use parking_lot::RwLock;
use shellbus_types::SurfaceId;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Inbound side of one open surface.
pub trait SurfaceTransport: Send + Sync {
    /// The surface this transport delivers to.
    fn id(&self) -> &SurfaceId;

    /// Delivers one already encoded host frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the surface cannot take the frame.
    fn send(&self, frame: &str) -> Result<(), TransportError>;
}

/// Source of the surfaces currently open.
pub trait SurfaceDirectory: Send + Sync {
    /// Surfaces to fan out to, in the order they should receive frames.
    fn open_surfaces(&self) -> Vec<Arc<dyn SurfaceTransport>>;
}

/// In-process directory of open surfaces.
///
/// # Example
///
/// ```
/// use shellbus_runtime::surface::{ChannelTransport, SurfaceDirectory, SurfaceSet};
/// use shellbus_types::SurfaceId;
/// use std::sync::Arc;
///
/// let set = SurfaceSet::new();
/// let (transport, _rx) = ChannelTransport::new(SurfaceId::new("main"));
/// let id = transport.surface().clone();
///
/// set.insert(Arc::new(transport));
/// assert_eq!(set.open_surfaces().len(), 1);
/// assert!(set.remove(&id).is_some());
/// assert!(set.is_empty());
/// ```
#[derive(Default)]
pub struct SurfaceSet {
    surfaces: RwLock<Vec<Arc<dyn SurfaceTransport>>>,
}

impl SurfaceSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a surface. A transport with the same id replaces the old one.
    pub fn insert(&self, transport: Arc<dyn SurfaceTransport>) {
        let mut surfaces = self.surfaces.write();
        surfaces.retain(|t| t.id() != transport.id());
        surfaces.push(transport);
    }

    /// Removes a surface, returning its transport.
    pub fn remove(&self, id: &SurfaceId) -> Option<Arc<dyn SurfaceTransport>> {
        let mut surfaces = self.surfaces.write();
        let index = surfaces.iter().position(|t| t.id() == id)?;
        Some(surfaces.remove(index))
    }

    /// Looks up one surface.
    #[must_use]
    pub fn get(&self, id: &SurfaceId) -> Option<Arc<dyn SurfaceTransport>> {
        self.surfaces.read().iter().find(|t| t.id() == id).cloned()
    }

    /// Ids of the open surfaces, in opening order.
    #[must_use]
    pub fn ids(&self) -> Vec<SurfaceId> {
        self.surfaces.read().iter().map(|t| t.id().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.read().is_empty()
    }
}

impl SurfaceDirectory for SurfaceSet {
    fn open_surfaces(&self) -> Vec<Arc<dyn SurfaceTransport>> {
        self.surfaces.read().clone()
    }
}

impl std::fmt::Debug for SurfaceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceSet")
            .field("surfaces", &self.ids())
            .finish()
    }
}

/// Transport backed by a tokio unbounded channel.
///
/// The receiving half is what a [`ClientBridge`](crate::bridge::ClientBridge)
/// pumps. Dropping the receiver makes every later send fail with
/// [`TransportError::Closed`].
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    surface: SurfaceId,
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    /// Creates a transport and the receiver for the surface side.
    #[must_use]
    pub fn new(surface: SurfaceId) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { surface, tx }, rx)
    }

    #[must_use]
    pub fn surface(&self) -> &SurfaceId {
        &self.surface
    }
}

impl SurfaceTransport for ChannelTransport {
    fn id(&self) -> &SurfaceId {
        &self.surface
    }

    fn send(&self, frame: &str) -> Result<(), TransportError> {
        self.tx
            .send(frame.to_string())
            .map_err(|_| TransportError::Closed(self.surface.clone()))
    }
}
