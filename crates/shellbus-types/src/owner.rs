//! Subscription ownership.

use crate::SurfaceId;
use serde::{Deserialize, Serialize};

/// The context that registered a subscription.
///
/// Ownership exists so teardown can be wholesale: when a surface closes,
/// everything it (or a host service acting for it) registered is removed
/// in one call, and the registry does not grow as windows come and go.
///
/// | Variant | Typical registrant |
/// |---------|--------------------|
/// | `Service` | host-side collaborator (window manager, settings, network) |
/// | `Surface` | a UI surface, or a host handler bound to one window |
///
/// # Example
///
/// ```
/// use shellbus_types::{Owner, SurfaceId};
///
/// let settings = Owner::service("settings");
/// let window = Owner::Surface(SurfaceId::new("main"));
///
/// assert!(settings.is_service());
/// assert!(window.surface().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// A named host-side service.
    Service(String),
    /// A UI surface.
    Surface(SurfaceId),
}

impl Owner {
    /// Creates a [`Owner::Service`].
    #[must_use]
    pub fn service(name: impl Into<String>) -> Self {
        Self::Service(name.into())
    }

    /// Returns `true` for [`Owner::Service`].
    #[must_use]
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// Returns the surface id for [`Owner::Surface`].
    #[must_use]
    pub fn surface(&self) -> Option<&SurfaceId> {
        match self {
            Self::Surface(id) => Some(id),
            Self::Service(_) => None,
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(name) => write!(f, "service:{name}"),
            Self::Surface(id) => write!(f, "surface:{id}"),
        }
    }
}
