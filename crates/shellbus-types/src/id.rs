//! Identifier types.
//!
//! Envelope and surface identifiers are UUID-based so they stay unique
//! across the process boundary. Subscription identifiers never leave the
//! host, so they are a process-wide counter whose ordering doubles as
//! registration order.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Identity of one registered subscription.
///
/// Two subscriptions on the same channel with the same callback are still
/// distinct: removal always targets the id, never the channel name.
///
/// Ids are allocated from a process-wide monotonic counter, so they are
/// never reused and compare in registration order.
///
/// # Example
///
/// ```
/// use shellbus_types::SubscriptionId;
///
/// let first = SubscriptionId::next();
/// let second = SubscriptionId::next();
/// assert!(first < second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates the next id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw sequence number.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

/// Correlation token carried by every envelope that crosses the boundary.
///
/// A fresh token is generated per outgoing request; the client bridge uses
/// it to match a blocking response (or a caller-correlated reply) to the
/// call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvelopeId(pub Uuid);

#[allow(clippy::new_without_default)] // generated per request, never defaulted
impl EnvelopeId {
    /// Creates a new random token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for EnvelopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "env:{}", self.0)
    }
}

/// Identifier for an open UI surface (a window running presentation code).
///
/// `PartialEq` compares the UUID and the label. Two surfaces opened with the
/// same label are still different surfaces.
///
/// # Example
///
/// ```
/// use shellbus_types::SurfaceId;
///
/// let a = SurfaceId::new("main");
/// let b = SurfaceId::new("main");
/// assert_ne!(a, b);
/// assert_eq!(a.label(), "main");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId {
    uuid: Uuid,
    label: String,
}

impl SurfaceId {
    /// Creates a surface id with a random UUID.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            label: label.into(),
        }
    }

    /// Human-readable label (window name).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.label, self.uuid)
    }
}
