//! Surface transport errors.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`TransportError::Closed`] | `TRANSPORT_CLOSED` | No |
//! | [`TransportError::Rejected`] | `TRANSPORT_REJECTED` | Yes |
//! | [`TransportError::Panicked`] | `TRANSPORT_PANICKED` | No |

use shellbus_types::{ErrorCode, SurfaceId};
use thiserror::Error;

/// Delivery to one surface failed.
///
/// Fan-out logs these per surface and moves on; they never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The surface's inbound side is gone (window torn down).
    #[error("surface {0} is closed")]
    Closed(SurfaceId),

    /// The surface refused the frame for now.
    #[error("surface {surface} rejected frame: {reason}")]
    Rejected { surface: SurfaceId, reason: String },

    /// The transport panicked while sending.
    #[error("transport for {surface} panicked: {message}")]
    Panicked { surface: SurfaceId, message: String },
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Closed(_) => "TRANSPORT_CLOSED",
            Self::Rejected { .. } => "TRANSPORT_REJECTED",
            Self::Panicked { .. } => "TRANSPORT_PANICKED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
