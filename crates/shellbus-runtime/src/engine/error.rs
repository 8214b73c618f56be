//! Bus layer errors.
//!
//! Listener failures are never errors of the bus itself: they are captured
//! as [`ErrorEnvelope`] values in the dispatch outcome. [`BusError`] covers
//! the calls that fail as a whole.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`BusError::Timeout`] | `BUS_TIMEOUT` | Yes |
//! | [`BusError::EmptyResponse`] | `BUS_EMPTY_RESPONSE` | No |
//! | [`BusError::Remote`] | `BUS_REMOTE_FAILURE` | No |
//! | [`BusError::LinkClosed`] | `BUS_LINK_CLOSED` | No |
//! | [`BusError::AsyncOnReplyChannel`] | `BUS_ASYNC_ON_REPLY_CHANNEL` | No |
//! | [`BusError::PrefixRequired`] | `BUS_PREFIX_REQUIRED` | No |
//! | [`BusError::Event`] | `BUS_EVENT` | No |
//!
//! # Recoverability
//!
//! Only `Timeout` may succeed on retry: the host was slow, not wrong.

use shellbus_event::{Channel, ErrorEnvelope, EventError};
use shellbus_types::{EnvelopeId, ErrorCode};
use thiserror::Error;

/// Bus layer error.
///
/// # Example
///
/// ```
/// use shellbus_runtime::BusError;
/// use shellbus_types::{EnvelopeId, ErrorCode};
///
/// let err = BusError::Timeout(EnvelopeId::new());
/// assert_eq!(err.code(), "BUS_TIMEOUT");
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// A blocking dispatch got no answer within `bus.request_timeout_ms`.
    #[error("request timed out: {0}")]
    Timeout(EnvelopeId),

    /// The host answered a blocking dispatch with `null`.
    #[error("empty response on {0}")]
    EmptyResponse(Channel),

    /// The host answered a blocking dispatch with an error envelope.
    #[error("remote failure: {0}")]
    Remote(Box<ErrorEnvelope>),

    /// The outbound link to the host is gone.
    #[error("link to host closed")]
    LinkClosed,

    /// Async subscriptions cannot live on a reply channel.
    #[error("async subscription not allowed on reply channel {0}")]
    AsyncOnReplyChannel(Channel),

    /// `bus.enforce_prefix` is on and the channel lacks the `ipc-` prefix.
    #[error("channel {0} must start with \"ipc-\"")]
    PrefixRequired(Channel),

    /// Decoding or encoding a message failed.
    #[error(transparent)]
    Event(#[from] EventError),
}

impl ErrorCode for BusError {
    fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "BUS_TIMEOUT",
            Self::EmptyResponse(_) => "BUS_EMPTY_RESPONSE",
            Self::Remote(_) => "BUS_REMOTE_FAILURE",
            Self::LinkClosed => "BUS_LINK_CLOSED",
            Self::AsyncOnReplyChannel(_) => "BUS_ASYNC_ON_REPLY_CHANNEL",
            Self::PrefixRequired(_) => "BUS_PREFIX_REQUIRED",
            Self::Event(_) => "BUS_EVENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
