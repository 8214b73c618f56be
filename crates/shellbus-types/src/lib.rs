//! Core types for shellbus.
//!
//! shellbus is the cross-context event bus between a privileged host
//! process and the isolated UI surfaces (windows) it opens. This crate
//! holds the identifiers and the error-code contract shared by every
//! layer.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  shellbus-types   : ids, Owner, ErrorCode        ◄── HERE    │
//! │  shellbus-event   : Channel, Topic, envelopes, wire frames   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  shellbus-runtime : registry, HostBus, ClientBridge, config  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  shellbus-cli     : demo host shell                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Identifier Design
//!
//! - [`SubscriptionId`]: process-wide counter, never reused, ordered by
//!   registration
//! - [`EnvelopeId`]: random UUID per outgoing request
//! - [`SurfaceId`]: random UUID plus a window label
//!
//! # Example
//!
//! ```
//! use shellbus_types::{EnvelopeId, Owner, SubscriptionId, SurfaceId};
//!
//! let sub = SubscriptionId::next();
//! let request = EnvelopeId::new();
//! let window = SurfaceId::new("main");
//! let owner = Owner::Surface(window.clone());
//!
//! assert_eq!(owner.surface(), Some(&window));
//! assert_ne!(request, EnvelopeId::new());
//! assert!(sub < SubscriptionId::next());
//! ```

mod error;
mod id;
mod owner;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{EnvelopeId, SubscriptionId, SurfaceId};
pub use owner::Owner;
