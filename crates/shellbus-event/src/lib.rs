//! Message types for the shellbus event bus.
//!
//! This crate defines what travels on the bus: which channels exist, how
//! payloads are typed, and how messages are framed when they cross the
//! boundary between the privileged host and an untrusted UI surface.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  shellbus-types   : ids, Owner, ErrorCode                    │
//! │  shellbus-event   : Channel, Topic, envelopes  ◄── HERE      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  shellbus-runtime : registry, HostBus, ClientBridge, config  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Message Shapes
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`Envelope`] | surface → host | blocking request with correlation id |
//! | [`EchoEnvelope`] | surface → host (sonar) | re-broadcast to every listener |
//! | [`ClientFrame`] / [`HostFrame`] | both | transport framing |
//! | [`ErrorEnvelope`] | both | serializable failure record |
//!
//! # Channels
//!
//! [`Channel`] is a closed set of well-known channels plus a `Named`
//! fallback. Every channel has a derived reply channel
//! ([`Channel::reply`]) used for the second, asynchronous message of a
//! request. [`Topic`] binds a channel to concrete payload types.
//!
//! # Usage
//!
//! ```
//! use serde_json::json;
//! use shellbus_event::{Channel, ClientFrame, EchoEnvelope};
//!
//! let echo = EchoEnvelope::new(Channel::parse("ipc-ping").unwrap(), json!(7));
//! let frame = ClientFrame::Post {
//!     channel: Channel::Sonar,
//!     payload: json!(echo.encode().unwrap()),
//! };
//!
//! let raw = frame.encode().unwrap();
//! assert_eq!(ClientFrame::decode(&raw).unwrap(), frame);
//! ```

mod channel;
mod envelope;
mod error;
mod failure;
mod topic;
mod wire;

pub use channel::{Channel, CHANNEL_PREFIX, MAX_REPLY_DEPTH, REPLY_SUFFIX, SONAR_CHANNEL};
pub use envelope::{EchoEnvelope, Envelope};
pub use error::EventError;
pub use failure::{ErrorEnvelope, ListenerError, Stage};
pub use topic::{SettingChange, SettingsTopic, Topic, WindowStateEvent, WindowStateTopic};
pub use wire::{ClientFrame, HostFrame};

pub use shellbus_types::{EnvelopeId, SurfaceId};
