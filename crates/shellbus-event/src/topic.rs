//! Typed topics.
//!
//! A [`Topic`] binds a [`Channel`] to the concrete payload and reply types
//! that travel on it, so host services get compile-time checking instead
//! of hand-decoding `serde_json::Value` at every call site.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use shellbus_event::{Channel, Topic};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Login { user: String }
//!
//! struct LoginTopic;
//!
//! impl Topic for LoginTopic {
//!     type Payload = Login;
//!     type Reply = bool;
//!
//!     fn channel() -> Channel {
//!         Channel::Named("ipc-login".into())
//!     }
//! }
//!
//! assert_eq!(LoginTopic::channel().to_string(), "ipc-login");
//! ```

use crate::Channel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shellbus_types::SurfaceId;

/// A channel with a fixed payload and reply type.
pub trait Topic {
    /// Payload carried on [`Topic::channel`].
    type Payload: Serialize + DeserializeOwned;

    /// Value a handler returns (and, for async subscriptions, the value
    /// delivered on the reply channel). Use `()` when nothing is returned.
    type Reply: Serialize + DeserializeOwned;

    /// The channel this topic travels on.
    fn channel() -> Channel;
}

/// Window lifecycle notifications published by the host runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowStateTopic;

/// Payload of [`WindowStateTopic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WindowStateEvent {
    /// A surface attached to the bus and now receives fan-out.
    Opened { surface: SurfaceId },
    /// A surface detached; its subscriptions are gone.
    Closed { surface: SurfaceId },
}

impl WindowStateEvent {
    /// The surface this event is about.
    #[must_use]
    pub fn surface(&self) -> &SurfaceId {
        match self {
            Self::Opened { surface } | Self::Closed { surface } => surface,
        }
    }
}

impl Topic for WindowStateTopic {
    type Payload = WindowStateEvent;
    type Reply = ();

    fn channel() -> Channel {
        Channel::WindowState
    }
}

/// Settings change notifications.
///
/// Only the notification shape lives here; storing settings is the
/// settings service's business.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsTopic;

/// Payload of [`SettingsTopic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingChange {
    pub key: String,
    pub value: serde_json::Value,
}

impl Topic for SettingsTopic {
    type Payload = SettingChange;
    type Reply = ();

    fn channel() -> Channel {
        Channel::Settings
    }
}
