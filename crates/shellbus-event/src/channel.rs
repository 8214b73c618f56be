//! Channel identifiers.
//!
//! Channels are a closed set of well-known names plus an open `Named`
//! fallback for ad-hoc traffic. The derived reply channel is modelled
//! structurally as [`Channel::Reply`] instead of by string concatenation
//! at every call site.
//!
//! # Wire Names
//!
//! | Variant | Wire name |
//! |---------|-----------|
//! | `Sonar` | `ipc-sonar` |
//! | `WindowState` | `ipc-window-state` |
//! | `Settings` | `ipc-settings` |
//! | `Named(n)` | `n` |
//! | `Reply(c)` | `<wire name of c>-reply` |
//!
//! Equality and hashing go through the wire name, so a channel parsed from
//! `"ipc-ping-reply"` and `Channel::parse("ipc-ping")?.reply()` are the same
//! key in every map.
//!
//! Parsing accepts at most [`MAX_REPLY_DEPTH`] trailing `-reply` suffixes.
//! Names arrive from surfaces, and a deeper name is refused before any
//! nesting is built.

use crate::EventError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Conventional prefix for bus channels.
pub const CHANNEL_PREFIX: &str = "ipc-";

/// Suffix of every derived reply channel.
pub const REPLY_SUFFIX: &str = "-reply";

/// Deepest reply nesting [`Channel::parse`] accepts (`x-reply-reply`).
pub const MAX_REPLY_DEPTH: usize = 2;

/// Wire name of the echo relay channel.
pub const SONAR_CHANNEL: &str = "ipc-sonar";

const WINDOW_STATE_CHANNEL: &str = "ipc-window-state";
const SETTINGS_CHANNEL: &str = "ipc-settings";

/// A logical topic on the bus.
///
/// Build channels with [`Channel::parse`] (or `str::parse`) so that names
/// ending in `-reply` and well-known names land on their canonical variant.
///
/// # Example
///
/// ```
/// use shellbus_event::Channel;
///
/// let ping: Channel = "ipc-ping".parse().unwrap();
/// let reply = ping.reply();
///
/// assert_eq!(reply.to_string(), "ipc-ping-reply");
/// assert_eq!(reply, "ipc-ping-reply".parse::<Channel>().unwrap());
/// assert_eq!(reply.origin(), Some(&ping));
/// assert_eq!("ipc-sonar".parse::<Channel>().unwrap(), Channel::Sonar);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Channel {
    /// The echo relay channel.
    Sonar,
    /// Window lifecycle notifications.
    WindowState,
    /// Settings change notifications.
    Settings,
    /// Any other channel, by name.
    Named(String),
    /// The derived reply channel of the boxed channel.
    Reply(Box<Channel>),
}

impl Channel {
    /// Parses a wire name into its canonical channel.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidChannel`] for an empty name, a bare
    /// `-reply` with nothing in front of it, or more than
    /// [`MAX_REPLY_DEPTH`] reply suffixes.
    pub fn parse(name: &str) -> Result<Self, EventError> {
        if name.is_empty() {
            return Err(EventError::InvalidChannel(
                "channel name cannot be empty".into(),
            ));
        }

        let mut base = name;
        let mut depth = 0;
        while let Some(stripped) = base.strip_suffix(REPLY_SUFFIX) {
            if stripped.is_empty() {
                return Err(EventError::InvalidChannel(format!(
                    "'{name}' has no originating channel"
                )));
            }
            depth += 1;
            if depth > MAX_REPLY_DEPTH {
                return Err(EventError::InvalidChannel(format!(
                    "more than {MAX_REPLY_DEPTH} '{REPLY_SUFFIX}' suffixes"
                )));
            }
            base = stripped;
        }

        let mut channel = match base {
            SONAR_CHANNEL => Self::Sonar,
            WINDOW_STATE_CHANNEL => Self::WindowState,
            SETTINGS_CHANNEL => Self::Settings,
            other => Self::Named(other.to_string()),
        };
        for _ in 0..depth {
            channel = Self::Reply(Box::new(channel));
        }
        Ok(channel)
    }

    /// Returns the derived reply channel (`<name>-reply`).
    #[must_use]
    pub fn reply(&self) -> Self {
        Self::Reply(Box::new(self.clone()))
    }

    /// Returns `true` for a derived reply channel.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }

    /// Returns the originating channel of a reply channel.
    #[must_use]
    pub fn origin(&self) -> Option<&Channel> {
        match self {
            Self::Reply(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns `true` for the echo relay channel.
    #[must_use]
    pub fn is_sonar(&self) -> bool {
        matches!(self, Self::Sonar)
    }

    /// Returns `true` if the name follows the `ipc-` convention.
    #[must_use]
    pub fn is_conventional(&self) -> bool {
        self.wire_name().starts_with(CHANNEL_PREFIX)
    }

    /// Returns the name used on the wire.
    #[must_use]
    pub fn wire_name(&self) -> Cow<'_, str> {
        match self {
            Self::Sonar => Cow::Borrowed(SONAR_CHANNEL),
            Self::WindowState => Cow::Borrowed(WINDOW_STATE_CHANNEL),
            Self::Settings => Cow::Borrowed(SETTINGS_CHANNEL),
            Self::Named(name) => Cow::Borrowed(name.as_str()),
            Self::Reply(_) => {
                let mut base = self;
                let mut depth = 0;
                while let Self::Reply(inner) = base {
                    base = &**inner;
                    depth += 1;
                }
                let mut name = base.wire_name().into_owned();
                for _ in 0..depth {
                    name.push_str(REPLY_SUFFIX);
                }
                Cow::Owned(name)
            }
        }
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.wire_name() == other.wire_name()
    }
}

impl Eq for Channel {}

impl Hash for Channel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.wire_name().hash(state);
    }
}

impl FromStr for Channel {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Channel {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.wire_name().into_owned()
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.wire_name())
    }
}
