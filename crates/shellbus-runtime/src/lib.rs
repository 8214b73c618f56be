//! Shellbus Runtime - registry, dispatch and transport plumbing.
//!
//! One bus, two adapters: the privileged host owns the authoritative
//! subscription registry and every surface (UI window) talks to it through
//! a [`ClientBridge`].
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  shellbus-types   : ids, Owner, ErrorCode                    │
//! │  shellbus-event   : Channel, Topic, envelopes, frames        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  shellbus-runtime (THIS CRATE)                               │
//! │    engine/  : Registry, HostBus, relay, wire adapter         │
//! │    surface/ : SurfaceTransport, SurfaceSet, fan-out          │
//! │    bridge/  : ClientBridge, ClientSubscription               │
//! │    host/    : HostRuntime (in-process host loop)             │
//! │    config/  : layered ShellbusConfig                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  shellbus-cli     : interactive driver                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Message Flow
//!
//! | From | Path | Reaches |
//! |------|------|---------|
//! | host code | [`HostBus::dispatch`] | host listeners, then every surface |
//! | surface, echo | relay on `ipc-sonar` | same as host dispatch |
//! | surface, direct | `post` frame | host listeners, then every surface |
//! | surface, blocking | `invoke` frame | host listeners; first answer returns |
//!
//! Async listeners send their result on `<channel>-reply`, which is
//! dispatched like any other channel after the originating fan-out.
//!
//! # Failure Isolation
//!
//! A listener error or panic becomes an
//! [`ErrorEnvelope`](shellbus_event::ErrorEnvelope) in that listener's
//! outcome. A failing surface transport is logged and skipped. Neither
//! stops the remaining listeners or surfaces.
//!
//! # Example
//!
//! ```
//! use serde_json::{json, Value};
//! use shellbus_event::Channel;
//! use shellbus_runtime::{HostBus, Subscription};
//! use shellbus_types::Owner;
//!
//! let bus = HostBus::default();
//! bus.register(
//!     Subscription::new(
//!         Channel::parse("ipc-ping").unwrap(),
//!         Owner::service("pinger"),
//!         |p: &Value| Ok(json!({"pong": p})),
//!     )
//!     .asynchronous(),
//! )
//! .unwrap();
//!
//! let report = bus.dispatch_report(&Channel::parse("ipc-ping").unwrap(), &json!(1));
//! assert_eq!(report.outcomes.len(), 1);
//! assert_eq!(report.replies, 1);
//! ```

pub mod bridge;
pub mod config;
pub mod engine;
pub mod host;
pub mod surface;

pub use bridge::{
    ChannelLink, ClientBridge, ClientSubscription, DispatchMode, DispatchReceipt, HostLink,
};
pub use config::{
    default_config_dir, default_config_path, BusConfig, ConfigError, ConfigLoader,
    ConfigResolver, LoggingConfig, NoOpResolver, ShellbusConfig, SurfacesConfig,
};
pub use engine::{
    bind, select_response, BusError, ChannelHandle, DispatchOutcome, DispatchReport, Handler,
    HostBus, Registry, ScopedHandler, Subscription,
};
pub use host::{HostRuntime, SurfaceSession};
pub use surface::{
    fan_out, ChannelTransport, FanoutReport, SurfaceDirectory, SurfaceSet, SurfaceTransport,
    TransportError,
};
