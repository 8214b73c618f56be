//! Engine layer: registry, dispatcher and the host-side bus.
//!
//! # Components
//!
//! | Type | Role |
//! |------|------|
//! | [`Registry`] | single map of live subscriptions |
//! | [`Subscription`] | listener + reply stage + async flag |
//! | [`HostBus`] | host adapter: dispatch, reply channel, relay, fan-out, wire |
//! | [`ChannelHandle`] | collaborator registration, removed on drop |
//!
//! The same dispatcher core also backs the
//! [`ClientBridge`](crate::bridge::ClientBridge) on the surface side.

mod accept;
mod bus;
mod dispatcher;
mod error;
pub(crate) mod guard;
mod handle;
mod registry;
mod relay;
mod subscription;

pub use accept::select_response;
pub use bus::{DispatchReport, HostBus};
pub use dispatcher::DispatchOutcome;
pub use error::BusError;
pub use handle::ChannelHandle;
pub use registry::Registry;
pub use subscription::{bind, Handler, ScopedHandler, Subscription};

pub(crate) use dispatcher::Dispatcher;
