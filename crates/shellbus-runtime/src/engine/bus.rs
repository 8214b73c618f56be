//! HostBus: the host-side adapter over the dispatcher core.
//!
//! # Dispatch Sequence
//!
//! ```text
//! dispatch(channel, payload)
//!     │
//!     ├─1─► local subscriptions (registration order, failures contained)
//!     │
//!     ├─2─► fan-out to every open surface (HostFrame::Event, encoded once)
//!     │
//!     └─3─► queued async replies ──► dispatch(<channel>-reply, value)
//!                                      (same three steps, no further replies)
//! ```
//!
//! Step 3 cannot recurse further: async subscriptions are refused on reply
//! channels, so a reply dispatch never queues replies of its own.

use super::dispatcher::{Dispatched, Dispatcher};
use super::{bind, BusError, ChannelHandle, DispatchOutcome, ScopedHandler, Subscription};
use crate::config::BusConfig;
use crate::surface::{self, FanoutReport, SurfaceDirectory, SurfaceSet};
use serde_json::Value;
use shellbus_event::{Channel, EventError, ListenerError, Topic};
use shellbus_types::{Owner, SubscriptionId};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Everything one dispatch did.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    /// Per-subscription results, in registration order.
    pub outcomes: Vec<DispatchOutcome>,
    /// Per-surface delivery results.
    pub fanout: FanoutReport,
    /// Number of async replies dispatched on the reply channel afterwards.
    pub replies: usize,
}

struct Inner {
    dispatcher: Dispatcher,
    surfaces: Arc<dyn SurfaceDirectory>,
}

/// The host side of the bus.
///
/// Cheap to clone; clones share one registry. Each `HostBus::new` is an
/// independent bus, so tests can run side by side.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use shellbus_event::Channel;
/// use shellbus_runtime::engine::{HostBus, Subscription};
/// use shellbus_types::Owner;
///
/// let bus = HostBus::default();
/// let ping = Channel::parse("ping").unwrap();
///
/// bus.register(Subscription::new(ping.clone(), Owner::service("pinger"), |p: &Value| {
///     Ok(json!({"pong": p}))
/// }))
/// .unwrap();
///
/// let outcomes = bus.dispatch(&ping, &json!(5));
/// assert_eq!(outcomes.len(), 1);
/// assert_eq!(outcomes[0].callback, Ok(json!({"pong": 5})));
/// ```
#[derive(Clone)]
pub struct HostBus {
    inner: Arc<Inner>,
}

impl HostBus {
    /// Creates a bus with no surfaces attached.
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        Self::with_surfaces(config, Arc::new(SurfaceSet::new()))
    }

    /// Creates a bus that fans out to the surfaces listed by `surfaces`.
    #[must_use]
    pub fn with_surfaces(config: BusConfig, surfaces: Arc<dyn SurfaceDirectory>) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher: Dispatcher::new(config),
                surfaces,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        self.inner.dispatcher.config()
    }

    /// Registers a subscription.
    ///
    /// # Errors
    ///
    /// - [`BusError::AsyncOnReplyChannel`] for an async subscription on a
    ///   `-reply` channel
    /// - [`BusError::PrefixRequired`] when `enforce_prefix` is on and the
    ///   channel is not `ipc-` prefixed
    pub fn register(&self, subscription: Subscription) -> Result<SubscriptionId, BusError> {
        self.inner.dispatcher.register(subscription)
    }

    /// Removes one subscription.
    ///
    /// Returns `false` if it was already gone; that is not an error.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.unregister(id)
    }

    /// Removes everything `owner` registered. Returns how many went.
    pub fn remove_owned_by(&self, owner: &Owner) -> usize {
        self.inner.dispatcher.remove_owned_by(owner)
    }

    /// Returns `true` while `id` is registered.
    #[must_use]
    pub fn is_registered(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.registry().contains(id)
    }

    /// Total number of subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.dispatcher.registry().len()
    }

    /// Channels that currently have subscribers.
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        self.inner.dispatcher.registry().channels()
    }

    /// Host-internal dispatch, bypassing the wire format.
    ///
    /// Never fails: listener and surface failures are contained and show up
    /// in the returned outcomes (or only in the log, for surfaces). No
    /// subscribers and no surfaces yields an empty vector.
    pub fn dispatch(&self, channel: &Channel, payload: &Value) -> Vec<DispatchOutcome> {
        self.dispatch_report(channel, payload).outcomes
    }

    /// Like [`HostBus::dispatch`], also returning fan-out and reply details.
    pub fn dispatch_report(&self, channel: &Channel, payload: &Value) -> DispatchReport {
        debug!(channel = %channel, "dispatch");
        let Dispatched { outcomes, replies } = self.inner.dispatcher.run(channel, payload);

        let fanout = self.fan_out(channel, payload);

        let reply_count = replies.len();
        for reply in replies {
            trace!(channel = %reply.channel, "dispatching async reply");
            self.dispatch_report(&reply.channel, &reply.payload);
        }

        DispatchReport {
            outcomes,
            fanout,
            replies: reply_count,
        }
    }

    fn fan_out(&self, channel: &Channel, payload: &Value) -> FanoutReport {
        match surface::fan_out(
            self.inner.surfaces.as_ref(),
            channel,
            payload,
            self.config().catch_panics,
        ) {
            Ok(report) => report,
            Err(err) => {
                warn!(channel = %channel, error = %err, "fan-out skipped: frame did not encode");
                FanoutReport::default()
            }
        }
    }

    /// Registers a typed handler for topic `T`.
    ///
    /// # Errors
    ///
    /// Same as [`HostBus::register`].
    pub fn subscribe<T, F>(&self, owner: Owner, handler: F) -> Result<SubscriptionId, BusError>
    where
        T: Topic + 'static,
        F: Fn(T::Payload) -> Result<T::Reply, ListenerError> + Send + Sync + 'static,
    {
        self.register(Subscription::topic::<T, F>(owner, handler))
    }

    /// Dispatches a typed payload on topic `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Event`] if the payload does not serialize.
    pub fn publish<T: Topic>(&self, payload: &T::Payload) -> Result<Vec<DispatchOutcome>, BusError> {
        let value =
            serde_json::to_value(payload).map_err(|e| EventError::Codec(e.to_string()))?;
        Ok(self.dispatch(&T::channel(), &value))
    }

    /// Collaborator API: registers `on_message` on `channel` and, if given,
    /// `on_reply` on its reply channel, both bound to `scope`.
    ///
    /// The returned handle removes both registrations on
    /// [`ChannelHandle::remove`] or when dropped.
    ///
    /// # Errors
    ///
    /// Same as [`HostBus::register`]. Nothing stays registered on error.
    pub fn create_channel<S, M>(
        &self,
        channel: Channel,
        owner: Owner,
        scope: Arc<S>,
        on_message: M,
        on_reply: Option<ScopedHandler<S>>,
    ) -> Result<ChannelHandle, BusError>
    where
        S: Send + Sync + 'static,
        M: Fn(&S, &Value) -> Result<Value, ListenerError> + Send + Sync + 'static,
    {
        let message = self.register(Subscription::from_handler(
            channel.clone(),
            owner.clone(),
            bind(Arc::clone(&scope), on_message),
        ))?;

        let reply = match on_reply {
            Some(on_reply) => {
                let subscription =
                    Subscription::from_handler(channel.reply(), owner, bind(scope, on_reply));
                match self.register(subscription) {
                    Ok(id) => Some(id),
                    Err(err) => {
                        self.unregister(message);
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        Ok(ChannelHandle::new(self.clone(), channel, message, reply))
    }
}

impl Default for HostBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl std::fmt::Debug for HostBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBus")
            .field("config", self.config())
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}
