//! Subscriptions: a listener bound to a channel.
//!
//! A [`Subscription`] is plain data until it is registered; the registry
//! then assigns it a [`SubscriptionId`](shellbus_types::SubscriptionId),
//! which is the only thing removal ever matches on.
//!
//! # Stages
//!
//! ```text
//! dispatch(channel, payload)
//!     │
//!     ├─► on_message(payload)  ──► callback result
//!     │
//!     └─► on_reply(payload)    ──► reply result      (optional)
//!                                      │
//!                     is_async ────────┴──► dispatched on <channel>-reply
//! ```

use serde_json::Value;
use shellbus_event::{Channel, ListenerError, Topic};
use shellbus_types::Owner;
use std::sync::Arc;

/// A listener callback.
///
/// Returning `Err` is how a listener reports failure; the dispatcher turns
/// it into an [`ErrorEnvelope`](shellbus_event::ErrorEnvelope) and carries on
/// with the next subscription.
pub type Handler = Arc<dyn Fn(&Value) -> Result<Value, ListenerError> + Send + Sync>;

/// A listener that receives its scope as the first argument.
///
/// See [`bind`].
pub type ScopedHandler<S> = Box<dyn Fn(&S, &Value) -> Result<Value, ListenerError> + Send + Sync>;

/// Binds a scoped callback to its scope, producing a plain [`Handler`].
///
/// The scope is shared, so several handlers created for one component see
/// the same state without rebinding at each call site.
///
/// ```
/// use parking_lot::Mutex;
/// use serde_json::{json, Value};
/// use shellbus_runtime::engine::bind;
/// use std::sync::Arc;
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let handler = bind(Arc::clone(&seen), |seen: &Mutex<Vec<Value>>, payload: &Value| {
///     seen.lock().push(payload.clone());
///     Ok(Value::Null)
/// });
///
/// handler(&json!(1)).unwrap();
/// assert_eq!(seen.lock().len(), 1);
/// ```
pub fn bind<S, F>(scope: Arc<S>, callback: F) -> Handler
where
    S: Send + Sync + ?Sized + 'static,
    F: Fn(&S, &Value) -> Result<Value, ListenerError> + Send + Sync + 'static,
{
    Arc::new(move |payload: &Value| callback(&*scope, payload))
}

/// A listener registration, before and after it enters the registry.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use shellbus_event::Channel;
/// use shellbus_runtime::engine::Subscription;
/// use shellbus_types::Owner;
///
/// let greet = Channel::parse("greet").unwrap();
/// let sub = Subscription::new(greet, Owner::service("greeter"), |p: &Value| Ok(p.clone()))
///     .with_reply(|p: &Value| Ok(json!({"hello": p["name"]})))
///     .asynchronous();
///
/// assert!(sub.is_async());
/// assert!(sub.has_reply());
/// ```
pub struct Subscription {
    channel: Channel,
    owner: Owner,
    on_message: Handler,
    on_reply: Option<Handler>,
    is_async: bool,
}

impl Subscription {
    /// Creates a synchronous subscription without a reply stage.
    #[must_use]
    pub fn new<F>(channel: Channel, owner: Owner, on_message: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ListenerError> + Send + Sync + 'static,
    {
        Self::from_handler(channel, owner, Arc::new(on_message))
    }

    /// Creates a subscription from an already shared handler.
    #[must_use]
    pub fn from_handler(channel: Channel, owner: Owner, on_message: Handler) -> Self {
        Self {
            channel,
            owner,
            on_message,
            on_reply: None,
            is_async: false,
        }
    }

    /// Creates a subscription on a typed [`Topic`].
    ///
    /// The payload is decoded before `handler` runs; a payload that does not
    /// match `T::Payload` fails the callback stage with a `DecodeError`
    /// instead of reaching the handler.
    #[must_use]
    pub fn topic<T, F>(owner: Owner, handler: F) -> Self
    where
        T: Topic + 'static,
        F: Fn(T::Payload) -> Result<T::Reply, ListenerError> + Send + Sync + 'static,
    {
        Self::new(T::channel(), owner, move |payload: &Value| {
            let decoded: T::Payload =
                serde_json::from_value(payload.clone()).map_err(|e| ListenerError::decode(&e))?;
            let reply = handler(decoded)?;
            serde_json::to_value(reply).map_err(|e| ListenerError::encode(&e))
        })
    }

    /// Adds a reply stage, invoked with the same payload after `on_message`.
    #[must_use]
    pub fn with_reply<F>(self, on_reply: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ListenerError> + Send + Sync + 'static,
    {
        self.with_reply_handler(Arc::new(on_reply))
    }

    /// Adds a reply stage from an already shared handler.
    #[must_use]
    pub fn with_reply_handler(mut self, on_reply: Handler) -> Self {
        self.on_reply = Some(on_reply);
        self
    }

    /// Marks the subscription async: its result is dispatched again on the
    /// derived reply channel.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    #[must_use]
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    #[must_use]
    pub fn has_reply(&self) -> bool {
        self.on_reply.is_some()
    }

    pub(crate) fn on_message(&self) -> &Handler {
        &self.on_message
    }

    pub(crate) fn on_reply(&self) -> Option<&Handler> {
        self.on_reply.as_ref()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("owner", &self.owner)
            .field("has_reply", &self.on_reply.is_some())
            .field("is_async", &self.is_async)
            .finish_non_exhaustive()
    }
}
