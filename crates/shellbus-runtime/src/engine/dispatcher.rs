//! Dispatcher core shared by the host bus and the client bridge.
//!
//! Both sides of the boundary run listeners through this one loop, so they
//! cannot drift apart on ordering or on whether a failure stops delivery.
//!
//! # Dispatch Loop
//!
//! ```text
//! snapshot(channel) ──► for each (id, sub) in registration order
//!                         │
//!                         ├─ still registered?  no ──► skip
//!                         ├─ on_message  ──► Ok / ErrorEnvelope (logged)
//!                         ├─ on_reply    ──► Ok / ErrorEnvelope (logged)
//!                         └─ is_async    ──► queue value for <channel>-reply
//! ```
//!
//! Queued replies are returned to the caller rather than dispatched here:
//! the host bus sends them only after the originating fan-out finished.

use super::{guard, BusError, Registry, Subscription};
use crate::config::BusConfig;
use serde_json::Value;
use shellbus_event::{Channel, ErrorEnvelope, Stage};
use shellbus_types::{Owner, SubscriptionId};
use tracing::{debug, trace, warn};

/// What one subscription produced for one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub subscription: SubscriptionId,
    pub owner: Owner,
    /// Result of the message callback.
    pub callback: Result<Value, ErrorEnvelope>,
    /// Result of the reply callback, if the subscription has one.
    pub reply: Option<Result<Value, ErrorEnvelope>>,
}

impl DispatchOutcome {
    /// Returns `true` if either stage failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.callback.is_err() || matches!(self.reply, Some(Err(_)))
    }
}

/// A reply waiting to be dispatched on a derived reply channel.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingReply {
    pub channel: Channel,
    pub payload: Value,
}

/// Result of one pass of the dispatch loop.
#[derive(Debug, Default)]
pub(crate) struct Dispatched {
    pub outcomes: Vec<DispatchOutcome>,
    pub replies: Vec<PendingReply>,
}

/// Registry plus the loop that runs it.
#[derive(Debug, Default)]
pub(crate) struct Dispatcher {
    registry: Registry,
    config: BusConfig,
}

impl Dispatcher {
    pub fn new(config: BusConfig) -> Self {
        Self {
            registry: Registry::new(),
            config,
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Validates and inserts a subscription.
    pub fn register(&self, subscription: Subscription) -> Result<SubscriptionId, BusError> {
        let channel = subscription.channel();

        if subscription.is_async() && channel.is_reply() {
            return Err(BusError::AsyncOnReplyChannel(channel.clone()));
        }

        if self.config.enforce_prefix && !channel.is_conventional() {
            return Err(BusError::PrefixRequired(channel.clone()));
        }

        let channel = channel.clone();
        let owner = subscription.owner().clone();
        let is_async = subscription.is_async();
        let id = self.registry.insert(subscription);
        debug!(subscription = %id, channel = %channel, owner = %owner, is_async, "registered");
        Ok(id)
    }

    /// Removes one subscription. Unknown ids are a no-op.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let removed = self.registry.remove(id).is_some();
        if removed {
            debug!(subscription = %id, "unregistered");
        }
        removed
    }

    pub fn remove_owned_by(&self, owner: &Owner) -> usize {
        let removed = self.registry.remove_owned_by(owner);
        if removed > 0 {
            debug!(owner = %owner, removed, "removed owned subscriptions");
        }
        removed
    }

    /// Runs every subscription on `channel` once, in registration order.
    pub fn run(&self, channel: &Channel, payload: &Value) -> Dispatched {
        let snapshot = self.registry.snapshot(channel);
        let mut dispatched = Dispatched {
            outcomes: Vec::with_capacity(snapshot.len()),
            replies: Vec::new(),
        };

        for (id, sub) in snapshot {
            // Removed by an earlier listener in this same dispatch.
            if !self.registry.contains(id) {
                trace!(subscription = %id, channel = %channel, "skipping removed subscription");
                continue;
            }

            let callback = guard::invoke(
                sub.on_message(),
                payload,
                channel,
                Stage::Callback,
                self.config.catch_panics,
            );
            if let Err(ref envelope) = callback {
                warn!(
                    subscription = %id,
                    channel = %channel,
                    name = %envelope.name,
                    message = %envelope.message,
                    "listener failed"
                );
            }

            let reply = sub.on_reply().map(|on_reply| {
                let reply = guard::invoke(
                    on_reply,
                    payload,
                    channel,
                    Stage::Reply,
                    self.config.catch_panics,
                );
                if let Err(ref envelope) = reply {
                    warn!(
                        subscription = %id,
                        channel = %channel,
                        name = %envelope.name,
                        message = %envelope.message,
                        "reply stage failed"
                    );
                }
                reply
            });

            if sub.is_async() {
                let source = reply.as_ref().unwrap_or(&callback);
                match source {
                    Ok(value) => dispatched.replies.push(PendingReply {
                        channel: channel.reply(),
                        payload: value.clone(),
                    }),
                    Err(envelope) if self.config.surface_reply_errors => {
                        dispatched.replies.push(PendingReply {
                            channel: channel.reply(),
                            payload: envelope.to_value(),
                        });
                    }
                    Err(_) => {
                        trace!(subscription = %id, channel = %channel, "reply suppressed after failure");
                    }
                }
            }

            dispatched.outcomes.push(DispatchOutcome {
                subscription: id,
                owner: sub.owner().clone(),
                callback,
                reply,
            });
        }

        trace!(
            channel = %channel,
            delivered = dispatched.outcomes.len(),
            replies = dispatched.replies.len(),
            "dispatch pass complete"
        );
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use shellbus_event::ListenerError;
    use std::sync::Arc;

    fn channel(name: &str) -> Channel {
        Channel::parse(name).unwrap()
    }

    fn owner() -> Owner {
        Owner::service("test")
    }

    #[test]
    fn runs_in_registration_order() {
        let dispatcher = Dispatcher::default();
        let log = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let log = Arc::clone(&log);
            dispatcher
                .register(Subscription::new(channel("ping"), owner(), move |_: &Value| {
                    log.lock().push(n);
                    Ok(json!(n))
                }))
                .unwrap();
        }

        let dispatched = dispatcher.run(&channel("ping"), &json!(5));
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(dispatched.outcomes.len(), 3);
        assert!(dispatched.replies.is_empty());
    }

    #[test]
    fn failure_does_not_stop_later_listeners() {
        let dispatcher = Dispatcher::default();
        dispatcher
            .register(Subscription::new(channel("boom"), owner(), |_: &Value| {
                Err(ListenerError::msg("x"))
            }))
            .unwrap();
        dispatcher
            .register(Subscription::new(channel("boom"), owner(), |_: &Value| {
                Ok(json!(42))
            }))
            .unwrap();

        let outcomes = dispatcher.run(&channel("boom"), &Value::Null).outcomes;
        assert!(outcomes[0].is_failure());
        assert_eq!(outcomes[1].callback, Ok(json!(42)));
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let dispatcher = Arc::new(Dispatcher::default());
        let victim = Arc::new(Mutex::new(None::<SubscriptionId>));
        let fired = Arc::new(Mutex::new(0));

        {
            let dispatcher_ref = Arc::downgrade(&dispatcher);
            let victim = Arc::clone(&victim);
            dispatcher
                .register(Subscription::new(channel("ping"), owner(), move |_: &Value| {
                    if let (Some(d), Some(id)) = (dispatcher_ref.upgrade(), *victim.lock()) {
                        d.unregister(id);
                    }
                    Ok(Value::Null)
                }))
                .unwrap();
        }
        let fired_ref = Arc::clone(&fired);
        let id = dispatcher
            .register(Subscription::new(channel("ping"), owner(), move |_: &Value| {
                *fired_ref.lock() += 1;
                Ok(Value::Null)
            }))
            .unwrap();
        *victim.lock() = Some(id);

        let outcomes = dispatcher.run(&channel("ping"), &Value::Null).outcomes;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(*fired.lock(), 0);
    }

    #[test]
    fn async_reply_prefers_reply_stage() {
        let dispatcher = Dispatcher::default();
        dispatcher
            .register(
                Subscription::new(channel("greet"), owner(), |_: &Value| Ok(json!("ack")))
                    .with_reply(|p: &Value| Ok(json!({"hello": p["name"]})))
                    .asynchronous(),
            )
            .unwrap();

        let replies = dispatcher.run(&channel("greet"), &json!({"name": "Ann"})).replies;
        assert_eq!(
            replies,
            vec![PendingReply {
                channel: channel("greet-reply"),
                payload: json!({"hello": "Ann"}),
            }]
        );
    }

    #[test]
    fn async_without_reply_stage_sends_callback_result() {
        let dispatcher = Dispatcher::default();
        dispatcher
            .register(
                Subscription::new(channel("ipc-ping"), owner(), |p: &Value| Ok(p.clone()))
                    .asynchronous(),
            )
            .unwrap();

        let replies = dispatcher.run(&channel("ipc-ping"), &json!(9)).replies;
        assert_eq!(replies[0].payload, json!(9));
    }

    #[test]
    fn failed_async_reply_follows_config() {
        let failing = || {
            Subscription::new(channel("job"), owner(), |_: &Value| {
                Err(ListenerError::new("Unavailable", "down"))
            })
            .asynchronous()
        };

        let surfacing = Dispatcher::default();
        surfacing.register(failing()).unwrap();
        let replies = surfacing.run(&channel("job"), &Value::Null).replies;
        let envelope = ErrorEnvelope::detect(&replies[0].payload).unwrap();
        assert_eq!(envelope.name, "Unavailable");

        let quiet = Dispatcher::new(BusConfig {
            surface_reply_errors: false,
            ..BusConfig::default()
        });
        quiet.register(failing()).unwrap();
        assert!(quiet.run(&channel("job"), &Value::Null).replies.is_empty());
    }

    #[test]
    fn async_on_reply_channel_is_rejected() {
        let dispatcher = Dispatcher::default();
        let err = dispatcher
            .register(
                Subscription::new(channel("x-reply"), owner(), |_: &Value| Ok(Value::Null))
                    .asynchronous(),
            )
            .unwrap_err();
        assert!(matches!(err, BusError::AsyncOnReplyChannel(_)));
    }

    #[test]
    fn prefix_enforcement() {
        let dispatcher = Dispatcher::new(BusConfig {
            enforce_prefix: true,
            ..BusConfig::default()
        });
        let plain = Subscription::new(channel("ping"), owner(), |_: &Value| Ok(Value::Null));
        assert!(matches!(
            dispatcher.register(plain),
            Err(BusError::PrefixRequired(_))
        ));

        let prefixed = Subscription::new(channel("ipc-ping"), owner(), |_: &Value| Ok(Value::Null));
        assert!(dispatcher.register(prefixed).is_ok());
    }

    #[test]
    fn unregister_unknown_is_noop() {
        let dispatcher = Dispatcher::default();
        let id = dispatcher
            .register(Subscription::new(channel("a"), owner(), |_: &Value| Ok(Value::Null)))
            .unwrap();
        assert!(dispatcher.unregister(id));
        assert!(!dispatcher.unregister(id));
    }
}
