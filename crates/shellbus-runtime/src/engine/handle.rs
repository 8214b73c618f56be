//! Handle returned by [`HostBus::create_channel`].

use super::{DispatchOutcome, HostBus};
use serde_json::Value;
use shellbus_event::Channel;
use shellbus_types::SubscriptionId;

/// A collaborator's registration on one channel (and optionally its reply
/// channel).
///
/// Dropping the handle unregisters it, so a component that owns its handle
/// cannot leak subscriptions when it is torn down.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use shellbus_event::Channel;
/// use shellbus_runtime::engine::HostBus;
/// use shellbus_types::Owner;
/// use std::sync::Arc;
///
/// struct Greeter {
///     greeting: &'static str,
/// }
///
/// let bus = HostBus::default();
/// let handle = bus
///     .create_channel(
///         Channel::parse("ipc-greet").unwrap(),
///         Owner::service("greeter"),
///         Arc::new(Greeter { greeting: "hello" }),
///         |g: &Greeter, p: &Value| Ok(json!(format!("{} {}", g.greeting, p))),
///         None,
///     )
///     .unwrap();
///
/// let outcomes = handle.dispatch(&json!("Ann"));
/// assert_eq!(outcomes[0].callback, Ok(json!("hello \"Ann\"")));
///
/// handle.remove();
/// assert_eq!(bus.subscription_count(), 0);
/// ```
#[derive(Debug)]
pub struct ChannelHandle {
    bus: HostBus,
    channel: Channel,
    message: SubscriptionId,
    reply: Option<SubscriptionId>,
    removed: bool,
}

impl ChannelHandle {
    pub(crate) fn new(
        bus: HostBus,
        channel: Channel,
        message: SubscriptionId,
        reply: Option<SubscriptionId>,
    ) -> Self {
        Self {
            bus,
            channel,
            message,
            reply,
            removed: false,
        }
    }

    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Id of the message subscription.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.message
    }

    /// Id of the reply subscription, if one was registered.
    #[must_use]
    pub fn reply_id(&self) -> Option<SubscriptionId> {
        self.reply
    }

    /// Dispatches on this handle's channel through the owning bus.
    pub fn dispatch(&self, payload: &Value) -> Vec<DispatchOutcome> {
        self.bus.dispatch(&self.channel, payload)
    }

    /// Unregisters both subscriptions now.
    pub fn remove(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        self.bus.unregister(self.message);
        if let Some(reply) = self.reply {
            self.bus.unregister(reply);
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.detach();
    }
}
