//! Channel registry: the single authoritative collection of subscriptions.
//!
//! Subscriptions live in one map keyed by [`SubscriptionId`]. Removing an
//! entry is the whole of unregistration; there is no separate "active"
//! flag that could disagree with the map.
//!
//! Because ids are allocated from a monotonic counter at insertion, map
//! order is registration order, which is the order dispatch runs in.

use super::Subscription;
use parking_lot::RwLock;
use shellbus_event::Channel;
use shellbus_types::{Owner, SubscriptionId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Owned registry of subscriptions.
///
/// Every bus instance holds its own registry; there is no global one.
///
/// # Example
///
/// ```
/// use serde_json::Value;
/// use shellbus_event::Channel;
/// use shellbus_runtime::engine::{Registry, Subscription};
/// use shellbus_types::Owner;
///
/// let registry = Registry::new();
/// let ping = Channel::parse("ping").unwrap();
///
/// let id = registry.insert(Subscription::new(ping.clone(), Owner::service("a"), |_: &Value| {
///     Ok(Value::Null)
/// }));
///
/// assert_eq!(registry.snapshot(&ping).len(), 1);
/// assert!(registry.remove(id).is_some());
/// assert!(registry.remove(id).is_none());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<BTreeMap<SubscriptionId, Arc<Subscription>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription and returns its freshly allocated id.
    ///
    /// Duplicates are legal: the same channel and callback registered twice
    /// are two subscriptions and both fire.
    pub fn insert(&self, subscription: Subscription) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.entries.write().insert(id, Arc::new(subscription));
        id
    }

    /// Removes exactly one subscription. Returns `None` if it was already gone.
    pub fn remove(&self, id: SubscriptionId) -> Option<Arc<Subscription>> {
        self.entries.write().remove(&id)
    }

    /// Removes every subscription registered by `owner`.
    ///
    /// Returns the number removed.
    pub fn remove_owned_by(&self, owner: &Owner) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, sub| sub.owner() != owner);
        before - entries.len()
    }

    /// Returns `true` while `id` is registered.
    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Copies out the subscriptions on `channel`, in registration order.
    ///
    /// The lock is released before the caller runs any listener, so
    /// listeners may register and unregister freely.
    #[must_use]
    pub fn snapshot(&self, channel: &Channel) -> Vec<(SubscriptionId, Arc<Subscription>)> {
        self.entries
            .read()
            .iter()
            .filter(|(_, sub)| sub.channel() == channel)
            .map(|(id, sub)| (*id, Arc::clone(sub)))
            .collect()
    }

    /// Number of subscriptions on `channel`.
    #[must_use]
    pub fn count_on(&self, channel: &Channel) -> usize {
        self.entries
            .read()
            .values()
            .filter(|sub| sub.channel() == channel)
            .count()
    }

    /// Distinct channels with at least one subscription, sorted by name.
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = Vec::new();
        for sub in self.entries.read().values() {
            if !channels.contains(sub.channel()) {
                channels.push(sub.channel().clone());
            }
        }
        channels.sort_by(|a, b| a.wire_name().cmp(&b.wire_name()));
        channels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use shellbus_types::SurfaceId;

    fn noop(channel: &str, owner: Owner) -> Subscription {
        Subscription::new(Channel::parse(channel).unwrap(), owner, |_: &Value| {
            Ok(Value::Null)
        })
    }

    #[test]
    fn snapshot_is_in_registration_order() {
        let registry = Registry::new();
        let ids: Vec<_> = (0..5)
            .map(|_| registry.insert(noop("ping", Owner::service("s"))))
            .collect();
        registry.insert(noop("other", Owner::service("s")));

        let snapshot: Vec<_> = registry
            .snapshot(&Channel::parse("ping").unwrap())
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(snapshot, ids);
    }

    #[test]
    fn duplicates_are_distinct_entries() {
        let registry = Registry::new();
        let a = registry.insert(noop("ping", Owner::service("s")));
        let b = registry.insert(noop("ping", Owner::service("s")));
        assert_ne!(a, b);
        assert_eq!(registry.count_on(&Channel::parse("ping").unwrap()), 2);

        registry.remove(a);
        assert!(!registry.contains(a));
        assert!(registry.contains(b));
    }

    #[test]
    fn snapshot_survives_concurrent_removal() {
        let registry = Registry::new();
        let id = registry.insert(noop("ping", Owner::service("s")));
        let snapshot = registry.snapshot(&Channel::parse("ping").unwrap());

        registry.remove(id);

        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_owned_by_only_touches_owner() {
        let registry = Registry::new();
        let window = Owner::Surface(SurfaceId::new("main"));
        registry.insert(noop("a", window.clone()));
        registry.insert(noop("b", window.clone()));
        let kept = registry.insert(noop("a", Owner::service("settings")));

        assert_eq!(registry.remove_owned_by(&window), 2);
        assert_eq!(registry.remove_owned_by(&window), 0);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(kept));
    }

    #[test]
    fn channels_are_distinct_and_sorted() {
        let registry = Registry::new();
        registry.insert(noop("b", Owner::service("s")));
        registry.insert(noop("a", Owner::service("s")));
        registry.insert(noop("b", Owner::service("s")));

        let names: Vec<_> = registry.channels().iter().map(ToString::to_string).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
