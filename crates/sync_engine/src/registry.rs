//! Keyed subscriber arena.
//!
//! Two independent mappings, continuous and settle, each holding at most one
//! callback per element key. Entries live until removed by key; nothing here
//! ever expires them.

use std::collections::HashMap;
use std::fmt;

use contracts::{ElementId, OffsetCallback, SubscriptionChannel};

/// Cancellation handle returned by a subscribe call.
///
/// Removing it is the caller's job. Forgetting to do so leaks the entry for
/// the lifetime of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    channel: SubscriptionChannel,
    key: ElementId,
}

impl Subscription {
    pub(crate) fn new(channel: SubscriptionChannel, key: ElementId) -> Self {
        Self { channel, key }
    }

    /// Mapping this subscription lives in
    pub fn channel(&self) -> SubscriptionChannel {
        self.channel
    }

    /// Element key the callback is stored under
    pub fn key(&self) -> &ElementId {
        &self.key
    }
}

/// Continuous and settle subscriber mappings
#[derive(Default)]
pub struct SubscriberRegistry {
    continuous: HashMap<ElementId, OffsetCallback>,
    settle: HashMap<ElementId, OffsetCallback>,
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("continuous", &self.continuous.len())
            .field("settle", &self.settle.len())
            .finish()
    }
}

impl SubscriberRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a callback, replacing any callback already stored for the key.
    ///
    /// Returns `true` if an existing entry was replaced.
    pub fn insert(
        &mut self,
        channel: SubscriptionChannel,
        key: ElementId,
        callback: OffsetCallback,
    ) -> bool {
        self.mapping_mut(channel).insert(key, callback).is_some()
    }

    /// Remove the entry a subscription names.
    ///
    /// Removal is by key, so an already-removed key is a no-op returning `false`.
    pub fn remove(&mut self, subscription: &Subscription) -> bool {
        self.mapping_mut(subscription.channel)
            .remove(subscription.key.as_str())
            .is_some()
    }

    /// Whether a key has a callback in the given mapping
    pub fn contains(&self, channel: SubscriptionChannel, key: &str) -> bool {
        self.mapping(channel).contains_key(key)
    }

    /// Number of entries in the given mapping
    pub fn len(&self, channel: SubscriptionChannel) -> usize {
        self.mapping(channel).len()
    }

    /// Whether both mappings are empty
    pub fn is_empty(&self) -> bool {
        self.continuous.is_empty() && self.settle.is_empty()
    }

    /// Invoke every continuous callback except the one stored under `skip`.
    ///
    /// Iteration order is the map's order, which is unspecified.
    /// Returns the number of callbacks invoked.
    pub fn broadcast_continuous(&mut self, skip: &ElementId, offset: f64) -> usize {
        let mut delivered = 0;
        for (key, callback) in self.continuous.iter_mut() {
            if key == skip {
                continue;
            }
            callback(offset);
            delivered += 1;
        }
        delivered
    }

    /// Invoke the settle callback stored under `key`, if any.
    pub fn notify_settle(&mut self, key: &ElementId, offset: f64) -> bool {
        match self.settle.get_mut(key.as_str()) {
            Some(callback) => {
                callback(offset);
                true
            }
            None => false,
        }
    }

    fn mapping(&self, channel: SubscriptionChannel) -> &HashMap<ElementId, OffsetCallback> {
        match channel {
            SubscriptionChannel::Continuous => &self.continuous,
            SubscriptionChannel::Settle => &self.settle,
        }
    }

    fn mapping_mut(
        &mut self,
        channel: SubscriptionChannel,
    ) -> &mut HashMap<ElementId, OffsetCallback> {
        match channel {
            SubscriptionChannel::Continuous => &mut self.continuous,
            SubscriptionChannel::Settle => &mut self.settle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    fn recording(log: &Arc<Mutex<Vec<(String, f64)>>>, name: &str) -> OffsetCallback {
        let log = Arc::clone(log);
        let name = name.to_string();
        Box::new(move |offset| log.lock().unwrap().push((name.clone(), offset)))
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = SubscriberRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        assert!(!registry.insert(
            SubscriptionChannel::Continuous,
            "b".into(),
            recording(&log, "first")
        ));
        assert!(registry.insert(
            SubscriptionChannel::Continuous,
            "b".into(),
            recording(&log, "second")
        ));
        assert_eq!(registry.len(SubscriptionChannel::Continuous), 1);

        registry.broadcast_continuous(&"a".into(), 5.0);
        assert_eq!(*log.lock().unwrap(), vec![("second".to_string(), 5.0)]);
    }

    #[test]
    fn test_broadcast_skips_leader() {
        let mut registry = SubscriberRegistry::new();
        let hits = Arc::new(AtomicU64::new(0));
        for key in ["a", "b", "c"] {
            let hits = Arc::clone(&hits);
            registry.insert(
                SubscriptionChannel::Continuous,
                key.into(),
                Box::new(move |_| {
                    hits.fetch_add(1, Ordering::Relaxed);
                }),
            );
        }

        let delivered = registry.broadcast_continuous(&"b".into(), 1.0);
        assert_eq!(delivered, 2);
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_mappings_are_independent() {
        let mut registry = SubscriberRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.insert(SubscriptionChannel::Continuous, "a".into(), recording(&log, "c"));
        registry.insert(SubscriptionChannel::Settle, "a".into(), recording(&log, "s"));

        let settle = Subscription::new(SubscriptionChannel::Settle, "a".into());
        assert!(registry.remove(&settle));

        assert!(registry.contains(SubscriptionChannel::Continuous, "a"));
        assert!(!registry.contains(SubscriptionChannel::Settle, "a"));
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut registry = SubscriberRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.insert(SubscriptionChannel::Settle, "a".into(), recording(&log, "s"));

        let sub = Subscription::new(SubscriptionChannel::Settle, "a".into());
        assert!(registry.remove(&sub));
        assert!(!registry.remove(&sub));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_notify_settle_only_named_key() {
        let mut registry = SubscriberRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.insert(SubscriptionChannel::Settle, "a".into(), recording(&log, "a"));
        registry.insert(SubscriptionChannel::Settle, "b".into(), recording(&log, "b"));

        assert!(registry.notify_settle(&"a".into(), 10.0));
        assert!(!registry.notify_settle(&"z".into(), 10.0));
        assert_eq!(*log.lock().unwrap(), vec![("a".to_string(), 10.0)]);
    }
}
