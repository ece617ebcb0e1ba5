//! Main sync engine implementation.

use std::collections::HashMap;

use contracts::{
    EngineConfig, EngineStats, ElementId, FrameToken, IdGenerator, OffsetCallback, Scheduler,
    ScrollRegion, SharedRegion, SubscriptionChannel, TimerToken,
};
use serde::Serialize;
use tracing::instrument;

use crate::identity::{IdentityResolver, UuidGenerator};
use crate::registry::{SubscriberRegistry, Subscription};

/// Kind of broadcast waiting for the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastKind {
    /// Offset fan-out only
    Scroll,
    /// Offset fan-out, then the leader's settle callback, then a delayed release
    Settle,
}

impl BroadcastKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Settle => "settle",
        }
    }
}

/// Region currently driving the gesture
struct Leader {
    key: ElementId,
    region: SharedRegion,
}

#[derive(Debug, Clone, Copy)]
struct PendingBroadcast {
    token: FrameToken,
    kind: BroadcastKind,
}

/// Point-in-time view of engine state
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    /// Current leader key, `None` when idle
    pub leader: Option<ElementId>,
    /// Continuous subscriber count
    pub continuous_subscribers: usize,
    /// Settle subscriber count
    pub settle_subscribers: usize,
    /// Broadcast waiting for a frame, if any
    pub pending_broadcast: Option<BroadcastKind>,
    /// Leader releases waiting for their grace period
    pub pending_releases: usize,
    /// Cumulative counters
    pub stats: EngineStats,
}

/// Zero and NaN mean "no update".
#[inline]
fn is_truthy_offset(offset: f64) -> bool {
    offset != 0.0 && !offset.is_nan()
}

/// Horizontal scroll synchronization engine
///
/// Owns the leader gate, the subscriber registry, the pending broadcast slot
/// and the outstanding release timers. Every method takes `&mut self`, so a
/// single owner serializes all publishes and subscription changes.
///
/// # Driving the engine
///
/// The engine asks its [`Scheduler`] for tokens and never runs anything on
/// its own. The host must hand frame tokens back through [`run_frame`] and
/// timer tokens through [`run_timer`].
///
/// [`run_frame`]: SyncEngine::run_frame
/// [`run_timer`]: SyncEngine::run_timer
pub struct SyncEngine<S: Scheduler> {
    config: EngineConfig,
    scheduler: S,
    identity: IdentityResolver,
    registry: SubscriberRegistry,
    leader: Option<Leader>,
    pending: Option<PendingBroadcast>,
    /// Release timer -> leader it was armed for
    releases: HashMap<TimerToken, Option<ElementId>>,
    stats: EngineStats,
}

impl<S: Scheduler> std::fmt::Debug for SyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("leader", &self.current_leader())
            .field("registry", &self.registry)
            .field("pending", &self.pending)
            .field("releases", &self.releases.len())
            .finish()
    }
}

impl<S: Scheduler> SyncEngine<S> {
    /// Create an engine that names anonymous regions with random UUIDs
    pub fn new(config: EngineConfig, scheduler: S) -> Self {
        Self::with_id_generator(config, scheduler, UuidGenerator)
    }

    /// Create an engine with a custom id generator
    pub fn with_id_generator(
        config: EngineConfig,
        scheduler: S,
        generator: impl IdGenerator + 'static,
    ) -> Self {
        let identity = IdentityResolver::new(config.id_attribute.clone(), Box::new(generator));
        Self {
            config,
            scheduler,
            identity,
            registry: SubscriberRegistry::new(),
            leader: None,
            pending: None,
            releases: HashMap::new(),
            stats: EngineStats::default(),
        }
    }

    /// Force the leader gate open.
    ///
    /// Pending broadcasts and release timers are left untouched.
    #[instrument(name = "sync_engine_reset", level = "debug", skip(self))]
    pub fn reset_current_element(&mut self) {
        if let Some(leader) = self.leader.take() {
            tracing::debug!(element = %leader.key, "leader reset");
        }
    }

    /// Receive the leader's offset on every broadcast while `region` follows.
    ///
    /// Replaces any continuous callback already stored for the region.
    pub fn subscribe_continuous(
        &mut self,
        region: &dyn ScrollRegion,
        callback: OffsetCallback,
    ) -> Subscription {
        self.subscribe(SubscriptionChannel::Continuous, region, callback)
    }

    /// Receive one notification per gesture while `region` leads.
    ///
    /// Replaces any settle callback already stored for the region.
    pub fn subscribe_settle(
        &mut self,
        region: &dyn ScrollRegion,
        callback: OffsetCallback,
    ) -> Subscription {
        self.subscribe(SubscriptionChannel::Settle, region, callback)
    }

    /// Remove the entry named by a subscription. Idempotent.
    pub fn cancel(&mut self, subscription: &Subscription) -> bool {
        let removed = self.registry.remove(subscription);
        if removed {
            tracing::trace!(
                element = %subscription.key(),
                channel = %subscription.channel(),
                "subscription cancelled"
            );
            self.record_subscriber_gauge(subscription.channel());
        }
        removed
    }

    /// Report scroll movement on `region`.
    ///
    /// Ignored unless the gate is open or `region` already leads.
    #[instrument(name = "sync_engine_publish", level = "trace", skip_all)]
    pub fn publish(&mut self, region: &SharedRegion) {
        self.publish_kind(region, BroadcastKind::Scroll);
    }

    /// Report that scrolling on `region` has stopped.
    ///
    /// Same gate as [`publish`](Self::publish).
    #[instrument(name = "sync_engine_publish_settle", level = "debug", skip_all)]
    pub fn publish_settle(&mut self, region: &SharedRegion) {
        self.publish_kind(region, BroadcastKind::Settle);
    }

    /// Run the frame callback behind `token`.
    ///
    /// Returns `false` for tokens that were superseded or already ran.
    pub fn run_frame(&mut self, token: FrameToken) -> bool {
        match self.pending {
            Some(pending) if pending.token == token => {
                self.pending = None;
                self.broadcast(pending.kind);
                true
            }
            _ => {
                tracing::trace!(token = token.0, "stale frame ignored");
                false
            }
        }
    }

    /// Run the release timer behind `token`.
    ///
    /// The gate is cleared whoever leads now, even if leadership moved to
    /// another region after this timer was armed.
    #[instrument(name = "sync_engine_release", level = "debug", skip_all, fields(token = token.0))]
    pub fn run_timer(&mut self, token: TimerToken) -> bool {
        let Some(armed_for) = self.releases.remove(&token) else {
            return false;
        };

        let current = self.leader.take().map(|leader| leader.key);
        let stale = current.is_some() && current != armed_for;

        self.stats.leader_releases += 1;
        if stale {
            self.stats.stale_releases += 1;
            tracing::debug!(
                released = ?current,
                armed_for = ?armed_for,
                "stale release revoked a newer leader"
            );
        } else {
            tracing::debug!(released = ?current, "leader released");
        }
        metrics::counter!(
            "scroll_sync_leader_releases_total",
            "stale" => if stale { "true" } else { "false" }
        )
        .increment(1);

        true
    }

    /// Current leader key, `None` when idle
    pub fn current_leader(&self) -> Option<&ElementId> {
        self.leader.as_ref().map(|leader| &leader.key)
    }

    /// Whether the leader gate is open
    pub fn is_idle(&self) -> bool {
        self.leader.is_none()
    }

    /// Resolve a region's key, attaching one if it has none
    pub fn resolve_id(&mut self, region: &dyn ScrollRegion) -> ElementId {
        self.identity.resolve(region)
    }

    /// Number of subscribers in a mapping
    pub fn subscriber_count(&self, channel: SubscriptionChannel) -> usize {
        self.registry.len(channel)
    }

    /// Cumulative counters
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Point-in-time view of engine state
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            leader: self.current_leader().cloned(),
            continuous_subscribers: self.registry.len(SubscriptionChannel::Continuous),
            settle_subscribers: self.registry.len(SubscriptionChannel::Settle),
            pending_broadcast: self.pending.map(|pending| pending.kind),
            pending_releases: self.releases.len(),
            stats: self.stats,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn subscribe(
        &mut self,
        channel: SubscriptionChannel,
        region: &dyn ScrollRegion,
        callback: OffsetCallback,
    ) -> Subscription {
        let key = self.identity.resolve(region);
        let replaced = self.registry.insert(channel, key.clone(), callback);
        tracing::trace!(element = %key, %channel, replaced, "subscribed");
        self.record_subscriber_gauge(channel);
        Subscription::new(channel, key)
    }

    fn publish_kind(&mut self, region: &SharedRegion, kind: BroadcastKind) {
        let key = self.identity.resolve(region.as_ref());

        if !self.try_lead(&key, region) {
            self.stats.publishes_ignored += 1;
            metrics::counter!(
                "scroll_sync_publish_total",
                "kind" => kind.as_str(),
                "outcome" => "ignored"
            )
            .increment(1);
            return;
        }

        self.stats.publishes_accepted += 1;
        metrics::counter!(
            "scroll_sync_publish_total",
            "kind" => kind.as_str(),
            "outcome" => "accepted"
        )
        .increment(1);

        self.schedule_broadcast(kind);
    }

    /// Apply the leader gate. Returns whether `key` may drive the gesture.
    fn try_lead(&mut self, key: &ElementId, region: &SharedRegion) -> bool {
        match &self.leader {
            Some(leader) if leader.key != *key => {
                tracing::trace!(element = %key, leader = %leader.key, "publish ignored");
                false
            }
            Some(_) => true,
            None => {
                tracing::debug!(element = %key, "leader elected");
                self.leader = Some(Leader {
                    key: key.clone(),
                    region: SharedRegion::clone(region),
                });
                true
            }
        }
    }

    fn schedule_broadcast(&mut self, kind: BroadcastKind) {
        if let Some(previous) = self.pending.take() {
            self.scheduler.cancel_frame(previous.token);
            self.stats.broadcasts_superseded += 1;
            metrics::counter!("scroll_sync_broadcasts_superseded_total").increment(1);
        }

        let token = self.scheduler.request_frame();
        self.pending = Some(PendingBroadcast { token, kind });
    }

    #[instrument(name = "sync_engine_broadcast", level = "trace", skip_all, fields(kind = kind.as_str()))]
    fn broadcast(&mut self, kind: BroadcastKind) {
        self.stats.broadcasts += 1;
        metrics::counter!("scroll_sync_broadcasts_total", "kind" => kind.as_str()).increment(1);

        let leader = self
            .leader
            .as_ref()
            .map(|leader| (leader.key.clone(), SharedRegion::clone(&leader.region)));

        if let Some((key, region)) = &leader {
            self.fan_out(key, region.scroll_left());
        }

        if kind == BroadcastKind::Settle {
            if let Some((key, region)) = &leader {
                if self.registry.notify_settle(key, region.scroll_left()) {
                    self.stats.settle_notifications += 1;
                    metrics::counter!("scroll_sync_settle_notifications_total").increment(1);
                }
            }

            let token = self.scheduler.set_timeout(self.config.settle_grace());
            self.releases
                .insert(token, leader.map(|(key, _)| key));
        }
    }

    fn fan_out(&mut self, leader: &ElementId, offset: f64) {
        if !is_truthy_offset(offset) {
            self.stats.offsets_skipped += 1;
            metrics::counter!("scroll_sync_offsets_skipped_total").increment(1);
            tracing::trace!(element = %leader, offset, "falsy offset, broadcast skipped");
            return;
        }

        let delivered = self.registry.broadcast_continuous(leader, offset) as u64;
        self.stats.offsets_delivered += delivered;
        metrics::counter!("scroll_sync_offsets_delivered_total").increment(delivered);
        tracing::trace!(element = %leader, offset, delivered, "offset broadcast");
    }

    fn record_subscriber_gauge(&self, channel: SubscriptionChannel) {
        metrics::gauge!("scroll_sync_subscribers", "channel" => channel.as_str())
            .set(self.registry.len(channel) as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SequentialIdGenerator;
    use crate::manual::ManualScheduler;
    use crate::mock::MockRegion;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const GRACE: Duration = Duration::from_millis(25);

    fn engine() -> SyncEngine<ManualScheduler> {
        SyncEngine::with_id_generator(
            EngineConfig::default(),
            ManualScheduler::new(),
            SequentialIdGenerator::new("gen"),
        )
    }

    fn region(id: &str, offset: f64) -> Arc<MockRegion> {
        let region = Arc::new(MockRegion::with_id(id));
        region.scroll_to(offset);
        region
    }

    fn shared(region: &Arc<MockRegion>) -> SharedRegion {
        Arc::clone(region) as SharedRegion
    }

    /// Continuous callback that writes the offset back, like a real follower
    fn follow(region: &Arc<MockRegion>) -> OffsetCallback {
        let target = Arc::clone(region);
        Box::new(move |offset| target.set_scroll_left(offset))
    }

    fn recorder() -> (Arc<Mutex<Vec<f64>>>, OffsetCallback) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, Box::new(move |offset| sink.lock().unwrap().push(offset)))
    }

    #[test]
    fn test_broadcast_reaches_follower() {
        let mut engine = engine();
        let leader = region("one", 77.0);
        let follower = region("two", 0.0);

        engine.subscribe_continuous(&*follower, follow(&follower));
        engine.publish(&shared(&leader));

        // Nothing happens before the frame
        assert_eq!(follower.writes(), 0);

        assert_eq!(engine.run_pending_frames(), 1);
        assert_eq!(follower.scroll_left(), 77.0);
    }

    #[test]
    fn test_source_never_receives_own_offset() {
        let mut engine = engine();
        let source = region("one", 77.0);
        let (calls, callback) = recorder();

        engine.subscribe_continuous(&*source, callback);
        engine.publish(&shared(&source));
        engine.run_pending_frames();

        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_follower_publish_ignored_while_leading() {
        let mut engine = engine();
        let leader = region("L", 77.0);
        let follower = region("F", 0.0);
        let (leader_calls, leader_cb) = recorder();

        engine.subscribe_continuous(&*leader, leader_cb);
        engine.subscribe_continuous(&*follower, follow(&follower));

        engine.publish(&shared(&leader));
        engine.run_pending_frames();
        assert_eq!(follower.scroll_left(), 77.0);

        // The follower's programmatic scroll echoes back as a publish
        engine.publish(&shared(&follower));
        assert_eq!(engine.run_pending_frames(), 0);

        assert!(leader_calls.lock().unwrap().is_empty());
        assert_eq!(engine.current_leader().map(|k| k.as_str()), Some("L"));
        assert_eq!(engine.stats().publishes_ignored, 1);
    }

    #[test]
    fn test_publishes_coalesce_into_one_broadcast() {
        let mut engine = engine();
        let leader = region("L", 0.0);
        let (calls, callback) = recorder();
        engine.subscribe_continuous(&*region("F", 0.0), callback);

        for offset in [10.0, 20.0, 30.0] {
            leader.scroll_to(offset);
            engine.publish(&shared(&leader));
        }
        assert_eq!(engine.scheduler().pending_frames(), 1);
        assert_eq!(engine.run_pending_frames(), 1);

        // Only the offset at broadcast time is delivered
        assert_eq!(*calls.lock().unwrap(), vec![30.0]);
        assert_eq!(engine.stats().broadcasts_superseded, 2);
        assert_eq!(engine.scheduler().cancelled_frames(), 2);
    }

    #[test]
    fn test_zero_offset_is_not_broadcast() {
        let mut engine = engine();
        let leader = region("L", 50.0);
        let follower = region("F", 0.0);
        engine.subscribe_continuous(&*follower, follow(&follower));

        engine.publish(&shared(&leader));
        engine.run_pending_frames();
        assert_eq!(follower.scroll_left(), 50.0);

        // Scrolling back to the origin does not reach the follower
        leader.scroll_to(0.0);
        engine.publish(&shared(&leader));
        engine.run_pending_frames();

        assert_eq!(follower.scroll_left(), 50.0);
        assert_eq!(follower.writes(), 1);
        assert_eq!(engine.stats().offsets_skipped, 1);
    }

    #[test]
    fn test_nan_offset_is_not_broadcast() {
        let mut engine = engine();
        let leader = region("L", f64::NAN);
        let (calls, callback) = recorder();
        engine.subscribe_continuous(&*region("F", 0.0), callback);

        engine.publish(&shared(&leader));
        assert_eq!(engine.run_pending_frames(), 1);

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(engine.stats().offsets_skipped, 1);
        assert_eq!(engine.stats().offsets_delivered, 0);
    }

    #[test]
    fn test_follower_settle_ignored_while_leading() {
        let mut engine = engine();
        let leader = region("L", 30.0);
        let follower = region("F", 0.0);
        let (settles, callback) = recorder();
        engine.subscribe_settle(&*follower, callback);

        engine.publish(&shared(&leader));
        engine.run_pending_frames();

        engine.publish_settle(&shared(&follower));
        assert_eq!(engine.scheduler().pending_frames(), 0);
        assert_eq!(engine.run_pending_frames(), 0);
        assert_eq!(engine.scheduler().pending_timers(), 0);

        assert!(settles.lock().unwrap().is_empty());
        assert_eq!(engine.current_leader().map(|k| k.as_str()), Some("L"));
        assert_eq!(engine.stats().publishes_ignored, 1);
    }

    #[test]
    fn test_settle_only_notifies_leader() {
        let mut engine = engine();
        let a = region("A", 10.0);
        let b = region("B", 10.0);
        let (end_a, cb_a) = recorder();
        let (end_b, cb_b) = recorder();

        engine.subscribe_settle(&*a, cb_a);
        engine.subscribe_settle(&*b, cb_b);

        engine.publish_settle(&shared(&a));
        engine.run_pending_frames();
        engine.advance(GRACE);

        assert_eq!(*end_a.lock().unwrap(), vec![10.0]);
        assert!(end_b.lock().unwrap().is_empty());
    }

    #[test]
    fn test_settle_notifies_even_at_origin() {
        let mut engine = engine();
        let a = region("A", 0.0);
        let (calls, callback) = recorder();
        engine.subscribe_settle(&*a, callback);

        engine.publish_settle(&shared(&a));
        engine.run_pending_frames();

        assert_eq!(*calls.lock().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_settle_fans_out_before_notifying() {
        let mut engine = engine();
        let leader = region("L", 42.0);
        let follower = region("F", 0.0);
        let order = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&order);
        engine.subscribe_continuous(
            &*follower,
            Box::new(move |_| log.lock().unwrap().push("offset")),
        );
        let log = Arc::clone(&order);
        engine.subscribe_settle(
            &*leader,
            Box::new(move |_| log.lock().unwrap().push("settle")),
        );

        engine.publish_settle(&shared(&leader));
        engine.run_pending_frames();

        assert_eq!(*order.lock().unwrap(), vec!["offset", "settle"]);
    }

    #[test]
    fn test_gate_reopens_after_grace_period() {
        let mut engine = engine();
        let a = region("A", 10.0);
        let b = region("B", 20.0);

        engine.publish_settle(&shared(&a));
        engine.run_pending_frames();

        engine.advance(GRACE - Duration::from_millis(1));
        assert!(!engine.is_idle());
        engine.publish(&shared(&b));
        assert_eq!(engine.stats().publishes_ignored, 1);

        assert_eq!(engine.advance(Duration::from_millis(1)), 1);
        assert!(engine.is_idle());

        engine.publish(&shared(&b));
        assert_eq!(engine.current_leader().map(|k| k.as_str()), Some("B"));
    }

    #[test]
    fn test_reset_opens_gate_immediately() {
        let mut engine = engine();
        let a = region("A", 10.0);
        let b = region("B", 20.0);

        engine.publish(&shared(&a));
        engine.reset_current_element();
        assert!(engine.is_idle());

        engine.publish(&shared(&b));
        assert_eq!(engine.current_leader().map(|k| k.as_str()), Some("B"));
    }

    #[test]
    fn test_reset_keeps_pending_broadcast() {
        let mut engine = engine();
        let a = region("A", 10.0);
        let follower = region("F", 0.0);
        engine.subscribe_continuous(&*follower, follow(&follower));

        engine.publish(&shared(&a));
        engine.reset_current_element();

        // The frame still runs, but with no leader there is nothing to send
        assert_eq!(engine.run_pending_frames(), 1);
        assert_eq!(follower.writes(), 0);
    }

    #[test]
    fn test_stale_release_revokes_new_leader() {
        let mut engine = engine();
        let a = region("A", 10.0);
        let b = region("B", 20.0);

        engine.publish_settle(&shared(&a));
        engine.run_pending_frames();

        // B takes over within A's grace window
        engine.reset_current_element();
        engine.publish(&shared(&b));
        assert_eq!(engine.current_leader().map(|k| k.as_str()), Some("B"));

        // A's old timer still releases the gate
        engine.advance(GRACE);
        assert!(engine.is_idle());
        assert_eq!(engine.stats().stale_releases, 1);
    }

    #[test]
    fn test_cancel_removes_subscription() {
        let mut engine = engine();
        let leader = region("L", 5.0);
        let follower = region("F", 0.0);

        let sub = engine.subscribe_continuous(&*follower, follow(&follower));
        assert!(engine.cancel(&sub));
        assert!(!engine.cancel(&sub));

        engine.publish(&shared(&leader));
        engine.run_pending_frames();
        assert_eq!(follower.writes(), 0);
    }

    #[test]
    fn test_settle_subscription_leaves_continuous_alone() {
        let mut engine = engine();
        let leader = region("L", 5.0);
        let follower = region("F", 0.0);

        engine.subscribe_continuous(&*follower, follow(&follower));
        let settle = engine.subscribe_settle(&*follower, Box::new(|_| {}));
        engine.cancel(&settle);

        assert_eq!(engine.subscriber_count(SubscriptionChannel::Continuous), 1);
        assert!(engine.is_idle());

        engine.publish(&shared(&leader));
        engine.run_pending_frames();
        assert_eq!(follower.scroll_left(), 5.0);
    }

    #[test]
    fn test_subscribe_while_broadcast_pending() {
        let mut engine = engine();
        let leader = region("L", 9.0);
        let late = region("late", 0.0);

        engine.publish(&shared(&leader));
        engine.subscribe_continuous(&*late, follow(&late));
        engine.run_pending_frames();

        assert_eq!(late.scroll_left(), 9.0);
    }

    #[test]
    fn test_anonymous_regions_get_ids() {
        let mut engine = engine();
        let leader: Arc<MockRegion> = Arc::new(MockRegion::anonymous());
        leader.scroll_to(3.0);
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);

        engine.subscribe_continuous(
            &MockRegion::anonymous(),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        engine.publish(&shared(&leader));
        engine.run_pending_frames();

        assert_eq!(engine.current_leader().map(|k| k.as_str()), Some("gen-1"));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_snapshot() {
        let mut engine = engine();
        let a = region("A", 1.0);
        engine.subscribe_settle(&*a, Box::new(|_| {}));
        engine.publish_settle(&shared(&a));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.leader.as_ref().map(|k| k.as_str()), Some("A"));
        assert_eq!(snapshot.pending_broadcast, Some(BroadcastKind::Settle));
        assert_eq!(snapshot.settle_subscribers, 1);

        engine.run_pending_frames();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.pending_broadcast, None);
        assert_eq!(snapshot.pending_releases, 1);
        assert_eq!(snapshot.stats.settle_notifications, 1);
    }
}
