//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - configuration file -> engine wiring
//! - full gestures through the tokio worker
//! - gate edge cases on virtual time

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ScrollRegion, ScrollSyncConfig, QUALIFIED_NAME};
    use std::sync::Arc;
    use sync_engine::{ManualScheduler, MockRegion, SequentialIdGenerator, SyncEngine};

    #[test]
    fn test_default_config_round_trips() {
        let toml = ConfigLoader::to_toml(&ScrollSyncConfig::default()).unwrap();
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.engine.id_attribute, QUALIFIED_NAME);
        assert_eq!(config.engine.settle_grace_ms, 25);
    }

    #[test]
    fn test_configured_attribute_reaches_regions() {
        let config = ConfigLoader::load_from_str(
            "[engine]\nid_attribute = \"data-pane\"\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        let mut engine = SyncEngine::with_id_generator(
            config.engine,
            ManualScheduler::new(),
            SequentialIdGenerator::new("pane"),
        );

        let region = Arc::new(MockRegion::anonymous());
        let key = engine.resolve_id(&*region);

        assert_eq!(key.as_str(), "pane-0");
        assert_eq!(region.attribute("data-pane").as_deref(), Some("pane-0"));
        assert_eq!(region.attribute(QUALIFIED_NAME), None);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{EngineConfig, ScrollRegion, SharedRegion};
    use sync_engine::{
        EngineError, EngineHandle, EngineRuntime, FollowerBinding, ManualScheduler, MockRegion,
        ScrollSyncBinding, SequentialIdGenerator, SettleBinding, SyncEngine,
    };
    use tokio::time::sleep;

    fn fast_config() -> EngineConfig {
        EngineConfig {
            frame_interval_ms: 5,
            settle_grace_ms: 15,
            ..Default::default()
        }
    }

    async fn wait_idle(handle: &EngineHandle) {
        for _ in 0..200 {
            let snapshot = handle.snapshot().await.unwrap();
            if snapshot.leader.is_none() && snapshot.pending_releases == 0 {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("engine never went idle");
    }

    /// Header, body and a half-speed background follow one another through
    /// two gestures with different leaders.
    #[tokio::test]
    async fn test_e2e_two_gestures() {
        let runtime = EngineRuntime::spawn(fast_config());
        let handle = runtime.handle();

        let header = Arc::new(MockRegion::with_id("header"));
        let body = Arc::new(MockRegion::with_id("body"));
        let background = Arc::new(MockRegion::anonymous());

        let header_binding = ScrollSyncBinding::attach(&handle, header.clone()).await.unwrap();
        let body_binding = ScrollSyncBinding::attach(&handle, body.clone()).await.unwrap();
        let _background = FollowerBinding::attach(&handle, background.clone(), 0.5)
            .await
            .unwrap();

        let settles = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&settles);
        let _settle = SettleBinding::attach(&handle, body.clone(), move |offset| {
            sink.lock().unwrap().push(offset)
        })
        .await
        .unwrap();

        // Gesture 1: header leads
        for offset in [20.0, 60.0, 100.0] {
            header.scroll_to(offset);
            header_binding.on_scroll().unwrap();
            sleep(Duration::from_millis(2)).await;
        }
        // Echo from the follower is rejected while header leads
        body_binding.on_scroll().unwrap();
        header_binding.on_scroll_end().unwrap();
        wait_idle(&handle).await;

        assert_eq!(body.scroll_left(), 100.0);
        assert_eq!(background.scroll_left(), 50.0);
        assert!(settles.lock().unwrap().is_empty());

        // Gesture 2: body leads
        body.scroll_to(300.0);
        body_binding.on_scroll().unwrap();
        body_binding.on_scroll_end().unwrap();
        wait_idle(&handle).await;

        assert_eq!(header.scroll_left(), 300.0);
        assert_eq!(background.scroll_left(), 150.0);
        assert_eq!(*settles.lock().unwrap(), vec![300.0]);

        let stats = runtime.shutdown().await.unwrap();
        assert_eq!(stats.leader_releases, 2);
        assert!(stats.publishes_ignored >= 1);
        assert_eq!(stats.settle_notifications, 1);
    }

    /// A burst of publishes inside one frame produces one broadcast.
    #[tokio::test]
    async fn test_e2e_burst_is_coalesced() {
        let runtime = EngineRuntime::spawn(EngineConfig {
            frame_interval_ms: 50,
            ..Default::default()
        });
        let handle = runtime.handle();

        let leader = Arc::new(MockRegion::with_id("leader"));
        let follower = Arc::new(MockRegion::with_id("follower"));
        let deliveries = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&deliveries);
        let target = Arc::clone(&follower);
        let _cancel = handle
            .subscribe_continuous(
                follower.clone(),
                Box::new(move |offset| {
                    counter.fetch_add(1, Ordering::Relaxed);
                    target.set_scroll_left(offset);
                }),
            )
            .await
            .unwrap();

        // Let the first (immediate) tick pass so the burst lands inside one frame
        handle.snapshot().await.unwrap();
        sleep(Duration::from_millis(5)).await;

        for offset in 1..=10 {
            leader.scroll_to(f64::from(offset) * 10.0);
            handle.publish(leader.clone()).unwrap();
        }
        sleep(Duration::from_millis(120)).await;

        assert_eq!(deliveries.load(Ordering::Relaxed), 1);
        assert_eq!(follower.scroll_left(), 100.0);

        let stats = runtime.shutdown().await.unwrap();
        assert_eq!(stats.publishes_accepted, 10);
        assert_eq!(stats.broadcasts, 1);
        assert_eq!(stats.broadcasts_superseded, 9);
    }

    /// A full queue rejects publishes instead of blocking the caller.
    #[tokio::test]
    async fn test_e2e_queue_full() {
        let runtime = EngineRuntime::spawn(EngineConfig {
            command_queue_capacity: 1,
            ..Default::default()
        });
        let handle = runtime.handle();
        let region: SharedRegion = Arc::new(MockRegion::with_id("a"));

        // The worker cannot drain while this test task holds the only thread
        let results: Vec<_> = (0..8).map(|_| handle.publish(region.clone())).collect();

        assert!(results.iter().any(|r| r.is_ok()));
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(EngineError::QueueFull { capacity: 1, .. }))));

        runtime.shutdown().await.unwrap();
    }

    /// A settle sent into a full queue still ends the gesture.
    #[tokio::test]
    async fn test_e2e_settle_survives_full_queue() {
        let runtime = EngineRuntime::spawn(EngineConfig {
            command_queue_capacity: 1,
            frame_interval_ms: 5,
            settle_grace_ms: 15,
            ..Default::default()
        });
        let handle = runtime.handle();
        let a: SharedRegion = Arc::new(MockRegion::with_id("a"));
        let b: SharedRegion = Arc::new(MockRegion::with_id("b"));

        handle.publish(a.clone()).unwrap();
        handle.publish_settle(a.clone()).unwrap();
        wait_idle(&handle).await;

        handle.publish(b.clone()).unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.leader.as_ref().map(|k| k.as_str()), Some("b"));

        let stats = runtime.shutdown().await.unwrap();
        assert_eq!(stats.leader_releases, 1);
        assert_eq!(stats.publishes_ignored, 0);
    }

    #[tokio::test]
    async fn test_global_engine() {
        assert!(EngineHandle::global().is_none());

        let runtime = EngineRuntime::spawn(fast_config());
        runtime.handle().install_global().unwrap();
        assert!(matches!(
            runtime.handle().install_global(),
            Err(EngineError::GlobalAlreadyInstalled)
        ));

        let global = EngineHandle::global().unwrap();
        let snapshot = global.snapshot().await.unwrap();
        assert!(snapshot.leader.is_none());

        runtime.shutdown().await.unwrap();
        assert!(global.is_closed());
    }

    /// A release armed by an earlier gesture revokes a leader elected after a
    /// manual reset.
    #[test]
    fn test_stale_release_revokes_new_leader() {
        let mut engine = SyncEngine::with_id_generator(
            EngineConfig::default(),
            ManualScheduler::new(),
            SequentialIdGenerator::default(),
        );
        let a: SharedRegion = Arc::new(MockRegion::with_id("a"));
        let b: SharedRegion = Arc::new(MockRegion::with_id("b"));

        engine.publish_settle(&a);
        engine.run_pending_frames();
        engine.reset_current_element();
        engine.publish(&b);
        assert_eq!(engine.current_leader().map(|k| k.as_str()), Some("b"));

        engine.advance(Duration::from_millis(25));

        assert!(engine.is_idle());
        assert_eq!(engine.stats().stale_releases, 1);
    }
}
