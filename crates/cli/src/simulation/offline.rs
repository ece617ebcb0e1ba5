//! Virtual-time driver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ScrollRegion, ScrollSyncConfig, SharedRegion};
use observability::{GestureSample, SyncMetricsAggregator};
use sync_engine::{ManualScheduler, MockRegion, SequentialIdGenerator, SyncEngine};
use tracing::{debug, instrument};

use super::{final_offsets, max_drift, millis, mock_regions, Scenario, SimulationReport};
use crate::error::{CliError, Result};

/// Frames allowed after the grace period before a gesture counts as stuck
const SETTLE_SLACK_FRAMES: u64 = 8;

/// Run the scenario on a [`ManualScheduler`].
///
/// Frames run every `frame_interval_ms` of virtual time, so results depend
/// only on the configuration and the scenario.
#[instrument(name = "simulate_offline", skip_all, fields(regions = scenario.regions))]
pub fn run_offline(config: &ScrollSyncConfig, scenario: &Scenario) -> Result<SimulationReport> {
    scenario.validate()?;

    let frame = config.engine.frame_interval();
    let mut engine = SyncEngine::with_id_generator(
        config.engine.clone(),
        ManualScheduler::new(),
        SequentialIdGenerator::default(),
    );

    let regions = mock_regions(scenario.regions);
    let shared: Vec<SharedRegion> = regions
        .iter()
        .map(|region| Arc::clone(region) as SharedRegion)
        .collect();

    let settled = Arc::new(AtomicU64::new(0));
    for region in &shared {
        engine.subscribe_continuous(&**region, writer(region, 1.0));
        let counter = Arc::clone(&settled);
        engine.subscribe_settle(
            &**region,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
    }

    let follower = scenario.follower_speed.map(|speed| {
        let region = Arc::new(MockRegion::anonymous());
        let target: SharedRegion = region.clone();
        engine.subscribe_continuous(&*target, writer(&target, speed));
        (region, speed)
    });

    let mut metrics = SyncMetricsAggregator::new();
    let mut since_frame = Duration::ZERO;

    for gesture in 0..scenario.gestures {
        let index = scenario.leader_index(gesture);
        let leader = &regions[index];
        let before = engine.stats();
        let started = engine.scheduler().now();
        let start = leader.scroll_left();
        let mut seen: Vec<u64> = regions.iter().map(|r| r.writes()).collect();

        for step in 1..=scenario.events {
            leader.scroll_to(scenario.target(gesture, start, step));
            engine.publish(&shared[index]);
            step_time(&mut engine, &mut since_frame, scenario.input_interval, frame);

            // Programmatic writes fire native scroll events on the followers
            for (i, region) in regions.iter().enumerate() {
                if i != index && region.writes() != seen[i] {
                    seen[i] = region.writes();
                    engine.publish(&shared[i]);
                }
            }
        }

        engine.publish_settle(&shared[index]);
        settle(&mut engine, config, &mut since_frame)?;

        let sample = GestureSample {
            stats: engine.stats().since(&before),
            duration_ms: millis(engine.scheduler().now() - started),
            max_drift: max_drift(
                &regions,
                index,
                follower.as_ref().map(|(region, speed)| (region.as_ref(), *speed)),
            ),
        };
        debug!(
            gesture,
            leader = index,
            broadcasts = sample.stats.broadcasts,
            drift = sample.max_drift,
            "Gesture settled"
        );
        observability::record_gesture(&sample);
        metrics.update(&sample);
    }

    let stats = engine.stats();
    Ok(SimulationReport {
        mode: "offline",
        regions: scenario.regions,
        gestures: scenario.gestures,
        duration_ms: millis(engine.scheduler().now()),
        stats,
        settle_notifications: settled.load(Ordering::Relaxed),
        max_drift: metrics.drift_stats.max(),
        final_offsets: final_offsets(&regions),
        metrics,
    })
}

fn writer(region: &SharedRegion, speed: f64) -> contracts::OffsetCallback {
    let target = Arc::clone(region);
    Box::new(move |offset| target.set_scroll_left(offset * speed))
}

/// Advance virtual time by `by`, running a frame each time a frame interval
/// has elapsed.
fn step_time(
    engine: &mut SyncEngine<ManualScheduler>,
    since_frame: &mut Duration,
    by: Duration,
    frame: Duration,
) {
    engine.advance(by);
    *since_frame += by;
    while *since_frame >= frame {
        *since_frame -= frame;
        engine.run_pending_frames();
    }
}

/// Run frames until the settle broadcast has happened and the gate is open.
fn settle(
    engine: &mut SyncEngine<ManualScheduler>,
    config: &ScrollSyncConfig,
    since_frame: &mut Duration,
) -> Result<()> {
    let frame = config.engine.frame_interval();
    let budget = config.engine.settle_grace_ms / config.engine.frame_interval_ms.max(1)
        + SETTLE_SLACK_FRAMES;

    for _ in 0..=budget {
        let remaining = frame.saturating_sub(*since_frame);
        step_time(engine, since_frame, remaining, frame);
        let snapshot = engine.snapshot();
        if snapshot.leader.is_none()
            && snapshot.pending_broadcast.is_none()
            && snapshot.pending_releases == 0
        {
            return Ok(());
        }
    }

    Err(CliError::Stalled {
        waited_ms: budget * config.engine.frame_interval_ms,
    })
}
