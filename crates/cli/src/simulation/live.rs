//! Real-time driver on the engine's tokio worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{EngineConfig, ScrollRegion, ScrollSyncConfig};
use observability::{GestureSample, SyncMetricsAggregator};
use sync_engine::{
    EngineError, EngineHandle, EngineRuntime, FollowerBinding, MockRegion, ScrollSyncBinding,
    SettleBinding,
};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use super::{final_offsets, max_drift, millis, mock_regions, Scenario, SimulationReport};
use crate::error::{CliError, Result};

/// Run the scenario against a freshly spawned engine worker.
#[instrument(name = "simulate_live", skip_all, fields(regions = scenario.regions))]
pub async fn run_live(config: &ScrollSyncConfig, scenario: &Scenario) -> Result<SimulationReport> {
    scenario.validate()?;

    let runtime = EngineRuntime::spawn(config.engine.clone());
    let result = drive(&runtime.handle(), &config.engine, scenario).await;
    let stats = runtime.shutdown().await?;

    let mut report = result?;
    report.stats = stats;
    info!(
        broadcasts = stats.broadcasts,
        delivered = stats.offsets_delivered,
        "Live simulation finished"
    );
    Ok(report)
}

async fn drive(
    handle: &EngineHandle,
    engine: &EngineConfig,
    scenario: &Scenario,
) -> Result<SimulationReport> {
    let regions = mock_regions(scenario.regions);

    let mut bindings = Vec::with_capacity(regions.len());
    for region in &regions {
        bindings.push(ScrollSyncBinding::attach(handle, region.clone()).await?);
    }

    let settled = Arc::new(AtomicU64::new(0));
    let mut settle_bindings = Vec::with_capacity(regions.len());
    for region in &regions {
        let counter = Arc::clone(&settled);
        settle_bindings.push(
            SettleBinding::attach(handle, region.clone(), move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .await?,
        );
    }

    let follower = match scenario.follower_speed {
        Some(speed) => {
            let region = Arc::new(MockRegion::anonymous());
            let binding = FollowerBinding::attach(handle, region.clone(), speed).await?;
            Some((region, binding))
        }
        None => None,
    };

    let mut metrics = SyncMetricsAggregator::new();
    let started = Instant::now();

    for gesture in 0..scenario.gestures {
        let index = scenario.leader_index(gesture);
        let leader = &regions[index];
        let before = handle.snapshot().await?.stats;
        let gesture_started = Instant::now();
        let start = leader.scroll_left();
        let mut seen: Vec<u64> = regions.iter().map(|r| r.writes()).collect();

        for step in 1..=scenario.events {
            leader.scroll_to(scenario.target(gesture, start, step));
            tolerate_full(bindings[index].on_scroll())?;
            sleep(scenario.input_interval).await;

            // Programmatic writes fire native scroll events on the followers
            for (i, region) in regions.iter().enumerate() {
                if i != index && region.writes() != seen[i] {
                    seen[i] = region.writes();
                    tolerate_full(bindings[i].on_scroll())?;
                }
            }
        }

        bindings[index].on_scroll_end()?;
        wait_for_release(handle, engine).await?;

        let sample = GestureSample {
            stats: handle.snapshot().await?.stats.since(&before),
            duration_ms: millis(gesture_started.elapsed()),
            max_drift: max_drift(
                &regions,
                index,
                follower
                    .as_ref()
                    .map(|(region, binding)| (region.as_ref(), binding.scroll_speed())),
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

    let stats = handle.snapshot().await?.stats;
    Ok(SimulationReport {
        mode: "live",
        regions: scenario.regions,
        gestures: scenario.gestures,
        duration_ms: millis(started.elapsed()),
        stats,
        settle_notifications: settled.load(Ordering::Relaxed),
        max_drift: metrics.drift_stats.max(),
        final_offsets: final_offsets(&regions),
        metrics,
    })
}

/// A dropped scroll event is covered by the next one.
fn tolerate_full(result: std::result::Result<(), EngineError>) -> Result<()> {
    match result {
        Ok(()) | Err(EngineError::QueueFull { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Poll until the settle broadcast has run and the leader gate is open again.
async fn wait_for_release(handle: &EngineHandle, engine: &EngineConfig) -> Result<()> {
    let poll = engine.frame_interval();
    let limit = engine.settle_grace() + poll * 20 + Duration::from_secs(1);
    let deadline = Instant::now() + limit;

    loop {
        let snapshot = handle.snapshot().await?;
        if snapshot.leader.is_none()
            && snapshot.pending_broadcast.is_none()
            && snapshot.pending_releases == 0
        {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(CliError::Stalled {
                waited_ms: limit.as_millis() as u64,
            });
        }
        sleep(poll).await;
    }
}
