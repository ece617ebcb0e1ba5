//! Scroll sync metrics
//!
//! The engine emits its own counters inline. This module adds whole-session
//! views: gauges mirroring [`EngineStats`] and per-gesture aggregation.

use contracts::EngineStats;
use metrics::{counter, gauge, histogram};

/// Mirror a stats snapshot into gauges.
///
/// Useful when the engine runs somewhere the inline counters are not scraped,
/// for example at the end of an offline simulation.
pub fn record_engine_stats(stats: &EngineStats) {
    gauge!("scroll_sync_engine_publishes_accepted").set(stats.publishes_accepted as f64);
    gauge!("scroll_sync_engine_publishes_ignored").set(stats.publishes_ignored as f64);
    gauge!("scroll_sync_engine_broadcasts").set(stats.broadcasts as f64);
    gauge!("scroll_sync_engine_offsets_delivered").set(stats.offsets_delivered as f64);
    gauge!("scroll_sync_engine_leader_releases").set(stats.leader_releases as f64);
    gauge!("scroll_sync_engine_stale_releases").set(stats.stale_releases as f64);
    gauge!("scroll_sync_engine_coalescing_ratio").set(stats.coalescing_ratio());
}

/// One finished gesture: scroll events until the leader is released
#[derive(Debug, Clone, Default)]
pub struct GestureSample {
    /// Counters accumulated during the gesture
    pub stats: EngineStats,
    /// Time from first scroll event to leader release (ms)
    pub duration_ms: f64,
    /// Largest |follower - expected| offset once settled
    pub max_drift: f64,
}

/// Record a finished gesture
pub fn record_gesture(sample: &GestureSample) {
    counter!("scroll_sync_gestures_total").increment(1);
    histogram!("scroll_sync_gesture_duration_ms").record(sample.duration_ms);
    histogram!("scroll_sync_gesture_coalescing_ratio").record(sample.stats.coalescing_ratio());
    histogram!("scroll_sync_gesture_drift").record(sample.max_drift);
}

/// Session aggregator
///
/// Folds gesture samples in memory so a summary can be printed at the end.
#[derive(Debug, Clone, Default)]
pub struct SyncMetricsAggregator {
    /// Gestures seen
    pub total_gestures: u64,

    /// Publishes accepted through the gate
    pub total_publishes: u64,

    /// Publishes from followers, ignored
    pub total_ignored: u64,

    /// Broadcasts that ran
    pub total_broadcasts: u64,

    /// Broadcasts superseded by a newer publish
    pub total_superseded: u64,

    /// Offsets written to followers
    pub total_delivered: u64,

    /// Releases that arrived after leadership moved
    pub stale_releases: u64,

    /// Accepted publishes per broadcast, per gesture
    pub coalescing_stats: RunningStats,

    /// Offsets delivered per gesture
    pub delivery_stats: RunningStats,

    /// Gesture duration (ms)
    pub duration_stats: RunningStats,

    /// Settled drift per gesture
    pub drift_stats: RunningStats,
}

impl SyncMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one gesture into the totals
    pub fn update(&mut self, sample: &GestureSample) {
        let stats = &sample.stats;
        self.total_gestures += 1;
        self.total_publishes += stats.publishes_accepted;
        self.total_ignored += stats.publishes_ignored;
        self.total_broadcasts += stats.broadcasts;
        self.total_superseded += stats.broadcasts_superseded;
        self.total_delivered += stats.offsets_delivered;
        self.stale_releases += stats.stale_releases;

        if stats.broadcasts > 0 {
            self.coalescing_stats.push(stats.coalescing_ratio());
        }
        self.delivery_stats.push(stats.offsets_delivered as f64);
        self.duration_stats.push(sample.duration_ms);
        self.drift_stats.push(sample.max_drift);
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        let published = self.total_publishes + self.total_ignored;
        MetricsSummary {
            total_gestures: self.total_gestures,
            total_publishes: self.total_publishes,
            total_ignored: self.total_ignored,
            total_broadcasts: self.total_broadcasts,
            total_superseded: self.total_superseded,
            total_delivered: self.total_delivered,
            stale_releases: self.stale_releases,
            ignored_rate: if published > 0 {
                self.total_ignored as f64 / published as f64 * 100.0
            } else {
                0.0
            },
            coalescing: StatsSummary::from(&self.coalescing_stats),
            deliveries_per_gesture: StatsSummary::from(&self.delivery_stats),
            gesture_duration_ms: StatsSummary::from(&self.duration_stats),
            drift: StatsSummary::from(&self.drift_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Session summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_gestures: u64,
    pub total_publishes: u64,
    pub total_ignored: u64,
    pub total_broadcasts: u64,
    pub total_superseded: u64,
    pub total_delivered: u64,
    pub stale_releases: u64,
    pub ignored_rate: f64,
    pub coalescing: StatsSummary,
    pub deliveries_per_gesture: StatsSummary,
    pub gesture_duration_ms: StatsSummary,
    pub drift: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Scroll Sync Summary ===")?;
        writeln!(f, "Gestures: {}", self.total_gestures)?;
        writeln!(f, "Publishes accepted: {}", self.total_publishes)?;
        writeln!(
            f,
            "Publishes ignored: {} ({:.2}%)",
            self.total_ignored, self.ignored_rate
        )?;
        writeln!(
            f,
            "Broadcasts: {} ({} superseded)",
            self.total_broadcasts, self.total_superseded
        )?;
        writeln!(f, "Offsets delivered: {}", self.total_delivered)?;
        if self.stale_releases > 0 {
            writeln!(f, "Stale releases: {}", self.stale_releases)?;
        }
        writeln!(f, "Coalescing (publishes/broadcast): {}", self.coalescing)?;
        writeln!(f, "Deliveries per gesture: {}", self.deliveries_per_gesture)?;
        writeln!(f, "Gesture duration (ms): {}", self.gesture_duration_ms)?;
        writeln!(f, "Settled drift: {}", self.drift)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = SyncMetricsAggregator::new();

        aggregator.update(&GestureSample {
            stats: EngineStats {
                publishes_accepted: 8,
                publishes_ignored: 2,
                broadcasts: 2,
                broadcasts_superseded: 6,
                offsets_delivered: 4,
                leader_releases: 1,
                ..Default::default()
            },
            duration_ms: 140.0,
            max_drift: 0.0,
        });

        assert_eq!(aggregator.total_gestures, 1);
        assert_eq!(aggregator.total_publishes, 8);
        assert_eq!(aggregator.total_superseded, 6);
        assert_eq!(aggregator.total_delivered, 4);
        assert!((aggregator.coalescing_stats.mean() - 4.0).abs() < 1e-10);

        let summary = aggregator.summary();
        assert!((summary.ignored_rate - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_gesture_without_broadcast_skips_coalescing() {
        let mut aggregator = SyncMetricsAggregator::new();
        aggregator.update(&GestureSample::default());

        assert_eq!(aggregator.coalescing_stats.count(), 0);
        assert_eq!(aggregator.delivery_stats.count(), 1);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_gestures: 3,
            total_publishes: 30,
            total_ignored: 10,
            total_broadcasts: 6,
            ignored_rate: 25.0,
            coalescing: StatsSummary {
                count: 3,
                min: 4.0,
                max: 6.0,
                mean: 5.0,
                std_dev: 1.0,
            },
            ..Default::default()
        };

        let output = format!("{}", summary);
        assert!(output.contains("Gestures: 3"));
        assert!(output.contains("25.00%"));
        assert!(output.contains("mean=5.000"));
        assert!(!output.contains("Stale releases"));
    }
}
