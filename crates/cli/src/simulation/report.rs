//! Simulation results.

use contracts::EngineStats;
use observability::SyncMetricsAggregator;
use serde::Serialize;

/// Where a region ended up
#[derive(Debug, Clone, Serialize)]
pub struct RegionOffset {
    pub id: String,
    pub offset: f64,
    /// Programmatic writes received
    pub writes: u64,
}

/// Result of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// "live" or "offline"
    pub mode: &'static str,
    pub regions: usize,
    pub gestures: u32,
    /// Wall-clock or virtual duration (ms)
    pub duration_ms: f64,
    pub stats: EngineStats,
    /// Settle callbacks received across all regions
    pub settle_notifications: u64,
    /// Worst settled drift over all gestures
    pub max_drift: f64,
    pub final_offsets: Vec<RegionOffset>,
    #[serde(skip)]
    pub metrics: SyncMetricsAggregator,
}

impl SimulationReport {
    /// Every follower matched its leader once each gesture settled
    pub fn is_synchronized(&self) -> bool {
        self.max_drift < 1e-9
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Scroll Sync Simulation                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Mode: {}", self.mode);
        println!("   ├─ Duration: {:.2} ms", self.duration_ms);
        println!("   ├─ Regions: {}", self.regions);
        println!("   ├─ Gestures: {}", self.gestures);
        println!(
            "   └─ Synchronized: {}",
            if self.is_synchronized() { "yes" } else { "NO" }
        );

        let stats = &self.stats;
        println!("\n📈 Engine");
        println!(
            "   ├─ Publishes: {} accepted, {} ignored",
            stats.publishes_accepted, stats.publishes_ignored
        );
        println!(
            "   ├─ Broadcasts: {} ({} superseded, {:.2} publishes/broadcast)",
            stats.broadcasts,
            stats.broadcasts_superseded,
            stats.coalescing_ratio()
        );
        println!("   ├─ Offsets delivered: {}", stats.offsets_delivered);
        println!("   ├─ Settle notifications: {}", self.settle_notifications);
        println!(
            "   └─ Leader releases: {} ({} stale)",
            stats.leader_releases, stats.stale_releases
        );

        println!("\n📍 Final offsets");
        for (i, region) in self.final_offsets.iter().enumerate() {
            let prefix = if i == self.final_offsets.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            println!(
                "   {} {}: {:.1} ({} writes)",
                prefix, region.id, region.offset, region.writes
            );
        }

        println!("\n{}", self.metrics.summary());
    }
}
