//! EngineStats - cumulative engine counters
//!
//! Snapshot of what the sync engine has done since construction.

use serde::{Deserialize, Serialize};

/// Cumulative engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Publishes accepted through the leader gate
    pub publishes_accepted: u64,

    /// Publishes from non-leader regions, dropped silently
    pub publishes_ignored: u64,

    /// Broadcasts that actually ran on a frame
    pub broadcasts: u64,

    /// Pending broadcasts cancelled by a newer publish
    pub broadcasts_superseded: u64,

    /// Offsets handed to continuous subscribers
    pub offsets_delivered: u64,

    /// Broadcast passes skipped because the leader offset was zero
    pub offsets_skipped: u64,

    /// Settle callbacks invoked
    pub settle_notifications: u64,

    /// Grace-period releases of the leader gate
    pub leader_releases: u64,

    /// Releases that fired after leadership had moved to another region
    pub stale_releases: u64,
}

impl EngineStats {
    /// Publishes seen in total
    pub fn publishes_total(&self) -> u64 {
        self.publishes_accepted + self.publishes_ignored
    }

    /// Average accepted publishes per executed broadcast
    pub fn coalescing_ratio(&self) -> f64 {
        if self.broadcasts == 0 {
            0.0
        } else {
            self.publishes_accepted as f64 / self.broadcasts as f64
        }
    }

    /// Counters accumulated since `earlier`
    pub fn since(&self, earlier: &EngineStats) -> EngineStats {
        EngineStats {
            publishes_accepted: self.publishes_accepted.saturating_sub(earlier.publishes_accepted),
            publishes_ignored: self.publishes_ignored.saturating_sub(earlier.publishes_ignored),
            broadcasts: self.broadcasts.saturating_sub(earlier.broadcasts),
            broadcasts_superseded: self
                .broadcasts_superseded
                .saturating_sub(earlier.broadcasts_superseded),
            offsets_delivered: self.offsets_delivered.saturating_sub(earlier.offsets_delivered),
            offsets_skipped: self.offsets_skipped.saturating_sub(earlier.offsets_skipped),
            settle_notifications: self
                .settle_notifications
                .saturating_sub(earlier.settle_notifications),
            leader_releases: self.leader_releases.saturating_sub(earlier.leader_releases),
            stale_releases: self.stale_releases.saturating_sub(earlier.stale_releases),
        }
    }
}
