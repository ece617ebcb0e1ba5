//! Scripted scroll gestures against in-memory regions.
//!
//! Two drivers share the same scenario: [`live`] runs the engine on its tokio
//! worker in real time, [`offline`] steps it on virtual time and is fully
//! deterministic.

mod live;
mod offline;
mod report;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use contracts::{ScrollRegion, ScrollSyncConfig};
use sync_engine::MockRegion;

use crate::cli::SimulateArgs;
use crate::error::{CliError, Result};

pub use live::run_live;
pub use offline::run_offline;
pub use report::{RegionOffset, SimulationReport};

/// What the simulated user does
#[derive(Debug, Clone)]
pub struct Scenario {
    pub regions: usize,
    pub gestures: u32,
    pub events: u32,
    pub input_interval: Duration,
    pub distance: f64,
    pub follower_speed: Option<f64>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            regions: 3,
            gestures: 2,
            events: 20,
            input_interval: Duration::from_millis(4),
            distance: 480.0,
            follower_speed: None,
        }
    }
}

impl From<&SimulateArgs> for Scenario {
    fn from(args: &SimulateArgs) -> Self {
        Self {
            regions: args.regions,
            gestures: args.gestures,
            events: args.events,
            input_interval: Duration::from_millis(args.input_interval_ms),
            distance: args.distance,
            follower_speed: args.follower_speed,
        }
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        if self.regions < 2 {
            return Err(CliError::invalid_scenario(format!(
                "at least 2 regions are needed, got {}",
                self.regions
            )));
        }
        if self.events == 0 {
            return Err(CliError::invalid_scenario("events must be > 0"));
        }
        if !self.distance.is_finite() || self.distance <= 0.0 {
            return Err(CliError::invalid_scenario(format!(
                "distance must be a positive number, got {}",
                self.distance
            )));
        }
        if let Some(speed) = self.follower_speed {
            if !speed.is_finite() {
                return Err(CliError::invalid_scenario("follower speed must be finite"));
            }
        }
        Ok(())
    }

    /// Region leading `gesture`; leadership rotates
    pub fn leader_index(&self, gesture: u32) -> usize {
        gesture as usize % self.regions
    }

    /// Leader offset after `step` (1-based) of `gesture`.
    ///
    /// Even gestures scroll right by the full distance, odd ones back by half,
    /// so the offset never returns to zero.
    pub fn target(&self, gesture: u32, start: f64, step: u32) -> f64 {
        let delta = if gesture % 2 == 0 {
            self.distance
        } else {
            -self.distance / 2.0
        };
        start + delta * f64::from(step) / f64::from(self.events)
    }
}

/// Load the configuration file, or defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<ScrollSyncConfig> {
    let Some(path) = path else {
        return Ok(ScrollSyncConfig::default());
    };
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}

fn mock_regions(count: usize) -> Vec<Arc<MockRegion>> {
    (0..count)
        .map(|i| Arc::new(MockRegion::with_id(&format!("pane-{i}"))))
        .collect()
}

/// Largest distance between any follower and where it should be
fn max_drift(
    regions: &[Arc<MockRegion>],
    leader: usize,
    follower: Option<(&MockRegion, f64)>,
) -> f64 {
    let expected = regions[leader].scroll_left();
    let drift = regions
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != leader)
        .map(|(_, region)| (region.scroll_left() - expected).abs())
        .fold(0.0, f64::max);

    match follower {
        Some((region, speed)) => drift.max((region.scroll_left() - expected * speed).abs()),
        None => drift,
    }
}

fn final_offsets(regions: &[Arc<MockRegion>]) -> Vec<RegionOffset> {
    regions
        .iter()
        .map(|region| RegionOffset {
            id: region.native_id().unwrap_or_default(),
            offset: region.scroll_left(),
            writes: region.writes(),
        })
        .collect()
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_never_return_to_zero() {
        let scenario = Scenario::default();
        let mut offset = 0.0;
        for gesture in 0..6 {
            for step in 1..=scenario.events {
                let next = scenario.target(gesture, offset, step);
                assert!(next > 0.0);
                if step == scenario.events {
                    offset = next;
                }
            }
        }
        assert!((offset - 720.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_single_region() {
        let scenario = Scenario {
            regions: 1,
            ..Default::default()
        };
        assert!(matches!(
            scenario.validate(),
            Err(CliError::InvalidScenario { .. })
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_config(Some(Path::new("/nonexistent/scroll-sync.toml"))).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scroll-sync.toml");
        std::fs::write(&path, "[engine]\nsettle_grace_ms = 50\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.engine.settle_grace_ms, 50);
        assert_eq!(load_config(None).unwrap().engine.settle_grace_ms, 25);
    }

    #[test]
    fn test_drift_accounts_for_follower_speed() {
        let regions = mock_regions(2);
        regions[0].scroll_to(100.0);
        regions[1].set_scroll_left(100.0);
        let parallax = MockRegion::anonymous();
        parallax.set_scroll_left(50.0);

        assert_eq!(max_drift(&regions, 0, Some((&parallax, 0.5))), 0.0);
        assert_eq!(max_drift(&regions, 0, Some((&parallax, 1.0))), 50.0);
    }
}
