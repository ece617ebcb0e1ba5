//! Scroll sync configuration contracts shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::QUALIFIED_NAME;

/// Default grace period between a settle broadcast and leader release
pub const DEFAULT_SETTLE_GRACE_MS: u64 = 25;

/// Default display refresh cadence (~60 Hz)
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ScrollSyncConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Engine settings
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Logging and metrics settings
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

/// Sync engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Delay after a settle broadcast before the leader gate opens again
    #[serde(default = "default_settle_grace_ms")]
    #[validate(range(min = 1, message = "settle_grace_ms must be > 0"))]
    pub settle_grace_ms: u64,

    /// Frame cadence used by the async runtime
    #[serde(default = "default_frame_interval_ms")]
    #[validate(range(min = 1, message = "frame_interval_ms must be > 0"))]
    pub frame_interval_ms: u64,

    /// Attribute generated identifiers are attached under
    #[serde(default = "default_id_attribute")]
    #[validate(custom(function = "validate_attribute_name"))]
    pub id_attribute: String,

    /// Bounded command queue of the engine actor
    #[serde(default = "default_command_queue_capacity")]
    #[validate(range(min = 1, message = "command_queue_capacity must be > 0"))]
    pub command_queue_capacity: usize,
}

impl EngineConfig {
    /// Grace period as a `Duration`
    pub fn settle_grace(&self) -> Duration {
        Duration::from_millis(self.settle_grace_ms)
    }

    /// Frame interval as a `Duration`
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_grace_ms: DEFAULT_SETTLE_GRACE_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            id_attribute: default_id_attribute(),
            command_queue_capacity: default_command_queue_capacity(),
        }
    }
}

fn default_settle_grace_ms() -> u64 {
    DEFAULT_SETTLE_GRACE_MS
}

fn default_frame_interval_ms() -> u64 {
    DEFAULT_FRAME_INTERVAL_MS
}

fn default_id_attribute() -> String {
    QUALIFIED_NAME.to_string()
}

fn default_command_queue_capacity() -> usize {
    1024
}

fn validate_attribute_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        let mut err = ValidationError::new("empty_attribute");
        err.message = Some("id_attribute cannot be empty".into());
        return Err(err);
    }
    if name.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("attribute_whitespace");
        err.message = Some("id_attribute cannot contain whitespace".into());
        return Err(err);
    }
    Ok(())
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelemetryConfig {
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Default log level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1, message = "log_level cannot be empty"))]
    pub log_level: String,

    /// Prometheus port (None = disabled)
    #[serde(default)]
    #[validate(range(min = 1, message = "metrics_port must be > 0"))]
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScrollSyncConfig::default();
        assert_eq!(config.engine.settle_grace_ms, 25);
        assert_eq!(config.engine.frame_interval_ms, 16);
        assert_eq!(config.engine.id_attribute, "data-minimal-scroll-sync-id");
        assert_eq!(config.engine.settle_grace(), Duration::from_millis(25));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_grace_rejected() {
        let mut config = ScrollSyncConfig::default();
        config.engine.settle_grace_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_attribute_with_whitespace_rejected() {
        let mut config = ScrollSyncConfig::default();
        config.engine.id_attribute = "data sync".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: ScrollSyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.engine.command_queue_capacity, 1024);
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
        assert_eq!(config.telemetry.metrics_port, None);
    }
}
