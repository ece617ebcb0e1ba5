//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration failed to load
    #[error("Failed to load configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Simulation parameters make no sense
    #[error("Invalid scenario: {message}")]
    InvalidScenario { message: String },

    /// Engine handle failure
    #[error("Sync engine error: {0}")]
    Engine(#[from] sync_engine::EngineError),

    /// Leader gate never reopened after a gesture
    #[error("Gesture did not settle within {waited_ms} ms")]
    Stalled { waited_ms: u64 },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_scenario(message: impl Into<String>) -> Self {
        Self::InvalidScenario {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
