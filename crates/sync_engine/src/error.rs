//! Engine handle error types

use thiserror::Error;

/// Errors surfaced by [`EngineHandle`](crate::EngineHandle)
#[derive(Debug, Error)]
pub enum EngineError {
    /// Worker task has exited
    #[error("sync engine worker stopped")]
    Stopped,

    /// Command queue full - command dropped
    #[error("sync engine queue full (capacity {capacity}), {command} dropped")]
    QueueFull {
        capacity: usize,
        command: &'static str,
    },

    /// A process-wide engine is already installed
    #[error("a global sync engine is already installed")]
    GlobalAlreadyInstalled,

    /// Contract error
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}
