//! Subscriber callback types

use serde::{Deserialize, Serialize};

/// Callback receiving the leader's horizontal offset.
///
/// Invoked synchronously on the engine's execution context; it must not block.
pub type OffsetCallback = Box<dyn FnMut(f64) + Send>;

/// Which subscriber mapping a subscription lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionChannel {
    /// Receives every coalesced broadcast while the region follows
    Continuous,
    /// Receives one notification per gesture, only while the region leads
    Settle,
}

impl SubscriptionChannel {
    /// Stable label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Settle => "settle",
        }
    }
}

impl std::fmt::Display for SubscriptionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
