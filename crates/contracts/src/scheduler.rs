//! Scheduler trait - frame and timer capabilities supplied by the host
//!
//! The engine never sleeps or spins. It asks the scheduler for tokens and the
//! host hands each token back to the engine when it becomes due:
//!
//! - a requested frame token goes to `SyncEngine::run_frame` before the next repaint
//! - a timer token goes to `SyncEngine::run_timer` once its delay has elapsed
//!
//! A cancelled frame token must never be handed back.

use std::time::Duration;

/// Token for a pending "before next repaint" callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// Token for a pending one-shot delay timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// Frame and timer scheduling capability.
pub trait Scheduler: Send {
    /// Request one callback before the next display repaint.
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a previously requested frame. Unknown tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);

    /// Request one callback after `delay`. Timers cannot be cancelled.
    fn set_timeout(&mut self, delay: Duration) -> TimerToken;
}
