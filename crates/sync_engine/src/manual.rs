//! Deterministic scheduler driven by hand.
//!
//! Frames run only when the driver asks for them and time only moves when the
//! driver advances it. Used by unit tests and the offline simulation.

use std::collections::BTreeSet;
use std::time::Duration;

use contracts::{FrameToken, Scheduler, TimerToken};

use crate::SyncEngine;

/// Virtual-time frame and timer scheduler
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_token: u64,
    now: Duration,
    frames: BTreeSet<FrameToken>,
    /// (deadline, token), kept sorted
    timers: Vec<(Duration, TimerToken)>,
    cancelled_frames: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Frames requested and not yet taken or cancelled
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Timers not yet due
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Frames cancelled since construction
    pub fn cancelled_frames(&self) -> u64 {
        self.cancelled_frames
    }

    /// Take every pending frame token in request order.
    pub fn take_frames(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.frames).into_iter().collect()
    }

    /// Move virtual time forward and take the timers that became due,
    /// earliest deadline first.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerToken> {
        self.now += by;
        let due = self.timers.partition_point(|(deadline, _)| *deadline <= self.now);
        self.timers.drain(..due).map(|(_, token)| token).collect()
    }

    fn next(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next());
        self.frames.insert(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.frames.remove(&token) {
            self.cancelled_frames += 1;
        }
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerToken {
        let token = TimerToken(self.next());
        let deadline = self.now + delay;
        let at = self
            .timers
            .partition_point(|(existing, _)| *existing <= deadline);
        self.timers.insert(at, (deadline, token));
        token
    }
}

impl SyncEngine<ManualScheduler> {
    /// Run every frame callback requested so far.
    ///
    /// Returns the number of broadcasts that executed.
    pub fn run_pending_frames(&mut self) -> usize {
        let tokens = self.scheduler_mut().take_frames();
        tokens
            .into_iter()
            .filter(|token| self.run_frame(*token))
            .count()
    }

    /// Advance virtual time, firing every timer that becomes due.
    ///
    /// Returns the number of timers fired.
    pub fn advance(&mut self, by: Duration) -> usize {
        let tokens = self.scheduler_mut().advance(by);
        tokens
            .into_iter()
            .filter(|token| self.run_timer(*token))
            .count()
    }
}
