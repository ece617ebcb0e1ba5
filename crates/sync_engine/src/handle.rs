//! EngineHandle - runs a sync engine on its own worker task
//!
//! The engine is owned by exactly one tokio task. Every caller talks to it
//! through a command queue, so publishes and subscription changes are applied
//! one at a time in arrival order and never interleave.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use contracts::{
    EngineConfig, EngineStats, FrameToken, IdGenerator, OffsetCallback, Scheduler, SharedRegion,
    SubscriptionChannel, TimerToken,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, instrument, warn};

use crate::engine::{EngineSnapshot, SyncEngine};
use crate::error::EngineError;
use crate::identity::UuidGenerator;
use crate::registry::Subscription;

static GLOBAL: OnceLock<EngineHandle> = OnceLock::new();

/// `tokio::time::interval` rejects a zero period
const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

enum Command {
    Publish(SharedRegion),
    PublishSettle(SharedRegion),
    Reset,
    Subscribe {
        channel: SubscriptionChannel,
        region: SharedRegion,
        callback: OffsetCallback,
        reply: oneshot::Sender<Subscription>,
    },
    Cancel(Subscription),
    Snapshot(oneshot::Sender<EngineSnapshot>),
    Shutdown,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Publish(_) => "publish",
            Self::PublishSettle(_) => "publish_settle",
            Self::Reset => "reset",
            Self::Subscribe { .. } => "subscribe",
            Self::Cancel(_) => "cancel",
            Self::Snapshot(_) => "snapshot",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Scheduler backed by the worker's frame ticker and tokio timers
///
/// Frames are collected here and run by the worker on its next tick. Each
/// timer is a detached task that posts its token back to the worker.
pub struct TokioScheduler {
    next_token: u64,
    frames: BTreeSet<FrameToken>,
    timer_tx: mpsc::UnboundedSender<TimerToken>,
}

impl TokioScheduler {
    fn new(timer_tx: mpsc::UnboundedSender<TimerToken>) -> Self {
        Self {
            next_token: 0,
            frames: BTreeSet::new(),
            timer_tx,
        }
    }

    fn take_frames(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.frames).into_iter().collect()
    }

    fn next(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }
}

impl Scheduler for TokioScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next());
        self.frames.insert(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.frames.remove(&token);
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerToken {
        let token = TimerToken(self.next());
        let tx = self.timer_tx.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            // Worker gone means nobody is left to release
            let _ = tx.send(token);
        });
        token
    }
}

/// Running engine worker
///
/// Owns the worker task. Hand out [`EngineHandle`]s to collaborators and call
/// [`shutdown`](EngineRuntime::shutdown) when done.
pub struct EngineRuntime {
    handle: EngineHandle,
    worker: JoinHandle<EngineStats>,
}

impl EngineRuntime {
    /// Spawn a worker that names anonymous regions with random UUIDs.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: EngineConfig) -> Self {
        Self::spawn_with_id_generator(config, UuidGenerator)
    }

    /// Spawn a worker with a custom id generator.
    pub fn spawn_with_id_generator(
        config: EngineConfig,
        generator: impl IdGenerator + 'static,
    ) -> Self {
        let capacity = config.command_queue_capacity.max(1);
        let frame_interval = config.frame_interval().max(MIN_FRAME_INTERVAL);
        let (tx, rx) = mpsc::channel(capacity);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let engine =
            SyncEngine::with_id_generator(config, TokioScheduler::new(timer_tx), generator);

        let worker = tokio::spawn(async move {
            engine_worker(engine, rx, timer_rx, frame_interval).await
        });

        debug!(capacity, ?frame_interval, "sync engine worker spawned");

        Self {
            handle: EngineHandle { tx, capacity },
            worker,
        }
    }

    /// Get a handle to the worker
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the worker and return its final counters.
    ///
    /// Commands queued before the call are applied first.
    #[instrument(name = "engine_runtime_shutdown", skip(self))]
    pub async fn shutdown(self) -> Result<EngineStats, EngineError> {
        if self.handle.tx.send(Command::Shutdown).await.is_err() {
            warn!("sync engine worker already stopped");
        }
        match self.worker.await {
            Ok(stats) => {
                debug!(?stats, "sync engine shutdown complete");
                Ok(stats)
            }
            Err(e) => {
                error!(error = ?e, "sync engine worker panicked");
                Err(EngineError::Stopped)
            }
        }
    }
}

/// Cheap, cloneable handle to a running engine
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
    capacity: usize,
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("capacity", &self.capacity)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl EngineHandle {
    /// Make this handle the process-wide engine.
    pub fn install_global(self) -> Result<(), EngineError> {
        GLOBAL
            .set(self)
            .map_err(|_| EngineError::GlobalAlreadyInstalled)
    }

    /// The process-wide engine, if one was installed
    pub fn global() -> Option<EngineHandle> {
        GLOBAL.get().cloned()
    }

    /// Report scroll movement on `region` (non-blocking).
    ///
    /// Fails with [`EngineError::QueueFull`] instead of waiting; a dropped
    /// scroll event is covered by the next one.
    pub fn publish(&self, region: SharedRegion) -> Result<(), EngineError> {
        self.try_send(Command::Publish(region))
    }

    /// Report that scrolling on `region` has stopped (non-blocking).
    ///
    /// Never dropped on a full queue: the settle is the only thing that ends
    /// a gesture, so losing it would keep the leader gate closed.
    pub fn publish_settle(&self, region: SharedRegion) -> Result<(), EngineError> {
        send_control(&self.tx, Command::PublishSettle(region), self.capacity)
    }

    /// Force the leader gate open.
    pub fn reset_current_element(&self) -> Result<(), EngineError> {
        send_control(&self.tx, Command::Reset, self.capacity)
    }

    /// Subscribe `region` to continuous offset broadcasts.
    pub async fn subscribe_continuous(
        &self,
        region: SharedRegion,
        callback: OffsetCallback,
    ) -> Result<CancelHandle, EngineError> {
        self.subscribe(SubscriptionChannel::Continuous, region, callback)
            .await
    }

    /// Subscribe `region` to settle notifications.
    pub async fn subscribe_settle(
        &self,
        region: SharedRegion,
        callback: OffsetCallback,
    ) -> Result<CancelHandle, EngineError> {
        self.subscribe(SubscriptionChannel::Settle, region, callback)
            .await
    }

    /// Current engine state, after every previously sent command
    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply))
            .await
            .map_err(|_| EngineError::Stopped)?;
        rx.await.map_err(|_| EngineError::Stopped)
    }

    /// Whether the worker has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn subscribe(
        &self,
        channel: SubscriptionChannel,
        region: SharedRegion,
        callback: OffsetCallback,
    ) -> Result<CancelHandle, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Subscribe {
                channel,
                region,
                callback,
                reply,
            })
            .await
            .map_err(|_| EngineError::Stopped)?;
        let subscription = rx.await.map_err(|_| EngineError::Stopped)?;

        Ok(CancelHandle {
            subscription,
            tx: self.tx.clone(),
            capacity: self.capacity,
            cancelled: false,
        })
    }

    fn try_send(&self, command: Command) -> Result<(), EngineError> {
        match self.tx.try_send(command) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(command)) => {
                metrics::counter!(
                    "scroll_sync_commands_dropped_total",
                    "command" => command.name()
                )
                .increment(1);
                warn!(command = command.name(), "Queue full, command dropped");
                Err(EngineError::QueueFull {
                    capacity: self.capacity,
                    command: command.name(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(EngineError::Stopped),
        }
    }
}

/// Removes one subscription when invoked.
///
/// Dropping the handle does not unsubscribe: call [`cancel`](CancelHandle::cancel).
pub struct CancelHandle {
    subscription: Subscription,
    tx: mpsc::Sender<Command>,
    capacity: usize,
    cancelled: bool,
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("subscription", &self.subscription)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl CancelHandle {
    /// Subscription this handle removes
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Remove the subscription. Calling it again is a no-op.
    pub fn cancel(&mut self) -> Result<(), EngineError> {
        if self.cancelled {
            return Ok(());
        }
        send_control(
            &self.tx,
            Command::Cancel(self.subscription.clone()),
            self.capacity,
        )?;
        self.cancelled = true;
        Ok(())
    }
}

/// Send a command that must not be lost.
///
/// When the queue is full the send is retried on a background task, which
/// may apply it after commands sent later.
fn send_control(
    tx: &mpsc::Sender<Command>,
    command: Command,
    capacity: usize,
) -> Result<(), EngineError> {
    match tx.try_send(command) {
        Ok(()) => Ok(()),
        Err(mpsc::error::TrySendError::Full(command)) => {
            let name = command.name();
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let tx = tx.clone();
                    runtime.spawn(async move {
                        let _ = tx.send(command).await;
                    });
                    Ok(())
                }
                Err(_) => Err(EngineError::QueueFull {
                    capacity,
                    command: name,
                }),
            }
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(EngineError::Stopped),
    }
}

/// Worker task owning the engine
#[instrument(name = "sync_engine_worker_loop", skip_all)]
async fn engine_worker(
    mut engine: SyncEngine<TokioScheduler>,
    mut rx: mpsc::Receiver<Command>,
    mut timer_rx: mpsc::UnboundedReceiver<TimerToken>,
    frame_interval: Duration,
) -> EngineStats {
    debug!("Sync engine worker started");

    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => apply(&mut engine, command),
            },
            Some(token) = timer_rx.recv() => {
                engine.run_timer(token);
            }
            _ = ticker.tick() => {
                let frames = engine.scheduler_mut().take_frames();
                for token in frames {
                    engine.run_frame(token);
                }
            }
        }
    }

    debug!("Sync engine worker stopped");
    engine.stats()
}

fn apply(engine: &mut SyncEngine<TokioScheduler>, command: Command) {
    match command {
        Command::Publish(region) => engine.publish(&region),
        Command::PublishSettle(region) => engine.publish_settle(&region),
        Command::Reset => engine.reset_current_element(),
        Command::Subscribe {
            channel,
            region,
            callback,
            reply,
        } => {
            let subscription = match channel {
                SubscriptionChannel::Continuous => {
                    engine.subscribe_continuous(&*region, callback)
                }
                SubscriptionChannel::Settle => engine.subscribe_settle(&*region, callback),
            };
            // Caller may have given up waiting; the entry stays registered
            let _ = reply.send(subscription);
        }
        Command::Cancel(subscription) => {
            engine.cancel(&subscription);
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(engine.snapshot());
        }
        Command::Shutdown => {}
    }
}
