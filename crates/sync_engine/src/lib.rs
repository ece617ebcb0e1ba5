//! # Sync Engine
//!
//! Keeps the horizontal scroll offset of several regions in lockstep.
//!
//! Responsibilities:
//! - leader election (the first region to publish drives the gesture)
//! - frame-coalesced offset broadcast to every follower
//! - settle notification and delayed leader release
//! - identifier resolution for anonymous regions
//!
//! [`SyncEngine`] is a plain state machine driven by a [`contracts::Scheduler`].
//! [`EngineRuntime`] runs one on a tokio worker and hands out [`EngineHandle`]s.
//!
//! ## Usage
//!
//! ```ignore
//! use sync_engine::{EngineRuntime, ScrollSyncBinding};
//!
//! let runtime = EngineRuntime::spawn(config.engine);
//! let handle = runtime.handle();
//!
//! let header = ScrollSyncBinding::attach(&handle, header_region).await?;
//! let body = ScrollSyncBinding::attach(&handle, body_region).await?;
//!
//! // Wire the host's scroll notifications
//! header.on_scroll()?;
//! header.on_scroll_end()?;
//! ```

mod bindings;
mod engine;
mod error;
mod handle;
mod identity;
mod manual;
mod mock;
mod registry;

pub use bindings::{FollowerBinding, ScrollSyncBinding, SettleBinding};
pub use engine::{BroadcastKind, EngineSnapshot, SyncEngine};
pub use error::EngineError;
pub use handle::{CancelHandle, EngineHandle, EngineRuntime, TokioScheduler};
pub use identity::{IdentityResolver, SequentialIdGenerator, UuidGenerator};
pub use manual::ManualScheduler;
pub use mock::MockRegion;
pub use registry::{SubscriberRegistry, Subscription};

// Re-export contracts types
pub use contracts::{
    EngineConfig, EngineStats, ElementId, OffsetCallback, ScrollRegion, SharedRegion,
    SubscriptionChannel, QUALIFIED_NAME,
};
