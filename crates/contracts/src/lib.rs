//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate, never on each other in reverse.
//!
//! ## Environment model
//! - A [`ScrollRegion`] is any horizontally scrollable surface the host exposes
//! - A [`Scheduler`] supplies "before next repaint" frames and one-shot delay timers
//! - An [`IdGenerator`] mints globally unique identifiers for regions that lack one

mod callback;
mod config;
mod element_id;
mod error;
mod id_generator;
mod region;
mod scheduler;
mod stats;

pub use callback::*;
pub use config::*;
pub use element_id::ElementId;
pub use error::*;
pub use id_generator::IdGenerator;
pub use region::*;
pub use scheduler::*;
pub use stats::EngineStats;
