//! # aether-core
//!
//! Virtual-time foundation for Aether simulations.
//!
//! ### Key Submodules:
//! - `time`: `Instant`/`Duration` fixed-point arithmetic over flickers and the
//!   named unit table
//! - `scheduler`: `Scheduler` with `wait_until`/`advance` and per-instant drain
//!   barriers
//! - `stats`: lifetime counters of scheduler activity
//!
//! ### Future:
//! - `wait_idle_after` as a low-priority drain barrier

pub mod error;
pub mod scheduler;
pub mod stats;
pub mod time;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::scheduler::Scheduler;
    pub use crate::stats::{SchedulerStats, StatsSnapshot};
    pub use crate::time::*;
}

pub use error::{SchedulerError, TimeError};
pub use scheduler::Scheduler;
