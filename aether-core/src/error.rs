use thiserror::Error;

use crate::time::Instant;

/// Failures of the dynamically-checked time arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("Unsupported operand kinds for {op}: {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("Invalid duration literal: {0}")]
    Parse(String),
}

/// Contract violations reported by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Cannot wait for {requested}: the clock is already at {current}")]
    PastOrPresentTime { requested: Instant, current: Instant },

    #[error("Not supported: {0}")]
    NotSupported(&'static str),

    /// The gate for this instant disappeared while a waiter was suspended on it.
    ///
    /// A slot is only retired once its outstanding count is zero, and a waiter
    /// keeps it counted, so this is not expected while the scheduler is intact.
    #[error("Release gate for {0} closed before it fired")]
    GateClosed(Instant),
}
