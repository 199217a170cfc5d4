use thiserror::Error;
use tokio::task::JoinError;

use aether_config::ConfigError;
use aether_core::time::{Duration, Instant};
use aether_core::SchedulerError;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulated task failed: {0}")]
    Join(#[from] JoinError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Tick must be a positive duration, got {0}")]
    InvalidTick(Duration),

    #[error("Tick budget of {0} exhausted")]
    TickBudgetExhausted(u64),

    #[error("Simulation stalled at {0}: nothing is pending but the task has not finished")]
    Stalled(Instant),

    #[error("State hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}
