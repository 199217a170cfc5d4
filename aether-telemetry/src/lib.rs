//! # Aether Telemetry
//!
//! Logging and metrics for simulations.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
