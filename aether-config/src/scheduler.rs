//! Virtual clock and driver configuration.
//!
//! Durations are written as unit quantities, for example:
//!
//! ```yaml
//! driver:
//!   tick:
//!     breaths: 1
//!   max_ticks: 10
//!   pacing_ms: 0
//! ```

use aether_core::time::{Duration, DurationSpec, Instant};
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Initial state of the virtual clock.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SchedulerConfig {
    /// Instant the clock reads before the first advance, in flickers.
    #[serde(default)]
    pub epoch_flickers: i64,
}

impl SchedulerConfig {
    pub fn epoch(&self) -> Instant {
        Instant::from_flickers(self.epoch_flickers)
    }
}

/// How the driver moves the clock.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct DriverConfig {
    /// Virtual time covered by one advance.
    #[serde(default = "default_tick")]
    #[validate(custom(function = validation::validate_positive_duration))]
    pub tick: DurationSpec,

    /// Upper bound on the number of advances in one run.
    #[serde(default = "default_max_ticks")]
    #[validate(range(min = 1, max = 10_000_000))]
    pub max_ticks: u64,

    /// Real milliseconds to sleep between ticks; 0 runs unpaced.
    #[serde(default)]
    #[validate(range(max = 60_000))]
    pub pacing_ms: u64,
}

fn default_tick() -> DurationSpec {
    DurationSpec {
        breaths: 1,
        ..Default::default()
    }
}

fn default_max_ticks() -> u64 {
    10
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick: default_tick(),
            max_ticks: default_max_ticks(),
            pacing_ms: 0,
        }
    }
}

impl DriverConfig {
    pub fn tick(&self) -> Duration {
        self.tick.to_duration()
    }

    pub fn pacing(&self) -> Option<std::time::Duration> {
        (self.pacing_ms > 0).then(|| std::time::Duration::from_millis(self.pacing_ms))
    }
}
