//! Walker demo parameters.

use aether_core::time::{Duration, DurationSpec};
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct DemoConfig {
    /// Number of walkers to spawn.
    #[serde(default = "default_walkers")]
    #[validate(range(min = 1, max = 10_000))]
    pub walkers: usize,

    /// Gap between consecutive walker start instants.
    #[serde(default = "default_stride")]
    #[validate(custom(function = validation::validate_positive_duration))]
    pub stride: DurationSpec,

    /// Seed for the starting headings.
    #[serde(default)]
    pub seed: u64,
}

fn default_walkers() -> usize {
    4
}

fn default_stride() -> DurationSpec {
    DurationSpec {
        flickers: 15,
        ..Default::default()
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            walkers: default_walkers(),
            stride: default_stride(),
            seed: 0,
        }
    }
}

impl DemoConfig {
    pub fn stride(&self) -> Duration {
        self.stride.to_duration()
    }
}
