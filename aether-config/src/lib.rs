//! # Aether Configuration System
//!
//! Hierarchical configuration for simulations: clock epoch, driver pacing,
//! walker demo parameters and telemetry.
//!
//! ## Sources, lowest priority first
//! 1. Built-in defaults
//! 2. `config/aether.yaml`
//! 3. `config/<AETHER_ENV>.yaml` (defaults to `config/development.yaml`)
//! 4. `AETHER_*` environment variables, `__` separating sections
//!    (e.g. `AETHER_DRIVER__TICK__BREATHS=2`)

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

mod demo;
mod error;
mod scheduler;
mod telemetry;
mod validation;

pub use demo::DemoConfig;
pub use error::ConfigError;
pub use scheduler::{DriverConfig, SchedulerConfig};
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/aether.yaml";
const ENV_PREFIX: &str = "AETHER_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct AetherConfig {
    /// Clock epoch.
    #[serde(default)]
    #[validate(nested)]
    pub scheduler: SchedulerConfig,

    /// Tick size, tick budget and real-time pacing.
    #[serde(default)]
    #[validate(nested)]
    pub driver: DriverConfig,

    /// Walker demo parameters.
    #[serde(default)]
    #[validate(nested)]
    pub demo: DemoConfig,

    /// Logging and metrics.
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl AetherConfig {
    /// Load configuration from the default files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AetherConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        } else {
            debug!("{BASE_FILE} not found, using defaults");
        }

        let env = std::env::var("AETHER_ENV").unwrap_or_else(|_| "development".into());
        let env_file = format!("config/{env}.yaml");
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from a specific file, still honouring the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        Self::extract(
            Figment::from(Serialized::defaults(AetherConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}
