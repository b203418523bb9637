//! # funnelsim Configuration
//!
//! Layered configuration for the funnel simulator.
//!
//! ## Hierarchy
//! 1. Built-in defaults
//! 2. `config/funnelsim.yaml`
//! 3. `config/<FUNNELSIM_ENV>.yaml` (defaults to `development`)
//! 4. `FUNNELSIM_*` environment variables, `__` separating nested keys
//!    (e.g. `FUNNELSIM_SIMULATION__NUM_USERS=500`)
//!
//! Loaded configuration is validated before it is returned. The simulator
//! itself trusts its `SimulationConfig`; this crate is where bad values are
//! rejected.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use funnelsim_ab::{Experiment, PRICING_PAGE_EXPERIMENT};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

mod error;
mod experiment;
mod simulation;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use experiment::{ExperimentConfig, VariantConfig};
pub use simulation::{PlanConfig, SimulationConfig};
pub use telemetry::TelemetryConfig;

const ENV_PREFIX: &str = "FUNNELSIM_";
const DEFAULT_CONFIG_DIR: &str = "config";

/// Top-level configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct FunnelsimConfig {
    /// Population, window, seed and funnel probabilities.
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Experiments available to the simulator. Empty means the built-in
    /// pricing page experiment.
    #[serde(default)]
    pub experiments: Vec<ExperimentConfig>,

    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl FunnelsimConfig {
    /// Load configuration from `config/` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_dir(DEFAULT_CONFIG_DIR)
    }

    /// Same as [`FunnelsimConfig::load`] with an explicit configuration directory.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let mut figment = Figment::from(Serialized::defaults(FunnelsimConfig::default()));

        let base = dir.join("funnelsim.yaml");
        if base.exists() {
            figment = figment.merge(Yaml::file(&base));
        } else {
            debug!(path = %base.display(), "Base config not found, using defaults");
        }

        let env = std::env::var("FUNNELSIM_ENV").unwrap_or_else(|_| "development".into());
        let env_file = dir.join(format!("{}.yaml", env));
        if env_file.exists() {
            figment = figment.merge(Yaml::file(&env_file));
        }

        Self::finish(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load a single YAML file (plus environment overrides).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::finish(
            Figment::from(Serialized::defaults(FunnelsimConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.check()?;
        Ok(config)
    }

    /// Full validation: field rules, cross-field ranges and experiment invariants.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.simulation.check()?;
        self.experiments()?;
        Ok(())
    }

    /// Configured experiments, or the default pricing experiment if none are set.
    pub fn experiments(&self) -> Result<Vec<Experiment>, ConfigError> {
        if self.experiments.is_empty() {
            return Ok(vec![PRICING_PAGE_EXPERIMENT.clone()]);
        }
        self.experiments
            .iter()
            .cloned()
            .map(ExperimentConfig::into_experiment)
            .collect()
    }

    /// The experiment a run uses when one is requested: the first configured.
    pub fn primary_experiment(&self) -> Result<Experiment, ConfigError> {
        let mut experiments = self.experiments()?;
        Ok(experiments.swap_remove(0))
    }
}
