//! Experiment definitions supplied through configuration.
//!
//! These are plain data until `into_experiment` runs them through
//! `Experiment::new`, which enforces the weight/count/uniqueness invariants.

use funnelsim_ab::{Experiment, Variant, DEFAULT_TARGET_METRIC};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ConfigError;
use crate::validation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExperimentConfig {
    #[validate(custom(function = validation::validate_identifier))]
    pub experiment_id: String,

    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default = "default_target_metric")]
    pub target_metric: String,

    #[validate(nested)]
    pub variants: Vec<VariantConfig>,
}

fn default_target_metric() -> String {
    DEFAULT_TARGET_METRIC.into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VariantConfig {
    #[validate(length(min = 1))]
    pub name: String,

    /// Traffic share (0.0 to 1.0).
    #[validate(range(min = 0.0, max = 1.0))]
    pub weight: f64,
}

impl ExperimentConfig {
    pub fn into_experiment(self) -> Result<Experiment, ConfigError> {
        self.validate()?;
        let variants = self
            .variants
            .into_iter()
            .map(|v| Variant::new(v.name, v.weight))
            .collect();
        Experiment::new(self.experiment_id.clone(), self.name, variants, self.target_metric)
            .map_err(|source| ConfigError::Experiment {
                id: self.experiment_id,
                source,
            })
    }
}

impl From<&Experiment> for ExperimentConfig {
    fn from(experiment: &Experiment) -> Self {
        Self {
            experiment_id: experiment.experiment_id().into(),
            name: experiment.name().into(),
            target_metric: experiment.target_metric().into(),
            variants: experiment
                .variants()
                .iter()
                .map(|v| VariantConfig {
                    name: v.name().into(),
                    weight: v.weight(),
                })
                .collect(),
        }
    }
}
