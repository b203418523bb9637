//! Experiment definitions.
//!
//! An experiment has an id, a display name, the metric it aims to move and
//! an ordered list of weighted variants. Invariants are enforced by
//! `Experiment::new`; an `Experiment` value that exists is always valid.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::ExperimentError;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.001;

pub const CONTROL_VARIANT: &str = "control";
/// Variant that receives the purchase uplift in simulations.
pub const TREATMENT_VARIANT: &str = "treatment";
pub const DEFAULT_TARGET_METRIC: &str = "purchase";

/// One arm of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    name: String,
    weight: f64,
}

impl Variant {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Traffic share in `[0, 1]`.
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experiment {
    experiment_id: String,
    name: String,
    variants: Vec<Variant>,
    target_metric: String,
}

impl Experiment {
    /// Builds an experiment, rejecting invalid definitions.
    ///
    /// # Errors
    /// - `WeightsDoNotSumToOne` if the weights sum is outside `1.0 ± 0.001`
    /// - `TooFewVariants` if fewer than two variants are given
    /// - `DuplicateVariant` if two variants share a name
    pub fn new(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        variants: Vec<Variant>,
        target_metric: impl Into<String>,
    ) -> Result<Self, ExperimentError> {
        let total: f64 = variants.iter().map(Variant::weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ExperimentError::WeightsDoNotSumToOne { total });
        }
        if variants.len() < 2 {
            return Err(ExperimentError::TooFewVariants {
                count: variants.len(),
            });
        }
        let mut names = HashSet::with_capacity(variants.len());
        for variant in &variants {
            if !names.insert(variant.name()) {
                return Err(ExperimentError::DuplicateVariant {
                    name: variant.name().to_owned(),
                });
            }
        }

        Ok(Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            variants,
            target_metric: target_metric.into(),
        })
    }

    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variants in declared order. The order is significant for bucketing.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn target_metric(&self) -> &str {
        &self.target_metric
    }

    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name() == name)
    }

    /// Shorthand for [`crate::assign_variant`].
    pub fn assign(&self, user_id: &str) -> &str {
        crate::assignment::assign_variant(self, user_id)
    }
}

/// Default experiment used by the simulator.
pub static PRICING_PAGE_EXPERIMENT: Lazy<Experiment> = Lazy::new(|| {
    Experiment::new(
        "exp_pricing_page_v1",
        "Pricing Page Redesign",
        vec![
            Variant::new(CONTROL_VARIANT, 0.5),
            Variant::new(TREATMENT_VARIANT, 0.5),
        ],
        DEFAULT_TARGET_METRIC,
    )
    .expect("built-in pricing experiment is valid")
});

#[cfg(test)]
mod tests {
    use super::*;

    fn build(variants: Vec<Variant>) -> Result<Experiment, ExperimentError> {
        Experiment::new("test", "Test", variants, DEFAULT_TARGET_METRIC)
    }

    #[test]
    fn valid_experiment() {
        let exp = build(vec![Variant::new("a", 0.5), Variant::new("b", 0.5)]).unwrap();
        assert_eq!(exp.variants().len(), 2);
        assert_eq!(exp.target_metric(), "purchase");
        assert_eq!(exp.variant("b").map(Variant::weight), Some(0.5));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let err = build(vec![Variant::new("a", 0.3), Variant::new("b", 0.3)]).unwrap_err();
        assert!(matches!(err, ExperimentError::WeightsDoNotSumToOne { .. }));
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn weight_sum_tolerance() {
        assert!(build(vec![Variant::new("a", 0.3333), Variant::new("b", 0.6670)]).is_ok());
        assert!(build(vec![Variant::new("a", 0.5), Variant::new("b", 0.502)]).is_err());
    }

    #[test]
    fn needs_at_least_two_variants() {
        let err = build(vec![Variant::new("a", 1.0)]).unwrap_err();
        assert_eq!(err, ExperimentError::TooFewVariants { count: 1 });
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn empty_variant_list_fails_on_weights_first() {
        let err = build(Vec::new()).unwrap_err();
        assert!(matches!(err, ExperimentError::WeightsDoNotSumToOne { .. }));
    }

    #[test]
    fn variant_names_must_be_unique() {
        let err = build(vec![Variant::new("a", 0.5), Variant::new("a", 0.5)]).unwrap_err();
        assert_eq!(err, ExperimentError::DuplicateVariant { name: "a".into() });
        assert!(err.to_string().contains("unique"));
    }

    #[test]
    fn default_experiment_is_valid() {
        let exp = &*PRICING_PAGE_EXPERIMENT;
        assert_eq!(exp.experiment_id(), "exp_pricing_page_v1");
        assert_eq!(exp.name(), "Pricing Page Redesign");
        let names: Vec<_> = exp.variants().iter().map(Variant::name).collect();
        assert_eq!(names, [CONTROL_VARIANT, TREATMENT_VARIANT]);
    }
}
