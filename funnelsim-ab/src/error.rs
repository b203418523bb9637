use thiserror::Error;

/// Rejected experiment definitions. Always a configuration bug.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExperimentError {
    #[error("Variant weights must sum to 1.0, got {total}")]
    WeightsDoNotSumToOne { total: f64 },

    #[error("Experiment must have at least 2 variants, got {count}")]
    TooFewVariants { count: usize },

    #[error("Variant names must be unique, '{name}' appears more than once")]
    DuplicateVariant { name: String },
}
