//! # funnelsim-ab
//!
//! Experiment definitions and deterministic variant assignment.
//!
//! Assignment is a pure function of `(experiment_id, user_id)`: the same
//! pair always lands in the same variant, in any process, with no lookup
//! table and no randomness.

pub mod assignment;
pub mod error;
pub mod experiment;

pub use assignment::{assign_variant, bucket_for};
pub use error::ExperimentError;
pub use experiment::{
    Experiment, Variant, CONTROL_VARIANT, DEFAULT_TARGET_METRIC, PRICING_PAGE_EXPERIMENT,
    TREATMENT_VARIANT,
};
