use std::path::PathBuf;

use thiserror::Error;

/// Failure to run the gate at all.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("{0} not found")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One broken invariant in an export.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("Missing top-level key: {0}")]
    MissingSection(&'static str),

    #[error("{section} is malformed: {reason}")]
    Malformed { section: String, reason: String },

    #[error("event_summary is empty: no events were generated")]
    EmptyEventSummary,

    #[error("event_summary missing required type: {0}")]
    MissingEventType(&'static str),

    #[error("event_summary {event_type} has count <= 0")]
    NonPositiveCount { event_type: String },

    #[error("funnel is empty: no funnel data exported")]
    EmptyFunnel,

    #[error("Funnel steps [{}] != expected [{}]", .found.join(", "), .expected.join(", "))]
    UnexpectedSteps {
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("Funnel not monotonically decreasing: {prev_step}={prev_users} < {step}={users}")]
    FunnelIncreases {
        prev_step: String,
        prev_users: f64,
        step: String,
        users: f64,
    },

    #[error("Funnel step {step} has invalid rate: {rate}%")]
    InvalidRate { step: String, rate: f64 },

    #[error("experiments is empty: no experiment data exported")]
    NoExperiments,

    #[error("Experiment {0} has no variants")]
    NoVariants(String),

    #[error("Experiment {experiment_id} missing '{variant}' variant")]
    MissingVariant {
        experiment_id: String,
        variant: &'static str,
    },

    #[error("Experiment {experiment_id} variant {variant} has 0 users")]
    EmptyVariant {
        experiment_id: String,
        variant: String,
    },

    #[error("Experiment {0} missing analysis results")]
    MissingAnalysis(String),

    #[error("Experiment {experiment_id} analysis missing fields: {}", .fields.join(", "))]
    MissingAnalysisFields {
        experiment_id: String,
        fields: Vec<&'static str>,
    },

    #[error("Experiment {experiment_id} p-value out of range: {p_value}")]
    PValueOutOfRange { experiment_id: String, p_value: f64 },

    #[error("Experiment {experiment_id} invalid decision: {}", .decision.as_deref().unwrap_or("None"))]
    InvalidDecision {
        experiment_id: String,
        decision: Option<String>,
    },
}
