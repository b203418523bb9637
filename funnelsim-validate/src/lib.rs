//! # funnelsim-validate
//!
//! Integrity gate for exported dashboard data. The export is a JSON document
//! with three sections: `event_summary`, `funnel` and `experiments`. The
//! gate checks structure and the logical invariants between them; it does
//! not recompute any statistics.

mod checks;
mod error;
mod report;

pub use checks::{validate, ANALYSIS_FIELDS, DECISIONS, FUNNEL_STEPS, REQUIRED_SECTIONS};
pub use error::{ValidateError, Violation};
pub use report::{validate_file, ExperimentDecision, PassSummary, ValidationReport};
