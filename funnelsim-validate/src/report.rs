use std::fmt;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::checks::{section, validate, ExperimentRow, FunnelRow, SummaryRow};
use crate::error::{ValidateError, Violation};

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentDecision {
    pub experiment_id: String,
    pub decision: String,
    pub p_value: Option<f64>,
}

/// Headline numbers of an export that passed.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSummary {
    pub total_events: i64,
    pub funnel_entry_users: i64,
    pub funnel_exit_users: i64,
    pub experiments: Vec<ExperimentDecision>,
}

impl PassSummary {
    /// `None` unless every section decodes and the funnel is non-empty.
    pub fn from_value(data: &Value) -> Option<Self> {
        let summary: Vec<SummaryRow> = section(data, "event_summary").ok()?;
        let funnel: Vec<FunnelRow> = section(data, "funnel").ok()?;
        let experiments: Vec<ExperimentRow> = section(data, "experiments").ok()?;

        let experiments = experiments
            .into_iter()
            .map(|exp| {
                let analysis = exp.analysis.unwrap_or_default();
                ExperimentDecision {
                    experiment_id: exp.experiment_id,
                    decision: analysis
                        .get("decision")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                    p_value: analysis.get("p_value").and_then(Value::as_f64),
                }
            })
            .collect();

        Some(Self {
            total_events: summary.iter().map(|r| r.count).sum::<f64>().round() as i64,
            funnel_entry_users: funnel.first()?.users.round() as i64,
            funnel_exit_users: funnel.last()?.users.round() as i64,
            experiments,
        })
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Events: {}", thousands(self.total_events))?;
        write!(
            f,
            "  Funnel: {} -> {} users",
            thousands(self.funnel_entry_users),
            thousands(self.funnel_exit_users)
        )?;
        for exp in &self.experiments {
            match exp.p_value {
                Some(p) => write!(
                    f,
                    "\n  Experiment {}: {} (p={:.4})",
                    exp.experiment_id, exp.decision, p
                )?,
                None => write!(f, "\n  Experiment {}: {} (p=n/a)", exp.experiment_id, exp.decision)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    /// Present only when there are no violations.
    pub summary: Option<PassSummary>,
}

impl ValidationReport {
    pub fn from_value(data: &Value) -> Self {
        let violations = validate(data);
        let summary = if violations.is_empty() {
            PassSummary::from_value(data)
        } else {
            None
        };
        Self {
            violations,
            summary,
        }
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.passed() {
            write!(f, "FAIL: {} validation error(s):", self.violations.len())?;
            for v in &self.violations {
                write!(f, "\n  - {}", v)?;
            }
            return Ok(());
        }
        write!(f, "PASS: Analytics integrity validated")?;
        if let Some(summary) = &self.summary {
            write!(f, "\n{}", summary)?;
        }
        Ok(())
    }
}

/// Reads an export from disk and checks it.
pub fn validate_file<P: AsRef<Path>>(path: P) -> Result<ValidationReport, ValidateError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ValidateError::NotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ValidateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data: Value = serde_json::from_str(&raw)?;

    let report = ValidationReport::from_value(&data);
    if report.passed() {
        info!(path = %path.display(), "Export passed validation");
    } else {
        warn!(
            path = %path.display(),
            violations = report.violations.len(),
            "Export failed validation"
        );
    }
    Ok(report)
}

fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
