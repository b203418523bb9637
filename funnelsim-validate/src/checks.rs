use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Violation;

pub const REQUIRED_SECTIONS: [&str; 3] = ["funnel", "experiments", "event_summary"];
pub const FUNNEL_STEPS: [&str; 3] = ["page_view", "signup", "purchase"];
pub const ANALYSIS_FIELDS: [&str; 8] = [
    "absolute_uplift",
    "relative_uplift",
    "p_value",
    "ci_lower",
    "ci_upper",
    "is_significant",
    "decision",
    "reason",
];
pub const DECISIONS: [&str; 3] = ["SHIP", "DO NOT SHIP", "INCONCLUSIVE"];

const REQUIRED_EVENT_TYPES: [&str; 3] = ["page_view", "signup", "purchase"];
const UNKNOWN_EXPERIMENT: &str = "UNKNOWN";

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryRow {
    pub event_type: String,
    /// Exports may render counts as `10` or `10.0`.
    pub count: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FunnelRow {
    pub step: String,
    pub users: f64,
    pub conversion_rate_pct: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExperimentRow {
    #[serde(default = "unknown_experiment")]
    pub experiment_id: String,
    #[serde(default)]
    pub variants: Option<Vec<VariantRow>>,
    #[serde(default)]
    pub analysis: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariantRow {
    pub name: String,
    pub users: f64,
}

fn unknown_experiment() -> String {
    UNKNOWN_EXPERIMENT.to_owned()
}

/// Decodes one section, reporting a shape mismatch as a violation.
pub(crate) fn section<T: DeserializeOwned>(
    data: &Value,
    name: &str,
) -> Result<Vec<T>, Violation> {
    let raw = data.get(name).cloned().unwrap_or(Value::Null);
    serde_json::from_value(raw).map_err(|e| Violation::Malformed {
        section: name.to_owned(),
        reason: e.to_string(),
    })
}

/// Checks an export. An empty result means it passes.
///
/// Missing sections are reported alone: nothing else is checked until the
/// document has all three.
pub fn validate(data: &Value) -> Vec<Violation> {
    if !data.is_object() {
        return vec![Violation::Malformed {
            section: "document".into(),
            reason: "expected a JSON object".into(),
        }];
    }

    let missing: Vec<Violation> = REQUIRED_SECTIONS
        .iter()
        .filter(|key| data.get(**key).is_none())
        .map(|key| Violation::MissingSection(*key))
        .collect();
    if !missing.is_empty() {
        return missing;
    }

    let mut violations = Vec::new();
    match section::<SummaryRow>(data, "event_summary") {
        Ok(rows) => check_event_summary(&rows, &mut violations),
        Err(v) => violations.push(v),
    }
    match section::<FunnelRow>(data, "funnel") {
        Ok(rows) => check_funnel(&rows, &mut violations),
        Err(v) => violations.push(v),
    }
    match section::<ExperimentRow>(data, "experiments") {
        Ok(rows) => check_experiments(&rows, &mut violations),
        Err(v) => violations.push(v),
    }

    debug!(violations = violations.len(), "Export checked");
    violations
}

fn check_event_summary(rows: &[SummaryRow], out: &mut Vec<Violation>) {
    if rows.is_empty() {
        out.push(Violation::EmptyEventSummary);
        return;
    }

    for required in REQUIRED_EVENT_TYPES {
        if !rows.iter().any(|r| r.event_type == required) {
            out.push(Violation::MissingEventType(required));
        }
    }
    for row in rows.iter().filter(|r| r.count <= 0.0) {
        out.push(Violation::NonPositiveCount {
            event_type: row.event_type.clone(),
        });
    }
}

fn check_funnel(rows: &[FunnelRow], out: &mut Vec<Violation>) {
    if rows.is_empty() {
        out.push(Violation::EmptyFunnel);
        return;
    }

    if !rows.iter().map(|r| r.step.as_str()).eq(FUNNEL_STEPS) {
        out.push(Violation::UnexpectedSteps {
            found: rows.iter().map(|r| r.step.clone()).collect(),
            expected: FUNNEL_STEPS.iter().map(|s| s.to_string()).collect(),
        });
    }

    for pair in rows.windows(2) {
        if pair[1].users > pair[0].users {
            out.push(Violation::FunnelIncreases {
                prev_step: pair[0].step.clone(),
                prev_users: pair[0].users,
                step: pair[1].step.clone(),
                users: pair[1].users,
            });
        }
    }

    for row in rows {
        if !(0.0..=100.0).contains(&row.conversion_rate_pct) {
            out.push(Violation::InvalidRate {
                step: row.step.clone(),
                rate: row.conversion_rate_pct,
            });
        }
    }
}

fn check_experiments(rows: &[ExperimentRow], out: &mut Vec<Violation>) {
    if rows.is_empty() {
        out.push(Violation::NoExperiments);
        return;
    }

    for exp in rows {
        let id = &exp.experiment_id;
        let variants = match exp.variants.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => {
                out.push(Violation::NoVariants(id.clone()));
                continue;
            }
        };

        for required in ["control", "treatment"] {
            if !variants.iter().any(|v| v.name == required) {
                out.push(Violation::MissingVariant {
                    experiment_id: id.clone(),
                    variant: required,
                });
            }
        }
        for variant in variants.iter().filter(|v| v.users <= 0.0) {
            out.push(Violation::EmptyVariant {
                experiment_id: id.clone(),
                variant: variant.name.clone(),
            });
        }

        let Some(analysis) = &exp.analysis else {
            out.push(Violation::MissingAnalysis(id.clone()));
            continue;
        };
        check_analysis(id, analysis, out);
    }
}

fn check_analysis(id: &str, analysis: &Map<String, Value>, out: &mut Vec<Violation>) {
    let missing: Vec<&'static str> = ANALYSIS_FIELDS
        .iter()
        .copied()
        .filter(|f| !analysis.contains_key(*f))
        .collect();
    if !missing.is_empty() {
        out.push(Violation::MissingAnalysisFields {
            experiment_id: id.to_owned(),
            fields: missing,
        });
    }

    match analysis.get("p_value") {
        None | Some(Value::Null) => {}
        Some(p) => match p.as_f64() {
            Some(p) if (0.0..=1.0).contains(&p) => {}
            Some(p) => out.push(Violation::PValueOutOfRange {
                experiment_id: id.to_owned(),
                p_value: p,
            }),
            None => out.push(Violation::Malformed {
                section: format!("experiments.{}.analysis.p_value", id),
                reason: format!("expected a number, got {}", p),
            }),
        },
    }

    let decision = analysis.get("decision").and_then(Value::as_str);
    if !decision.is_some_and(|d| DECISIONS.iter().any(|known| *known == d)) {
        out.push(Violation::InvalidDecision {
            experiment_id: id.to_owned(),
            decision: analysis.get("decision").and_then(|d| match d {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }),
        });
    }
}
