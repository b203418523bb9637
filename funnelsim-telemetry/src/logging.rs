//! ## funnelsim-telemetry::logging
//!
//! Structured logging with `tracing`. Output goes to stderr so that stdout
//! stays free for command output.

use funnelsim_simulator::RunSummary;
use tracing::{info, info_span};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
    pub fn init(default_level: &str) {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .init()
    }

    pub fn log_run(summary: &RunSummary) {
        let span = info_span!("run_summary", digest = %summary.digest);
        let _guard = span.enter();

        info!(
            events = summary.total_events,
            visitors = summary.visitors,
            signups = summary.signups,
            purchasers = summary.purchasers,
            "Run finished"
        );
        for (variant, stats) in &summary.variants {
            info!(
                variant = %variant,
                users = stats.users,
                purchasers = stats.purchasers,
                purchase_rate = stats.purchase_rate(),
                "Variant outcome"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use funnelsim_core::{Event, EventType, Properties};
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_log_run() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut props = Properties::new();
        props.insert("experiment_id".into(), "exp_pricing_page_v1".into());
        props.insert("variant".into(), "treatment".into());
        let events = vec![
            Event::new("a".into(), "user_00000", EventType::PageView, ts, Properties::new()),
            Event::new("b".into(), "user_00000", EventType::ExperimentAssignment, ts, props),
        ];

        EventLogger::log_run(&RunSummary::from_events(&events));
        assert!(logs_contain("Run finished"));
        assert!(logs_contain("visitors=1"));
        assert!(logs_contain("variant=treatment"));
    }
}
