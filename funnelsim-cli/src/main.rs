//! ## funnelsim-cli
//! **Command-line entrypoint**
//!
//! Generates synthetic funnel events, checks exported dashboard data and
//! lists the configured experiments.

use anyhow::Context;
use clap::Parser;
use funnelsim_config::FunnelsimConfig;
use funnelsim_telemetry::{EventLogger, MetricsRecorder};

mod commands;

use commands::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = if cli.command.needs_config() {
        commands::load_config(cli.config.as_deref())?
    } else {
        FunnelsimConfig::default()
    };
    EventLogger::init(&config.telemetry.log_level);

    match cli.command {
        Commands::Generate(args) => {
            let metrics = if config.telemetry.metrics {
                Some(MetricsRecorder::new().context("Failed to register metrics")?)
            } else {
                None
            };
            commands::generate(&args, &config, metrics.as_ref()).map(|_| ())
        }
        Commands::Validate(args) => commands::validate(&args),
        Commands::Experiments => commands::list_experiments(&config),
    }
}
