use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use funnelsim_ab::Experiment;
use funnelsim_config::{FunnelsimConfig, SimulationConfig};
use funnelsim_core::{EventSink, InMemorySink, InsertStats, JsonLinesSink};
use funnelsim_simulator::{generate_events, RunSummary};
use funnelsim_telemetry::{EventLogger, MetricsRecorder};
use funnelsim_validate::validate_file;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "funnelsim", version, about)]
pub struct Cli {
    /// Configuration file; without it `config/` and the environment are used
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate simulated analytics events
    Generate(GenerateArgs),
    /// Check an exported dashboard JSON file
    Validate(ValidateArgs),
    /// List the configured experiments
    Experiments,
}

impl Commands {
    /// `validate` only reads the export, so a broken or missing
    /// configuration must not stop it.
    pub fn needs_config(&self) -> bool {
        !matches!(self, Commands::Validate(_))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Number of users
    #[arg(long)]
    pub users: Option<usize>,
    /// Simulation window in days
    #[arg(long)]
    pub days: Option<u32>,
    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Run with an A/B experiment
    #[arg(long)]
    pub experiment: bool,
    /// Configured experiment to run instead of the first one
    #[arg(long, requires = "experiment")]
    pub experiment_id: Option<String>,
    /// Append events to this JSON-lines file, skipping known event ids
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Fail unless the run digest equals this hex string
    #[arg(long)]
    pub validate_hash: Option<String>,
}

impl GenerateArgs {
    /// Command-line values take precedence over configuration.
    pub fn apply(&self, base: &SimulationConfig) -> SimulationConfig {
        let mut config = base.clone();
        if let Some(users) = self.users {
            config.num_users = users;
        }
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to exported dashboard JSON
    #[arg(long)]
    pub data: PathBuf,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<FunnelsimConfig> {
    match path {
        Some(path) => FunnelsimConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => FunnelsimConfig::load().context("Failed to load configuration"),
    }
}

pub fn select_experiment(
    config: &FunnelsimConfig,
    experiment_id: Option<&str>,
) -> anyhow::Result<Experiment> {
    let Some(id) = experiment_id else {
        return Ok(config.primary_experiment()?);
    };
    config
        .experiments()?
        .into_iter()
        .find(|e| e.experiment_id() == id)
        .ok_or_else(|| anyhow!("Unknown experiment: {}", id))
}

pub fn generate(
    args: &GenerateArgs,
    config: &FunnelsimConfig,
    metrics: Option<&MetricsRecorder>,
) -> anyhow::Result<InsertStats> {
    let sim = args.apply(&config.simulation);
    sim.check().context("Invalid simulation parameters")?;

    let experiment = if args.experiment {
        Some(select_experiment(config, args.experiment_id.as_deref())?)
    } else {
        None
    };

    if let Some(exp) = &experiment {
        println!("Experiment: {} ({})", exp.name(), exp.experiment_id());
        for v in exp.variants() {
            println!("  {}: {:.0}% traffic", v.name(), v.weight() * 100.0);
        }
    }

    println!(
        "Generating events for {} users over {} days (seed={})...",
        sim.num_users, sim.days, sim.seed
    );
    let events = generate_events(&sim, experiment.as_ref());
    println!("Generated {} events", events.len());

    let summary = RunSummary::from_events(&events);
    println!("{}", summary);
    EventLogger::log_run(&summary);

    if let Some(metrics) = metrics {
        metrics.record_events(&events);
        let exposition = metrics
            .gather_metrics()
            .context("Failed to encode metrics")?;
        debug!("Run metrics:\n{}", exposition);
    }

    if let Some(expected) = args.validate_hash.as_deref() {
        if !expected.eq_ignore_ascii_case(&summary.digest) {
            error!(expected, actual = %summary.digest, "Digest mismatch");
            bail!(
                "Run digest mismatch: expected {}, got {}",
                expected,
                summary.digest
            );
        }
        info!("Run digest verified");
    }

    let stats = match &args.output {
        Some(path) => {
            println!("\nLoading into {}...", path.display());
            let mut sink = JsonLinesSink::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            sink.insert_events(&events)?
        }
        None => InMemorySink::new().insert_events(&events)?,
    };
    println!(
        "Inserted: {}, Duplicates skipped: {}",
        stats.inserted, stats.duplicates
    );
    println!("Done.");
    Ok(stats)
}

pub fn validate(args: &ValidateArgs) -> anyhow::Result<()> {
    let report = validate_file(&args.data)
        .with_context(|| format!("Cannot validate {}", args.data.display()))?;
    println!("{}", report);
    if !report.passed() {
        bail!("{} validation error(s)", report.violations.len());
    }
    Ok(())
}

pub fn list_experiments(config: &FunnelsimConfig) -> anyhow::Result<()> {
    for exp in config.experiments()? {
        println!(
            "{} - {} (target: {})",
            exp.experiment_id(),
            exp.name(),
            exp.target_metric()
        );
        for v in exp.variants() {
            println!("  {}: {:.0}%", v.name(), v.weight() * 100.0);
        }
    }
    Ok(())
}
