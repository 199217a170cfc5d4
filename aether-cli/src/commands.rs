use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;
use tracing::info;
use validator::Validate;

use aether_config::AetherConfig;
use aether_core::time::{Duration, DurationSpec, UNIT_TABLE};
use aether_simulator::{puzzles::sleep_sort, run_walkers};
use aether_telemetry::{EventLogger, MetricsRecorder};

#[derive(Parser, Debug)]
#[command(name = "aether", version, about = "Deterministic virtual-time simulations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the walker demo and print its report
    Run(RunArgs),
    /// Sort integers by sleeping on the virtual clock
    Sort(SortArgs),
    /// Print the time unit table
    Units,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Configuration YAML file; without it the default files and AETHER_* are used
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Number of walkers
    #[arg(long)]
    pub walkers: Option<usize>,
    /// Tick budget
    #[arg(long)]
    pub ticks: Option<u64>,
    /// Tick size, e.g. "1br" or "2sp 30br"
    #[arg(long)]
    pub tick: Option<Duration>,
    /// Real-time pause between ticks
    #[arg(long)]
    pub pacing_ms: Option<u64>,
    /// Seed for walker headings
    #[arg(long)]
    pub seed: Option<u64>,
    /// Fail unless the journal hash matches
    #[arg(long)]
    pub validate_hash: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SortArgs {
    /// Values to sort
    pub values: Vec<u32>,
    /// Sort this many random values instead
    #[arg(long)]
    pub random: Option<usize>,
    /// Seed for --random
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Give either values or --random, not both")]
    SortInputConflict,
}

impl Cli {
    pub fn validate(&self) -> Result<(), CliError> {
        if let Commands::Sort(args) = &self.command {
            if args.random.is_some() && !args.values.is_empty() {
                return Err(CliError::SortInputConflict);
            }
        }
        Ok(())
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_demo(args).await,
        Commands::Sort(args) => {
            EventLogger::init_with_level("warn");
            run_sort(args).await
        }
        Commands::Units => {
            print_units();
            Ok(())
        }
    }
}

async fn run_demo(args: RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => AetherConfig::load_from_path(path),
        None => AetherConfig::load(),
    }
    .context("loading configuration")?;
    apply_overrides(&mut config, &args);
    config.validate().context("validating configuration")?;

    EventLogger::init_with_level(&config.telemetry.log_level);
    info!(walkers = config.demo.walkers, max_ticks = config.driver.max_ticks, "starting run");

    let metrics = if config.telemetry.metrics {
        Some(MetricsRecorder::new()?)
    } else {
        None
    };

    let report = run_walkers(&config, metrics.clone()).await?;
    print!("{}", serde_yaml::to_string(&report)?);

    if let Some(metrics) = metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    if let Some(expected) = &args.validate_hash {
        report.validate_hash(expected)?;
        info!("state hash validated");
    }
    Ok(())
}

fn apply_overrides(config: &mut AetherConfig, args: &RunArgs) {
    if let Some(walkers) = args.walkers {
        config.demo.walkers = walkers;
    }
    if let Some(ticks) = args.ticks {
        config.driver.max_ticks = ticks;
    }
    if let Some(tick) = args.tick {
        config.driver.tick = DurationSpec {
            flickers: tick.as_flickers(),
            ..Default::default()
        };
    }
    if let Some(pacing_ms) = args.pacing_ms {
        config.driver.pacing_ms = pacing_ms;
    }
    if let Some(seed) = args.seed {
        config.demo.seed = seed;
    }
}

async fn run_sort(args: SortArgs) -> anyhow::Result<()> {
    let values = match args.random {
        Some(count) => {
            let mut rng = StdRng::seed_from_u64(args.seed);
            (0..count).map(|_| rng.random_range(0..100)).collect()
        }
        None => args.values,
    };
    let sorted = sleep_sort(&values).await?;
    let line: Vec<String> = sorted.iter().map(u32::to_string).collect();
    println!("{}", line.join(" "));
    Ok(())
}

fn print_units() {
    println!("{:<8} {:<7} {:>6} {:>14}", "unit", "symbol", "ratio", "flickers");
    for unit in UNIT_TABLE {
        println!(
            "{:<8} {:<7} {:>6} {:>14}",
            unit.name(),
            unit.symbol(),
            unit.ratio(),
            unit.flickers()
        );
    }
}
