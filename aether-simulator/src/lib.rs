// aether-simulator/src/lib.rs

/*!
# Aether Simulator

Runs actors on the virtual clock provided by `aether-core`.

## Key Components:
- **Drivers:** [`driver::TickDriver`] advances the scheduler in fixed ticks, with an optional
  tick budget and real-time pacing.
- **Walkers:** actors that take one step per breath and journal every move.
- **Puzzles:** sleep sort and closest-leaf search, both timed purely in breaths.
- **Run report:** final time, scheduler statistics and a BLAKE3 hash of the journal, so two
  runs with the same configuration can be compared.
*/

use std::sync::Arc;

use opentelemetry::KeyValue;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use aether_config::AetherConfig;
use aether_core::stats::StatsSnapshot;
use aether_core::Scheduler;
use aether_telemetry::{EventLogger, MetricsRecorder};

pub mod driver;
pub mod error;
pub mod puzzles;
pub mod walker;

pub use error::SimulationError;

use driver::{SimulationDriver, TickDriver};
use walker::{Heading, Journal, Walker};

/// Outcome of one walker run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub final_time: String,
    pub final_flickers: i64,
    pub ticks: u64,
    pub walkers: usize,
    pub moves: usize,
    pub retired: usize,
    pub stats: StatsSnapshot,
    pub state_hash: String,
}

impl RunReport {
    pub fn validate_hash(&self, expected: &str) -> Result<(), SimulationError> {
        if self.state_hash.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(SimulationError::HashMismatch {
                expected: expected.to_string(),
                actual: self.state_hash.clone(),
            })
        }
    }
}

/// Spawns `config.demo.walkers` walkers, staggered by the configured stride, and
/// drives the clock until they have all retired or the tick budget runs out.
/// Walkers still alive at that point are killed.
pub async fn run_walkers(
    config: &AetherConfig,
    metrics: Option<MetricsRecorder>,
) -> Result<RunReport, SimulationError> {
    let epoch = config.scheduler.epoch();
    let scheduler = Arc::new(Scheduler::starting_at(epoch));
    let journal = Journal::new();
    let mut rng = StdRng::seed_from_u64(config.demo.seed);

    let stride = config.demo.stride();
    let walkers: Vec<_> = (0..config.demo.walkers)
        .map(|id| {
            let heading = Heading::ALL[rng.random_range(0..Heading::ALL.len())];
            let start = epoch + stride * id as i64;
            Walker::new(id, heading, journal.clone()).spawn(scheduler.clone(), start)
        })
        .collect();

    let mut driver = TickDriver::from_config(scheduler.clone(), &config.driver)?;
    if let Some(metrics) = metrics {
        driver = driver.with_metrics(metrics);
    }
    let now = driver.run().await?;

    let mut retired = 0;
    for walker in walkers {
        walker.die();
        if walker.join().await?.is_some() {
            retired += 1;
        }
    }

    let report = RunReport {
        final_time: now.to_string(),
        final_flickers: now.as_flickers(),
        ticks: driver.ticks(),
        walkers: config.demo.walkers,
        moves: journal.len(),
        retired,
        stats: scheduler.stats().snapshot(),
        state_hash: journal.state_hash(),
    };

    EventLogger::log_event(
        "run_complete",
        vec![
            KeyValue::new("final_time", report.final_time.clone()),
            KeyValue::new("moves", report.moves as i64),
            KeyValue::new("retired", report.retired as i64),
            KeyValue::new("state_hash", report.state_hash.clone()),
        ],
    )
    .await;
    info!(
        ticks = report.ticks,
        final_time = %report.final_time,
        "walker run finished"
    );

    Ok(report)
}
