//! Drivers push virtual time forward for a simulation.
//!
//! A driver is the only caller of [`Scheduler::advance`]; owning one per run
//! keeps advances serialised.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::{yield_now, JoinHandle};
use tracing::{debug, instrument, trace};

use aether_config::DriverConfig;
use aether_core::time::{Duration, Instant};
use aether_core::Scheduler;
use aether_telemetry::MetricsRecorder;

use crate::SimulationError;

#[async_trait]
pub trait SimulationDriver: Send + Sync {
    /// Advances the clock by one step and returns the new time.
    async fn step(&mut self) -> Result<Instant, SimulationError>;

    /// Steps until the tick budget is spent or no wait is pending.
    async fn run(&mut self) -> Result<Instant, SimulationError>;
}

/// Advances the clock by a fixed tick, optionally pacing ticks in real time.
pub struct TickDriver {
    scheduler: Arc<Scheduler>,
    tick: Duration,
    max_ticks: u64,
    pacing: Option<std::time::Duration>,
    ticks: u64,
    metrics: Option<MetricsRecorder>,
}

impl TickDriver {
    pub fn new(scheduler: Arc<Scheduler>, tick: Duration) -> Result<Self, SimulationError> {
        if tick.as_flickers() <= 0 {
            return Err(SimulationError::InvalidTick(tick));
        }
        Ok(Self {
            scheduler,
            tick,
            max_ticks: u64::MAX,
            pacing: None,
            ticks: 0,
            metrics: None,
        })
    }

    pub fn from_config(
        scheduler: Arc<Scheduler>,
        config: &DriverConfig,
    ) -> Result<Self, SimulationError> {
        let mut driver = Self::new(scheduler, config.tick())?.with_max_ticks(config.max_ticks);
        driver.pacing = config.pacing();
        Ok(driver)
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn with_pacing(mut self, pacing: std::time::Duration) -> Self {
        self.pacing = Some(pacing);
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Ticks taken so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Yields to the executor until no new waits appear, so tasks spawned since
    /// the last tick register against the current time rather than a later one.
    async fn settle(&self) {
        let mut seen = self.scheduler.waiting();
        loop {
            yield_now().await;
            let waiting = self.scheduler.waiting();
            if waiting == seen {
                break;
            }
            trace!(waiting, "new waits registered while settling");
            seen = waiting;
        }
    }

    /// Steps until `task` completes and returns its output.
    ///
    /// Fails with [`SimulationError::Stalled`] if the task is still running
    /// while nothing is pending on the clock.
    #[instrument(level = "debug", skip_all)]
    pub async fn run_until<T: Send + 'static>(
        &mut self,
        task: JoinHandle<T>,
    ) -> Result<T, SimulationError> {
        loop {
            self.settle().await;
            if task.is_finished() {
                return Ok(task.await?);
            }
            if self.scheduler.pending_instants() == 0 {
                task.abort();
                return Err(SimulationError::Stalled(self.scheduler.now()));
            }
            self.step().await?;
        }
    }
}

#[async_trait]
impl SimulationDriver for TickDriver {
    async fn step(&mut self) -> Result<Instant, SimulationError> {
        if self.ticks >= self.max_ticks {
            return Err(SimulationError::TickBudgetExhausted(self.max_ticks));
        }
        self.settle().await;

        let started = std::time::Instant::now();
        let now = self.scheduler.advance(self.tick).await;
        self.ticks += 1;
        trace!(tick = self.ticks, %now, "tick");

        if let Some(metrics) = &self.metrics {
            metrics.observe_advance_latency(started.elapsed());
            metrics.observe(&self.scheduler.stats().snapshot(), now);
        }
        if let Some(pacing) = self.pacing {
            tokio::time::sleep(pacing).await;
        }
        Ok(now)
    }

    #[instrument(level = "debug", skip_all)]
    async fn run(&mut self) -> Result<Instant, SimulationError> {
        loop {
            self.settle().await;
            if self.ticks >= self.max_ticks || self.scheduler.pending_instants() == 0 {
                let now = self.scheduler.now();
                debug!(ticks = self.ticks, %now, "driver idle");
                return Ok(now);
            }
            self.step().await?;
        }
    }
}
