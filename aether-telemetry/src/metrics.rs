//! ## aether-telemetry::metrics
//! **Prometheus view of scheduler activity**
//!
//! Counters mirror [`StatsSnapshot`]; the driver also feeds the wall-clock cost
//! of every advance into a histogram.

use aether_core::stats::StatsSnapshot;
use aether_core::time::Instant;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub registrations: IntCounter,
    pub wakeups: IntCounter,
    pub cancellations: IntCounter,
    pub rejected_waits: IntCounter,
    pub instants_processed: IntCounter,
    pub advances: IntCounter,
    pub virtual_time: IntGauge,
    pub advance_latency: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let registrations = counter("aether_wait_registrations_total", "Waits registered")?;
        let wakeups = counter("aether_wakeups_total", "Waiters released by their gate")?;
        let cancellations = counter(
            "aether_cancelled_waits_total",
            "Waiters dropped before their gate fired",
        )?;
        let rejected_waits = counter(
            "aether_rejected_waits_total",
            "Waits refused for a past or present instant",
        )?;
        let instants_processed = counter(
            "aether_instants_processed_total",
            "Instants fired and drained",
        )?;
        let advances = counter("aether_advances_total", "Calls to advance")?;

        let virtual_time = IntGauge::new("aether_virtual_time_flickers", "Current virtual time")?;
        registry.register(Box::new(virtual_time.clone()))?;

        let advance_latency = Histogram::with_opts(
            HistogramOpts::new(
                "aether_advance_latency_seconds",
                "Wall-clock time spent in one advance",
            )
            .buckets(vec![0.000_01, 0.000_1, 0.001, 0.01, 0.1, 1.0]),
        )?;
        registry.register(Box::new(advance_latency.clone()))?;

        Ok(Self {
            registry,
            registrations,
            wakeups,
            cancellations,
            rejected_waits,
            instants_processed,
            advances,
            virtual_time,
            advance_latency,
        })
    }

    /// Brings every counter up to `stats` and records the clock reading.
    pub fn observe(&self, stats: &StatsSnapshot, now: Instant) {
        catch_up(&self.registrations, stats.registrations);
        catch_up(&self.wakeups, stats.wakeups);
        catch_up(&self.cancellations, stats.cancellations);
        catch_up(&self.rejected_waits, stats.rejected_waits);
        catch_up(&self.instants_processed, stats.instants_processed);
        catch_up(&self.advances, stats.advances);
        self.virtual_time.set(now.as_flickers());
    }

    pub fn observe_advance_latency(&self, elapsed: std::time::Duration) {
        self.advance_latency.observe(elapsed.as_secs_f64());
    }

    /// Text exposition of everything registered.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Counters only go up; advance `counter` to `value` if it is behind.
fn catch_up(counter: &IntCounter, value: u64) {
    let seen = counter.get();
    if value > seen {
        counter.inc_by(value - seen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_is_idempotent_for_the_same_snapshot() {
        let metrics = MetricsRecorder::new().unwrap();
        let stats = StatsSnapshot {
            registrations: 4,
            wakeups: 3,
            cancellations: 1,
            rejected_waits: 0,
            instants_processed: 2,
            advances: 5,
        };
        metrics.observe(&stats, Instant::from_flickers(120));
        metrics.observe(&stats, Instant::from_flickers(120));

        assert_eq!(metrics.registrations.get(), 4);
        assert_eq!(metrics.wakeups.get(), 3);
        assert_eq!(metrics.advances.get(), 5);
        assert_eq!(metrics.virtual_time.get(), 120);
    }

    #[test]
    fn exposition_names_every_series() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.observe_advance_latency(std::time::Duration::from_micros(50));
        metrics.observe(&StatsSnapshot::default(), Instant::ZERO);

        let text = metrics.gather_metrics().unwrap();
        for name in [
            "aether_wait_registrations_total",
            "aether_wakeups_total",
            "aether_instants_processed_total",
            "aether_virtual_time_flickers",
            "aether_advance_latency_seconds_count 1",
        ] {
            assert!(text.contains(name), "missing {name} in\n{text}");
        }
    }
}
