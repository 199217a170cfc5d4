//! ## aether-core::stats
//! **Scheduler activity counters**
//!
//! Tracks what the scheduler has done over its lifetime. Counters use relaxed
//! atomics; a [`StatsSnapshot`] is a point-in-time copy for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lifetime counters of one scheduler.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    registrations: AtomicU64,
    wakeups: AtomicU64,
    cancellations: AtomicU64,
    rejected_waits: AtomicU64,
    instants_processed: AtomicU64,
    advances: AtomicU64,
}

/// Copy of [`SchedulerStats`] at one moment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub registrations: u64,
    pub wakeups: u64,
    pub cancellations: u64,
    pub rejected_waits: u64,
    pub instants_processed: u64,
    pub advances: u64,
}

impl SchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_wakeup(&self) {
        self.wakeups.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected_wait(&self) {
        self.rejected_waits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_instant_processed(&self) {
        self.instants_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_advance(&self) {
        self.advances.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            wakeups: self.wakeups.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            rejected_waits: self.rejected_waits.load(Ordering::Relaxed),
            instants_processed: self.instants_processed.load(Ordering::Relaxed),
            advances: self.advances.load(Ordering::Relaxed),
        }
    }
}
