//! ## aether-core::scheduler
//! **Virtual-time scheduler with drain barriers**
//!
//! Actors suspend with [`Scheduler::wait_until`] until the virtual clock reaches
//! a strictly-future instant. A single driver moves the clock with
//! [`Scheduler::advance`], which visits pending instants in ascending order and,
//! for each one, publishes the new time, releases every waiter and then parks
//! until all of them have run to their next suspension point (or finished)
//! before looking at the next instant.
//!
//! ### Guarantees:
//! - Instants are processed in strictly ascending order.
//! - A waiter observes its wake-up only after `now()` equals its instant.
//! - Everything woken at `t` has finished or re-suspended at a later instant
//!   before `advance` moves past `t`.
//!
//! The last guarantee relies on actors and driver sharing one cooperative
//! executor thread (tokio `current_thread` runtime or a `LocalSet`). The state
//! itself sits behind one mutex, so the scheduler is `Send + Sync` and stays
//! consistent on a multi-threaded runtime too.
//!
//! Only one `advance` may be in flight at a time. Callers serialise drivers.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tracing::{debug, instrument, trace, warn};

use crate::error::SchedulerError;
use crate::stats::SchedulerStats;
use crate::time::{Duration, Instant};

/// Waiters registered for one instant.
struct Slot {
    /// One-shot broadcast: flips to `true` once the instant is reached.
    gate: watch::Sender<bool>,
    /// Tasks currently suspended on `gate`.
    outstanding: usize,
}

impl Slot {
    fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            gate,
            outstanding: 0,
        }
    }
}

struct State {
    current: Instant,
    /// Distinct instants with a slot, earliest first.
    pending: BinaryHeap<Reverse<Instant>>,
    slots: HashMap<Instant, Slot>,
}

/// Coordinator of one simulation's virtual timeline.
///
/// Construct one per simulation run and share it with `Arc`.
pub struct Scheduler {
    state: Mutex<State>,
    drained: Notify,
    stats: SchedulerStats,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates a scheduler whose clock reads [`Instant::ZERO`].
    pub fn new() -> Self {
        Self::starting_at(Instant::ZERO)
    }

    /// Creates a scheduler whose clock starts at `epoch`.
    pub fn starting_at(epoch: Instant) -> Self {
        Self {
            state: Mutex::new(State {
                current: epoch,
                pending: BinaryHeap::new(),
                slots: HashMap::new(),
            }),
            drained: Notify::new(),
            stats: SchedulerStats::new(),
        }
    }

    /// The authoritative virtual time.
    pub fn now(&self) -> Instant {
        self.state.lock().current
    }

    /// Earliest instant that still has a registered slot.
    pub fn next_pending(&self) -> Option<Instant> {
        self.state.lock().pending.peek().map(|Reverse(at)| *at)
    }

    /// Number of distinct instants awaiting processing.
    pub fn pending_instants(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Tasks currently suspended at `at`.
    pub fn outstanding(&self, at: Instant) -> usize {
        self.state
            .lock()
            .slots
            .get(&at)
            .map_or(0, |slot| slot.outstanding)
    }

    /// Tasks currently suspended at any instant.
    pub fn waiting(&self) -> usize {
        self.state
            .lock()
            .slots
            .values()
            .map(|slot| slot.outstanding)
            .sum()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Suspends the caller until the clock reaches exactly `instant`.
    ///
    /// Fails with [`SchedulerError::PastOrPresentTime`] unless `instant` is
    /// strictly later than [`Scheduler::now`]; nothing is registered in that
    /// case. Dropping the returned future while suspended (for instance when
    /// the owning task is aborted) releases its place in the drain barrier.
    pub async fn wait_until(&self, instant: Instant) -> Result<Instant, SchedulerError> {
        let mut gate = self.register(instant)?;
        let mut guard = WaitGuard {
            scheduler: self,
            instant,
            woken: false,
        };

        gate.wait_for(|fired| *fired)
            .await
            .map_err(|_| SchedulerError::GateClosed(instant))?;

        guard.woken = true;
        Ok(instant)
    }

    /// Suspends the caller for `duration` past the current time.
    pub async fn wait_for(&self, duration: Duration) -> Result<Instant, SchedulerError> {
        self.wait_until(self.now() + duration).await
    }

    /// Would resume once every task scheduled up to and including `instant`
    /// has run, without occupying a slot of its own. Not implemented yet.
    pub async fn wait_idle_after(&self, instant: Instant) -> Result<Instant, SchedulerError> {
        debug!(%instant, "wait_idle_after requested");
        Err(SchedulerError::NotSupported("wait_idle_after"))
    }

    fn register(&self, instant: Instant) -> Result<watch::Receiver<bool>, SchedulerError> {
        let mut state = self.state.lock();
        if instant <= state.current {
            self.stats.record_rejected_wait();
            return Err(SchedulerError::PastOrPresentTime {
                requested: instant,
                current: state.current,
            });
        }

        let State { pending, slots, .. } = &mut *state;
        let slot = slots.entry(instant).or_insert_with(|| {
            pending.push(Reverse(instant));
            Slot::new()
        });
        slot.outstanding += 1;
        self.stats.record_registration();
        debug!(%instant, outstanding = slot.outstanding, "waiter registered");
        Ok(slot.gate.subscribe())
    }

    fn release(&self, instant: Instant, woken: bool) {
        if woken {
            self.stats.record_wakeup();
        } else {
            self.stats.record_cancellation();
        }

        let mut state = self.state.lock();
        let Some(slot) = state.slots.get_mut(&instant) else {
            warn!(%instant, "released a waiter with no slot");
            return;
        };
        slot.outstanding = slot.outstanding.saturating_sub(1);
        if slot.outstanding == 0 {
            drop(state);
            self.drained.notify_waiters();
        }
    }

    /// Moves the clock forward by `duration`, returning the new time.
    ///
    /// Each pending instant up to `now() + duration` is fired in ascending
    /// order and drained before the next one is considered. Waits registered
    /// while draining are picked up in the same call when they fall inside the
    /// target. The clock ends at the target even when no instant was pending.
    ///
    /// A negative `duration` is ignored: the clock never runs backwards.
    #[instrument(level = "debug", skip_all, fields(duration = %duration))]
    pub async fn advance(&self, duration: Duration) -> Instant {
        self.stats.record_advance();
        if duration.is_negative() {
            warn!(%duration, "refusing to move the clock backwards");
            return self.now();
        }

        let target = self.now() + duration;
        while let Some(instant) = self.fire_next(target) {
            self.drain(instant).await;
            self.stats.record_instant_processed();
        }

        let mut state = self.state.lock();
        state.current = target;
        trace!(%target, "advance complete");
        target
    }

    /// Pops the earliest pending instant if it is due, publishes it as the
    /// current time and opens its gate.
    fn fire_next(&self, target: Instant) -> Option<Instant> {
        let mut state = self.state.lock();
        let instant = match state.pending.peek() {
            Some(Reverse(next)) if *next <= target => *next,
            _ => return None,
        };
        state.pending.pop();
        state.current = instant;

        if let Some(slot) = state.slots.get(&instant) {
            debug!(%instant, waiters = slot.outstanding, "firing");
            slot.gate.send_replace(true);
        }
        Some(instant)
    }

    /// Parks until nothing is suspended at `instant`, then retires its slot.
    async fn drain(&self, instant: Instant) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                let remaining = state
                    .slots
                    .get(&instant)
                    .map_or(0, |slot| slot.outstanding);
                if remaining == 0 {
                    state.slots.remove(&instant);
                    return;
                }
                trace!(%instant, remaining, "draining");
            }

            notified.await;
        }
    }
}

/// Keeps a waiter counted at its instant until the wait ends, however it ends.
struct WaitGuard<'a> {
    scheduler: &'a Scheduler,
    instant: Instant,
    woken: bool,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.release(self.instant, self.woken);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::{poll_fn, Future};
    use std::sync::Arc;
    use std::task::Poll;

    use proptest::prelude::*;
    use tokio::task::yield_now;

    fn at(flickers: i64) -> Instant {
        Instant::from_flickers(flickers)
    }

    /// Lets spawned tasks run until `count` of them are suspended.
    async fn settle(scheduler: &Scheduler, count: usize) {
        while scheduler.waiting() < count {
            yield_now().await;
        }
    }

    #[tokio::test]
    async fn advance_without_waiters_reaches_target() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.advance(Duration::breaths(2)).await, at(120));
        assert_eq!(scheduler.now(), at(120));
        assert_eq!(scheduler.stats().snapshot().advances, 1);
    }

    #[tokio::test]
    async fn starts_at_epoch() {
        let scheduler = Scheduler::starting_at(at(500));
        scheduler.advance(Duration::flickers(10)).await;
        assert_eq!(scheduler.now(), at(510));
    }

    #[tokio::test]
    async fn rejects_present_and_past_without_mutation() {
        let scheduler = Scheduler::starting_at(at(60));
        for requested in [at(60), at(0), at(-5)] {
            assert_eq!(
                scheduler.wait_until(requested).await,
                Err(SchedulerError::PastOrPresentTime {
                    requested,
                    current: at(60),
                })
            );
        }
        assert_eq!(scheduler.pending_instants(), 0);
        assert_eq!(scheduler.waiting(), 0);
        let stats = scheduler.stats().snapshot();
        assert_eq!(stats.rejected_waits, 3);
        assert_eq!(stats.registrations, 0);
    }

    #[tokio::test]
    async fn wait_idle_after_is_not_supported() {
        let scheduler = Scheduler::new();
        assert_eq!(
            scheduler.wait_idle_after(at(10)).await,
            Err(SchedulerError::NotSupported("wait_idle_after"))
        );
        assert_eq!(scheduler.pending_instants(), 0);
    }

    #[tokio::test]
    async fn same_instant_waiters_are_released_together_and_in_order() {
        let scheduler = Arc::new(Scheduler::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (label, wake) in [("a", 60), ("b", 60), ("c", 120)] {
            let scheduler = scheduler.clone();
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let woke = scheduler.wait_until(at(wake)).await?;
                log.lock().push((label, scheduler.now()));
                Ok::<_, SchedulerError>(woke)
            }));
        }
        settle(&scheduler, 3).await;
        assert_eq!(scheduler.pending_instants(), 2);
        assert_eq!(scheduler.outstanding(at(60)), 2);
        assert_eq!(scheduler.next_pending(), Some(at(60)));

        assert_eq!(scheduler.advance(Duration::flickers(120)).await, at(120));

        let log = log.lock().clone();
        assert_eq!(log.len(), 3);
        assert!(log[..2].iter().all(|(_, seen)| *seen == at(60)));
        assert_eq!(log[2], ("c", at(120)));
        assert_eq!(scheduler.now(), at(120));
        assert_eq!(scheduler.pending_instants(), 0);

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        let stats = scheduler.stats().snapshot();
        assert_eq!(stats.wakeups, 3);
        assert_eq!(stats.instants_processed, 2);
    }

    #[tokio::test]
    async fn never_wakes_early() {
        let scheduler = Arc::new(Scheduler::new());
        let waiter = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.wait_until(at(120)).await }
        });
        settle(&scheduler, 1).await;

        scheduler.advance(Duration::flickers(119)).await;
        for _ in 0..10 {
            yield_now().await;
        }
        assert!(!waiter.is_finished());
        assert_eq!(scheduler.outstanding(at(120)), 1);

        scheduler.advance(Duration::flickers(1)).await;
        assert_eq!(waiter.await.unwrap(), Ok(at(120)));
        assert_eq!(scheduler.stats().snapshot().wakeups, 1);
    }

    #[tokio::test]
    async fn cascading_waits_inside_the_target_run_in_the_same_advance() {
        let scheduler = Arc::new(Scheduler::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let walker = tokio::spawn({
            let scheduler = scheduler.clone();
            let log = log.clone();
            async move {
                let mut t = scheduler.wait_until(at(60)).await?;
                log.lock().push(scheduler.now());
                t = scheduler.wait_until(t + Duration::flickers(30)).await?;
                log.lock().push(scheduler.now());
                // Lands past the target; must stay pending.
                scheduler.wait_until(t + Duration::breaths(1)).await
            }
        });
        settle(&scheduler, 1).await;

        scheduler.advance(Duration::breaths(2)).await;
        assert_eq!(*log.lock(), vec![at(60), at(90)]);
        assert_eq!(scheduler.next_pending(), Some(at(150)));
        assert!(!walker.is_finished());

        scheduler.advance(Duration::breaths(1)).await;
        assert_eq!(walker.await.unwrap(), Ok(at(150)));
    }

    #[tokio::test]
    async fn later_instant_sees_effects_of_earlier_one() {
        let scheduler = Arc::new(Scheduler::new());
        let counter = Arc::new(Mutex::new(0u32));

        for _ in 0..5 {
            let scheduler = scheduler.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                scheduler.wait_until(at(10)).await?;
                *counter.lock() += 1;
                Ok::<_, SchedulerError>(())
            });
        }
        let observer = tokio::spawn({
            let scheduler = scheduler.clone();
            let counter = counter.clone();
            async move {
                scheduler.wait_until(at(11)).await?;
                Ok::<_, SchedulerError>(*counter.lock())
            }
        });
        settle(&scheduler, 6).await;

        scheduler.advance(Duration::flickers(11)).await;
        assert_eq!(observer.await.unwrap(), Ok(5));
    }

    #[tokio::test]
    async fn aborted_waiter_does_not_stall_the_drain() {
        let scheduler = Arc::new(Scheduler::new());
        let doomed = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.wait_until(at(60)).await }
        });
        let survivor = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.wait_until(at(60)).await }
        });
        settle(&scheduler, 2).await;

        doomed.abort();
        assert!(doomed.await.unwrap_err().is_cancelled());
        assert_eq!(scheduler.outstanding(at(60)), 1);

        let advanced = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            scheduler.advance(Duration::breaths(1)),
        )
        .await;
        assert_eq!(advanced, Ok(at(60)));
        assert_eq!(survivor.await.unwrap(), Ok(at(60)));

        let stats = scheduler.stats().snapshot();
        assert_eq!(stats.cancellations, 1);
        assert_eq!(stats.wakeups, 1);
    }

    #[tokio::test]
    async fn waiter_dropped_after_its_gate_fired_is_released() {
        let scheduler = Scheduler::new();

        let mut wait = Box::pin(scheduler.wait_until(at(60)));
        poll_fn(|cx| {
            assert!(wait.as_mut().poll(cx).is_pending());
            Poll::Ready(())
        })
        .await;
        assert_eq!(scheduler.outstanding(at(60)), 1);

        // first poll fires the gate and parks in the drain
        let mut advance = Box::pin(scheduler.advance(Duration::breaths(1)));
        poll_fn(|cx| {
            assert!(advance.as_mut().poll(cx).is_pending());
            Poll::Ready(())
        })
        .await;
        assert_eq!(scheduler.now(), at(60));
        assert_eq!(scheduler.outstanding(at(60)), 1);

        drop(wait);
        assert_eq!(scheduler.outstanding(at(60)), 0);

        let advanced =
            tokio::time::timeout(std::time::Duration::from_secs(5), advance).await;
        assert_eq!(advanced, Ok(at(60)));
        assert_eq!(scheduler.pending_instants(), 0);

        let stats = scheduler.stats().snapshot();
        assert_eq!(stats.wakeups, 0);
        assert_eq!(stats.cancellations, 1);
        assert_eq!(stats.instants_processed, 1);
    }

    #[tokio::test]
    async fn instant_with_only_cancelled_waiters_is_still_retired() {
        let scheduler = Arc::new(Scheduler::new());
        let doomed = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.wait_until(at(30)).await }
        });
        settle(&scheduler, 1).await;
        doomed.abort();
        let _ = doomed.await;

        assert_eq!(scheduler.pending_instants(), 1);
        scheduler.advance(Duration::breaths(1)).await;
        assert_eq!(scheduler.pending_instants(), 0);
        assert_eq!(scheduler.outstanding(at(30)), 0);
    }

    #[tokio::test]
    async fn retired_instant_cannot_be_reused() {
        let scheduler = Arc::new(Scheduler::new());
        let first = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.wait_until(at(60)).await }
        });
        settle(&scheduler, 1).await;
        scheduler.advance(Duration::breaths(1)).await;
        assert_eq!(first.await.unwrap(), Ok(at(60)));

        assert!(matches!(
            scheduler.wait_until(at(60)).await,
            Err(SchedulerError::PastOrPresentTime { .. })
        ));
    }

    #[tokio::test]
    async fn wait_for_is_relative_to_now() {
        let scheduler = Arc::new(Scheduler::starting_at(at(100)));
        let waiter = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.wait_for(Duration::breaths(1)).await }
        });
        settle(&scheduler, 1).await;
        assert_eq!(scheduler.next_pending(), Some(at(160)));
        scheduler.advance(Duration::breaths(1)).await;
        assert_eq!(waiter.await.unwrap(), Ok(at(160)));
    }

    #[tokio::test]
    async fn negative_advance_leaves_the_clock() {
        let scheduler = Scheduler::starting_at(at(10));
        assert_eq!(scheduler.advance(Duration::flickers(-5)).await, at(10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_waiter_wakes_once_on_a_thread_pool() {
        let scheduler = Arc::new(Scheduler::new());
        let handles: Vec<_> = (1..=100)
            .map(|i| {
                let scheduler = scheduler.clone();
                tokio::spawn(async move { scheduler.wait_until(at(i % 7 + 1)).await })
            })
            .collect();
        while scheduler.waiting() < 100 {
            yield_now().await;
        }

        scheduler.advance(Duration::flickers(7)).await;
        for (i, handle) in (1..=100).zip(handles) {
            assert_eq!(handle.await.unwrap(), Ok(at(i % 7 + 1)));
        }
        assert_eq!(scheduler.stats().snapshot().wakeups, 100);
        assert_eq!(scheduler.pending_instants(), 0);
    }

    proptest! {
        #[test]
        fn split_advances_compose(d1 in 0i64..1_000_000_000, d2 in 0i64..1_000_000_000) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (split, whole) = runtime.block_on(async {
                let split = Scheduler::new();
                split.advance(Duration::from_flickers(d1)).await;
                split.advance(Duration::from_flickers(d2)).await;

                let whole = Scheduler::new();
                whole.advance(Duration::from_flickers(d1 + d2)).await;
                (split.now(), whole.now())
            });
            prop_assert_eq!(split, whole);
        }
    }
}
