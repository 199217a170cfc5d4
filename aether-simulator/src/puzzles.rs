//! Small programs that only make sense on a virtual clock.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::{yield_now, JoinSet};
use tracing::{debug, instrument};

use aether_core::time::{Duration, Instant};
use aether_core::Scheduler;

use crate::driver::{SimulationDriver, TickDriver};
use crate::SimulationError;

/// Sorts `values` by putting each one to sleep for `value + 1` breaths and
/// collecting them in wake-up order.
///
/// Every sleeper is registered before the clock moves, and the whole sort is
/// one `advance`, so this also shows the scheduler walking many instants inside
/// a single call. Values are ordered by the instant each sleeper woke at, which
/// keeps the result stable on multi-threaded runtimes as well.
#[instrument(level = "debug", skip_all, fields(len = values.len()))]
pub async fn sleep_sort(values: &[u32]) -> Result<Vec<u32>, SimulationError> {
    let Some(&max) = values.iter().max() else {
        return Ok(Vec::new());
    };

    let scheduler = Arc::new(Scheduler::new());
    let now = scheduler.now();
    let woken = Arc::new(Mutex::new(Vec::with_capacity(values.len())));
    let mut sleepers = JoinSet::new();
    for &value in values {
        let scheduler = scheduler.clone();
        let woken = woken.clone();
        let target = now + Duration::breaths(i64::from(value) + 1);
        sleepers.spawn(async move {
            let at = scheduler.wait_until(target).await?;
            woken.lock().push((at, value));
            Ok::<_, SimulationError>(())
        });
    }

    while scheduler.waiting() < values.len() {
        if let Some(done) = sleepers.try_join_next() {
            // a sleeper can only end early by failing
            done??;
        }
        yield_now().await;
    }

    let mut driver = TickDriver::new(scheduler, Duration::breaths(i64::from(max) + 1))?;
    driver.step().await?;

    while let Some(done) = sleepers.join_next().await {
        done??;
    }
    let mut woken = std::mem::take(&mut *woken.lock());
    woken.sort_by_key(|(at, _)| *at);
    Ok(woken.into_iter().map(|(_, value)| value).collect())
}

/// A labelled tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub label: String,
    pub children: Vec<Tree>,
}

impl Tree {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn node(label: impl Into<String>, children: Vec<Tree>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Label of a leaf closest to the root, found on a fresh scheduler.
pub async fn closest_leaf(tree: Tree) -> Result<String, SimulationError> {
    closest_leaf_on(Arc::new(Scheduler::new()), tree).await
}

/// Label of a leaf closest to the root.
///
/// A leaf answers at once; an inner node sleeps one breath and then searches
/// every child in its own task. The first branch to answer wins and the rest
/// are aborted mid-wait, so the answer arrives one breath per level below the
/// root. When the shallowest depth holds several leaves, any of them may be
/// returned.
pub async fn closest_leaf_on(
    scheduler: Arc<Scheduler>,
    tree: Tree,
) -> Result<String, SimulationError> {
    let start = scheduler.now();
    let root = tokio::spawn(search(scheduler.clone(), tree, start));
    let mut driver = TickDriver::new(scheduler, Duration::breaths(1))?;
    driver.run_until(root).await?
}

type Search = Pin<Box<dyn Future<Output = Result<String, SimulationError>> + Send>>;

fn search(scheduler: Arc<Scheduler>, node: Tree, t: Instant) -> Search {
    Box::pin(async move {
        if node.is_leaf() {
            debug!(label = %node.label, %t, "leaf reached");
            return Ok(node.label);
        }
        let t = scheduler.wait_until(t + Duration::breaths(1)).await?;

        let mut branches = JoinSet::new();
        for child in node.children {
            branches.spawn(search(scheduler.clone(), child, t));
        }
        let first = branches.join_next().await;
        branches.abort_all();
        match first {
            Some(found) => found?,
            None => unreachable!("a non-leaf has at least one child"),
        }
    })
}
