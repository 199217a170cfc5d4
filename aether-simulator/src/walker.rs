//! Walker actors.
//!
//! A walker lives on the virtual clock: one breath after its start it goes
//! forward, one breath later it turns right, one more and it turns left, and on
//! the fourth breath it retires. Every move lands in a shared [`Journal`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use aether_core::time::{Duration, Instant};
use aether_core::{Scheduler, SchedulerError};

use crate::SimulationError;

/// The route every walker follows, one step per breath.
pub const ROUTE: [Direction; 3] = [Direction::Forward, Direction::Right, Direction::Left];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Forward,
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    fn turn(self, direction: Direction) -> Heading {
        let index = self as usize;
        let index = match direction {
            Direction::Forward => index,
            Direction::Right => (index + 1) % 4,
            Direction::Left => (index + 3) % 4,
        };
        Heading::ALL[index]
    }

    fn delta(self) -> (i64, i64) {
        match self {
            Heading::North => (0, 1),
            Heading::East => (1, 0),
            Heading::South => (0, -1),
            Heading::West => (-1, 0),
        }
    }
}

/// One journaled move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Move {
    pub walker: usize,
    pub at: Instant,
    pub direction: Direction,
    pub heading: Heading,
    pub position: (i64, i64),
}

/// Shared, append-only record of moves.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    moves: Arc<Mutex<Vec<Move>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, entry: Move) {
        self.moves.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.moves.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.lock().is_empty()
    }

    /// Moves in insertion order.
    pub fn moves(&self) -> Vec<Move> {
        self.moves.lock().clone()
    }

    /// Moves ordered by instant, then walker.
    pub fn sorted(&self) -> Vec<Move> {
        let mut moves = self.moves();
        moves.sort_by_key(|m| (m.at, m.walker));
        moves
    }

    /// BLAKE3 digest of the sorted journal, hex encoded.
    ///
    /// Wake-up order inside one instant is unspecified, so the digest is taken
    /// over the sorted moves.
    pub fn state_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for m in self.sorted() {
            hasher.update(&(m.walker as u64).to_le_bytes());
            hasher.update(&m.at.as_flickers().to_le_bytes());
            hasher.update(&[m.direction as u8, m.heading as u8]);
            hasher.update(&m.position.0.to_le_bytes());
            hasher.update(&m.position.1.to_le_bytes());
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

#[derive(Debug)]
pub struct Walker {
    id: usize,
    heading: Heading,
    position: (i64, i64),
    journal: Journal,
}

impl Walker {
    pub fn new(id: usize, heading: Heading, journal: Journal) -> Self {
        Self {
            id,
            heading,
            position: (0, 0),
            journal,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn position(&self) -> (i64, i64) {
        self.position
    }

    /// Turns as asked, takes one step and journals it.
    pub fn go(&mut self, direction: Direction, at: Instant) {
        self.heading = self.heading.turn(direction);
        let (dx, dy) = self.heading.delta();
        self.position = (self.position.0 + dx, self.position.1 + dy);
        debug!(walker = self.id, %at, ?direction, position = ?self.position, "walker moved");
        self.journal.record(Move {
            walker: self.id,
            at,
            direction,
            heading: self.heading,
            position: self.position,
        });
    }

    /// Starts the walker's life on `scheduler`, counting breaths from `start`.
    pub fn spawn(self, scheduler: Arc<Scheduler>, start: Instant) -> WalkerHandle {
        let id = self.id;
        WalkerHandle {
            id,
            life: tokio::spawn(self.live(scheduler, start)),
        }
    }

    async fn live(
        mut self,
        scheduler: Arc<Scheduler>,
        start: Instant,
    ) -> Result<Instant, SchedulerError> {
        let mut t = start;
        for direction in ROUTE {
            t = scheduler.wait_until(t + Duration::breaths(1)).await?;
            self.go(direction, t);
        }
        t = scheduler.wait_until(t + Duration::breaths(1)).await?;
        debug!(walker = self.id, %t, "walker retired");
        Ok(t)
    }
}

/// Handle to a spawned walker.
#[derive(Debug)]
pub struct WalkerHandle {
    id: usize,
    life: JoinHandle<Result<Instant, SchedulerError>>,
}

impl WalkerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Ends the walker wherever it is; a pending wait is released.
    pub fn die(&self) {
        self.life.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.life.is_finished()
    }

    /// Waits for the walker to end. `Ok(None)` means it was killed.
    pub async fn join(self) -> Result<Option<Instant>, SimulationError> {
        match self.life.await {
            Ok(retired) => Ok(Some(retired?)),
            Err(e) if e.is_cancelled() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SimulationDriver, TickDriver};

    #[test]
    fn turning_follows_the_compass() {
        assert_eq!(Heading::North.turn(Direction::Right), Heading::East);
        assert_eq!(Heading::North.turn(Direction::Left), Heading::West);
        assert_eq!(Heading::West.turn(Direction::Right), Heading::North);
        assert_eq!(Heading::South.turn(Direction::Forward), Heading::South);
    }

    #[test]
    fn go_steps_after_turning() {
        let journal = Journal::new();
        let mut walker = Walker::new(0, Heading::North, journal.clone());
        walker.go(Direction::Forward, Instant::from_flickers(60));
        walker.go(Direction::Right, Instant::from_flickers(120));
        walker.go(Direction::Left, Instant::from_flickers(180));
        assert_eq!(walker.position(), (1, 2));
        assert_eq!(walker.heading(), Heading::North);
        assert_eq!(journal.len(), 3);
    }

    #[tokio::test]
    async fn walker_moves_once_per_breath_then_retires() {
        let scheduler = Arc::new(Scheduler::new());
        let journal = Journal::new();
        let handle =
            Walker::new(7, Heading::East, journal.clone()).spawn(scheduler.clone(), Instant::ZERO);

        let mut driver = TickDriver::new(scheduler.clone(), Duration::breaths(1)).unwrap();
        driver.run().await.unwrap();

        let moves = journal.moves();
        let instants: Vec<_> = moves.iter().map(|m| m.at.as_flickers()).collect();
        assert_eq!(instants, vec![60, 120, 180]);
        assert_eq!(
            moves.iter().map(|m| m.direction).collect::<Vec<_>>(),
            ROUTE.to_vec()
        );
        assert_eq!(handle.join().await.unwrap(), Some(Instant::from_flickers(240)));
        assert_eq!(scheduler.now(), Instant::from_flickers(240));
    }

    #[tokio::test]
    async fn killed_walker_stops_moving_and_releases_its_wait() {
        let scheduler = Arc::new(Scheduler::new());
        let journal = Journal::new();
        let handle =
            Walker::new(1, Heading::North, journal.clone()).spawn(scheduler.clone(), Instant::ZERO);

        let mut driver = TickDriver::new(scheduler.clone(), Duration::breaths(1)).unwrap();
        driver.step().await.unwrap();
        assert_eq!(journal.len(), 1);

        handle.die();
        assert_eq!(handle.join().await.unwrap(), None);
        assert_eq!(scheduler.waiting(), 0);

        driver.run().await.unwrap();
        assert_eq!(journal.len(), 1);
    }

    #[tokio::test]
    async fn hash_ignores_wake_order_within_an_instant() {
        let a = Journal::new();
        let b = Journal::new();
        let first = Move {
            walker: 0,
            at: Instant::from_flickers(60),
            direction: Direction::Forward,
            heading: Heading::North,
            position: (0, 1),
        };
        let second = Move { walker: 1, ..first };
        a.record(first);
        a.record(second);
        b.record(second);
        b.record(first);
        assert_eq!(a.state_hash(), b.state_hash());
        assert_ne!(a.state_hash(), Journal::new().state_hash());
    }
}
