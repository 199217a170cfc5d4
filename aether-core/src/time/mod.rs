//! ## aether-core::time
//! **Fixed-point virtual time**
//!
//! [`Instant`] is a point on the simulated timeline and [`Duration`] a signed
//! offset between two points. Both count flickers in an `i64`, which covers
//! roughly 8.9 billion chronicles either side of zero.
//!
//! Arithmetic is only defined for the shapes that make sense:
//!
//! - `Instant + Duration -> Instant`
//! - `Instant - Duration -> Instant`
//! - `Instant - Instant -> Duration`
//! - `Duration +/- Duration -> Duration`
//!
//! Anything else does not compile. [`TimeValue`] carries the same rules for
//! callers that only know the operand kinds at run time.

mod format;
mod units;
mod value;

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

pub use units::{
    DurationSpec, TimeUnit, BREATHS_PER_SPAN, CYCLES_PER_VEIL, FLICKERS_PER_BREATH,
    SPANS_PER_TURN, TURNS_PER_CYCLE, UNIT_TABLE, VEILS_PER_CHRONICLE,
};
pub use value::TimeValue;

/// A point on the virtual timeline, in flickers since the zero instant.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Instant(i64);

/// A signed span of virtual time, in flickers.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Duration(i64);

impl Instant {
    pub const ZERO: Instant = Instant(0);

    #[inline]
    pub const fn from_flickers(flickers: i64) -> Self {
        Self(flickers)
    }

    #[inline]
    pub const fn as_flickers(self) -> i64 {
        self.0
    }

    /// Offset of this instant from [`Instant::ZERO`].
    #[inline]
    pub const fn since_zero(self) -> Duration {
        Duration(self.0)
    }

    pub fn checked_add(self, rhs: Duration) -> Option<Instant> {
        self.0.checked_add(rhs.0).map(Instant)
    }

    pub fn checked_sub(self, rhs: Duration) -> Option<Instant> {
        self.0.checked_sub(rhs.0).map(Instant)
    }

    pub fn checked_duration_since(self, earlier: Instant) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration)
    }
}

impl Duration {
    pub const ZERO: Duration = Duration(0);

    #[inline]
    pub const fn from_flickers(flickers: i64) -> Self {
        Self(flickers)
    }

    #[inline]
    pub const fn as_flickers(self) -> i64 {
        self.0
    }

    /// `count` whole units of `unit`.
    #[inline]
    pub const fn of(count: i64, unit: TimeUnit) -> Self {
        Self(count * unit.flickers())
    }

    pub const fn flickers(count: i64) -> Self {
        Self::of(count, TimeUnit::Flicker)
    }

    pub const fn breaths(count: i64) -> Self {
        Self::of(count, TimeUnit::Breath)
    }

    pub const fn spans(count: i64) -> Self {
        Self::of(count, TimeUnit::Span)
    }

    pub const fn turns(count: i64) -> Self {
        Self::of(count, TimeUnit::Turn)
    }

    pub const fn cycles(count: i64) -> Self {
        Self::of(count, TimeUnit::Cycle)
    }

    pub const fn veils(count: i64) -> Self {
        Self::of(count, TimeUnit::Veil)
    }

    pub const fn chronicles(count: i64) -> Self {
        Self::of(count, TimeUnit::Chronicle)
    }

    /// Builds a duration from a configuration of unit quantities.
    pub fn from_spec(spec: &DurationSpec) -> Self {
        spec.to_duration()
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Duration) -> Option<Duration> {
        self.0.checked_add(rhs.0).map(Duration)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    #[inline]
    fn add(self, rhs: Duration) -> Instant {
        Instant(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Instant {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    #[inline]
    fn sub(self, rhs: Duration) -> Instant {
        Instant(self.0 - rhs.0)
    }
}

impl SubAssign<Duration> for Instant {
    #[inline]
    fn sub_assign(&mut self, rhs: Duration) {
        self.0 -= rhs.0;
    }
}

impl Sub<Instant> for Instant {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Instant) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Add for Duration {
    type Output = Duration;

    #[inline]
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Neg for Duration {
    type Output = Duration;

    #[inline]
    fn neg(self) -> Duration {
        Duration(-self.0)
    }
}

impl Mul<i64> for Duration {
    type Output = Duration;

    #[inline]
    fn mul(self, rhs: i64) -> Duration {
        Duration(self.0 * rhs)
    }
}

impl std::iter::Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Self {
        iter.fold(Duration::ZERO, Add::add)
    }
}
