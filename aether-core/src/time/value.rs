//! Run-time checked time arithmetic.

use std::cmp::Ordering;
use std::fmt;

use super::{Duration, Instant};
use crate::error::TimeError;

/// Either kind of time value, for callers that only learn the operand kinds at
/// run time (scripted scenarios, parsed input). Unsupported combinations fail
/// with [`TimeError::TypeMismatch`] instead of being coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeValue {
    Instant(Instant),
    Duration(Duration),
}

impl TimeValue {
    pub const fn kind(&self) -> &'static str {
        match self {
            TimeValue::Instant(_) => "Instant",
            TimeValue::Duration(_) => "Duration",
        }
    }

    fn mismatch(op: &'static str, lhs: &Self, rhs: &Self) -> TimeError {
        TimeError::TypeMismatch {
            op,
            lhs: lhs.kind(),
            rhs: rhs.kind(),
        }
    }

    /// `Instant + Duration` and `Duration + Duration`.
    pub fn checked_add(self, rhs: TimeValue) -> Result<TimeValue, TimeError> {
        match (self, rhs) {
            (TimeValue::Instant(t), TimeValue::Duration(d)) => Ok(TimeValue::Instant(t + d)),
            (TimeValue::Duration(a), TimeValue::Duration(b)) => Ok(TimeValue::Duration(a + b)),
            (lhs, rhs) => Err(Self::mismatch("addition", &lhs, &rhs)),
        }
    }

    /// `Instant - Duration`, `Instant - Instant` and `Duration - Duration`.
    pub fn checked_sub(self, rhs: TimeValue) -> Result<TimeValue, TimeError> {
        match (self, rhs) {
            (TimeValue::Instant(t), TimeValue::Duration(d)) => Ok(TimeValue::Instant(t - d)),
            (TimeValue::Instant(a), TimeValue::Instant(b)) => Ok(TimeValue::Duration(a - b)),
            (TimeValue::Duration(a), TimeValue::Duration(b)) => Ok(TimeValue::Duration(a - b)),
            (lhs, rhs) => Err(Self::mismatch("subtraction", &lhs, &rhs)),
        }
    }

    /// Orders two values of the same kind.
    pub fn try_cmp(&self, rhs: &TimeValue) -> Result<Ordering, TimeError> {
        match (self, rhs) {
            (TimeValue::Instant(a), TimeValue::Instant(b)) => Ok(a.cmp(b)),
            (TimeValue::Duration(a), TimeValue::Duration(b)) => Ok(a.cmp(b)),
            (lhs, rhs) => Err(Self::mismatch("comparison", lhs, rhs)),
        }
    }

    pub fn try_eq(&self, rhs: &TimeValue) -> Result<bool, TimeError> {
        self.try_cmp(rhs).map(Ordering::is_eq)
    }

    pub fn try_lt(&self, rhs: &TimeValue) -> Result<bool, TimeError> {
        self.try_cmp(rhs).map(Ordering::is_lt)
    }

    pub fn as_instant(&self) -> Option<Instant> {
        match self {
            TimeValue::Instant(t) => Some(*t),
            TimeValue::Duration(_) => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            TimeValue::Duration(d) => Some(*d),
            TimeValue::Instant(_) => None,
        }
    }
}

impl From<Instant> for TimeValue {
    fn from(t: Instant) -> Self {
        TimeValue::Instant(t)
    }
}

impl From<Duration> for TimeValue {
    fn from(d: Duration) -> Self {
        TimeValue::Duration(d)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Instant(t) => t.fmt(f),
            TimeValue::Duration(d) => d.fmt(f),
        }
    }
}
