//! ## aether-core::time::units
//! **Named multiples of the flicker**
//!
//! Each unit is an exact integer multiple of the previous one:
//!
//! | Unit      | Symbol | Ratio to previous | Flickers        |
//! |-----------|--------|-------------------|-----------------|
//! | Flicker   | `fk`   | -                 | 1               |
//! | Breath    | `br`   | 60                | 60              |
//! | Span      | `sp`   | 50                | 3 000           |
//! | Turn      | `tn`   | 40                | 120 000         |
//! | Cycle     | `cy`   | 20                | 2 400 000       |
//! | Veil      | `vl`   | 36                | 86 400 000      |
//! | Chronicle | `ch`   | 12                | 1 036 800 000   |

use serde::{Deserialize, Serialize};

use super::Duration;

pub const FLICKERS_PER_BREATH: i64 = 60;
pub const BREATHS_PER_SPAN: i64 = 50;
pub const SPANS_PER_TURN: i64 = 40;
pub const TURNS_PER_CYCLE: i64 = 20;
pub const CYCLES_PER_VEIL: i64 = 36;
pub const VEILS_PER_CHRONICLE: i64 = 12;

/// A named unit of virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    /// The smallest perceptible pulse; the indivisible base unit.
    Flicker,
    /// A natural rhythm, roughly a second.
    Breath,
    /// A working unit, roughly a minute.
    Span,
    /// A daytime block, roughly an hour.
    Turn,
    /// A major phase, roughly a day.
    Cycle,
    /// A season-like period.
    Veil,
    /// A year-equivalent.
    Chronicle,
}

/// All units, smallest first.
pub const UNIT_TABLE: [TimeUnit; 7] = [
    TimeUnit::Flicker,
    TimeUnit::Breath,
    TimeUnit::Span,
    TimeUnit::Turn,
    TimeUnit::Cycle,
    TimeUnit::Veil,
    TimeUnit::Chronicle,
];

impl TimeUnit {
    /// Multiplier relative to the previous (smaller) unit.
    pub const fn ratio(self) -> i64 {
        match self {
            TimeUnit::Flicker => 1,
            TimeUnit::Breath => FLICKERS_PER_BREATH,
            TimeUnit::Span => BREATHS_PER_SPAN,
            TimeUnit::Turn => SPANS_PER_TURN,
            TimeUnit::Cycle => TURNS_PER_CYCLE,
            TimeUnit::Veil => CYCLES_PER_VEIL,
            TimeUnit::Chronicle => VEILS_PER_CHRONICLE,
        }
    }

    /// Number of flickers in one of this unit.
    pub const fn flickers(self) -> i64 {
        match self {
            TimeUnit::Flicker => 1,
            TimeUnit::Breath => FLICKERS_PER_BREATH,
            TimeUnit::Span => TimeUnit::Breath.flickers() * BREATHS_PER_SPAN,
            TimeUnit::Turn => TimeUnit::Span.flickers() * SPANS_PER_TURN,
            TimeUnit::Cycle => TimeUnit::Turn.flickers() * TURNS_PER_CYCLE,
            TimeUnit::Veil => TimeUnit::Cycle.flickers() * CYCLES_PER_VEIL,
            TimeUnit::Chronicle => TimeUnit::Veil.flickers() * VEILS_PER_CHRONICLE,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            TimeUnit::Flicker => "fk",
            TimeUnit::Breath => "br",
            TimeUnit::Span => "sp",
            TimeUnit::Turn => "tn",
            TimeUnit::Cycle => "cy",
            TimeUnit::Veil => "vl",
            TimeUnit::Chronicle => "ch",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TimeUnit::Flicker => "flicker",
            TimeUnit::Breath => "breath",
            TimeUnit::Span => "span",
            TimeUnit::Turn => "turn",
            TimeUnit::Cycle => "cycle",
            TimeUnit::Veil => "veil",
            TimeUnit::Chronicle => "chronicle",
        }
    }

    /// Looks a unit up by symbol or (singular/plural) name, case-insensitively.
    pub fn from_symbol(token: &str) -> Option<Self> {
        let token = token.to_ascii_lowercase();
        UNIT_TABLE.into_iter().find(|unit| {
            token == unit.symbol()
                || token == unit.name()
                || token.strip_suffix('s') == Some(unit.name())
        })
    }
}

/// A configuration of named-unit quantities.
///
/// Absent fields default to zero. Converting to a [`Duration`] multiplies every
/// field by its unit factor and sums the results.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationSpec {
    pub flickers: i64,
    pub breaths: i64,
    pub spans: i64,
    pub turns: i64,
    pub cycles: i64,
    pub veils: i64,
    pub chronicles: i64,
}

impl DurationSpec {
    /// Sum of every field in flickers, saturating at the `i64` range.
    ///
    /// Use [`DurationSpec::checked_to_duration`] to detect overflow.
    pub fn to_duration(&self) -> Duration {
        let flickers = self
            .terms()
            .into_iter()
            .fold(0i64, |sum, (count, unit)| {
                sum.saturating_add(count.saturating_mul(unit.flickers()))
            });
        Duration::from_flickers(flickers)
    }

    /// Sum of every field in flickers, or `None` if any product or the total
    /// leaves the `i64` range.
    pub fn checked_to_duration(&self) -> Option<Duration> {
        self.terms()
            .into_iter()
            .try_fold(0i64, |sum, (count, unit)| {
                sum.checked_add(count.checked_mul(unit.flickers())?)
            })
            .map(Duration::from_flickers)
    }

    fn terms(&self) -> [(i64, TimeUnit); 7] {
        [
            (self.flickers, TimeUnit::Flicker),
            (self.breaths, TimeUnit::Breath),
            (self.spans, TimeUnit::Span),
            (self.turns, TimeUnit::Turn),
            (self.cycles, TimeUnit::Cycle),
            (self.veils, TimeUnit::Veil),
            (self.chronicles, TimeUnit::Chronicle),
        ]
    }
}

impl From<DurationSpec> for Duration {
    fn from(spec: DurationSpec) -> Self {
        spec.to_duration()
    }
}
