//! Mixed-unit rendering and parsing, e.g. `1br 30fk`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Duration, Instant, TimeUnit, UNIT_TABLE};
use crate::error::TimeError;

static TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-?\d+)\s*([A-Za-z]+)").expect("duration term pattern is valid")
});

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "0{}", TimeUnit::Flicker.symbol());
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        let mut rest = self.0.unsigned_abs();
        let mut first = true;
        for unit in UNIT_TABLE.iter().rev() {
            let size = unit.flickers() as u64;
            let count = rest / size;
            rest %= size;
            if count == 0 {
                continue;
            }
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{sign}{count}{}", unit.symbol())?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.since_zero())
    }
}

impl FromStr for Duration {
    type Err = TimeError;

    /// Accepts a bare flicker count (`"120"`) or whitespace-separated terms
    /// such as `"2br 30fk"`, `"1 span"` or `"-3br"`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TimeError::Parse("empty duration".into()));
        }
        if let Ok(flickers) = trimmed.parse::<i64>() {
            return Ok(Duration::from_flickers(flickers));
        }

        let mut total: i64 = 0;
        let mut cursor = 0;
        for caps in TERM.captures_iter(trimmed) {
            let whole = caps.get(0).expect("group 0 always participates");
            if !trimmed[cursor..whole.start()].trim().is_empty() {
                return Err(TimeError::Parse(format!(
                    "unexpected text {:?} in {input:?}",
                    &trimmed[cursor..whole.start()]
                )));
            }
            cursor = whole.end();

            let count: i64 = caps[1]
                .parse()
                .map_err(|_| TimeError::Parse(format!("count out of range in {input:?}")))?;
            let unit = TimeUnit::from_symbol(&caps[2])
                .ok_or_else(|| TimeError::Parse(format!("unknown unit {:?}", &caps[2])))?;
            total = count
                .checked_mul(unit.flickers())
                .and_then(|term| total.checked_add(term))
                .ok_or_else(|| TimeError::Parse(format!("{input:?} overflows")))?;
        }
        if cursor == 0 || !trimmed[cursor..].trim().is_empty() {
            return Err(TimeError::Parse(format!("cannot read {input:?}")));
        }
        Ok(Duration::from_flickers(total))
    }
}
