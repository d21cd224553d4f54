//! Rounding policy: decides how "now" is snapped before it is recorded.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

/// Direction used when snapping a time to the rounding interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    Floor,
    Ceil,
    #[default]
    Nearest,
}

impl std::str::FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floor" => Ok(Self::Floor),
            "ceil" => Ok(Self::Ceil),
            "nearest" => Ok(Self::Nearest),
            other => Err(format!("unknown rounding mode: {other}")),
        }
    }
}

impl std::fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Nearest => "nearest",
        };
        f.write_str(s)
    }
}

/// Rounding configuration.
///
/// `interval_minutes == 0` disables rounding (the default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundingConfig {
    #[serde(default)]
    pub interval_minutes: u32,

    #[serde(default)]
    pub mode: RoundingMode,
}

impl RoundingConfig {
    pub fn new(interval_minutes: u32, mode: RoundingMode) -> Self {
        Self {
            interval_minutes,
            mode,
        }
    }

    /// Round with this configuration.
    pub fn apply(&self, instant: NaiveDateTime) -> NaiveDateTime {
        round_time(instant, self.interval_minutes, self.mode)
    }
}

/// Snap a wall-clock time to the rounding interval.
///
/// # Rules
/// - `interval_minutes == 0` returns the input unchanged.
/// - Otherwise seconds and sub-seconds are zeroed and
///   `remainder = minute % interval` decides the shift:
///   - floor: subtract `remainder`
///   - ceil: add `interval - remainder` unless `remainder == 0`
///   - nearest: whichever boundary is closer, ties round up
///
/// The remainder is taken on the continuous local minute line, which equals
/// the minute-of-hour remainder for every interval dividing 60, and keeps
/// rounding idempotent for any other interval as well. Overflow carries into
/// the hour/day through chrono arithmetic.
///
/// Example with interval=15:
/// - 10:07 floor -> 10:00, ceil -> 10:15, nearest -> 10:00
/// - 10:08 nearest -> 10:15 (7.5 is the midpoint, 8 is past it)
/// - 23:53 ceil -> 00:00 on the next day
pub fn round_time(instant: NaiveDateTime, interval_minutes: u32, mode: RoundingMode) -> NaiveDateTime {
    if interval_minutes == 0 {
        return instant;
    }

    let truncated = instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant);

    let interval = i64::from(interval_minutes);
    let minute_line = truncated.and_utc().timestamp().div_euclid(60);
    let remainder = minute_line.rem_euclid(interval);

    let shift = match mode {
        RoundingMode::Floor => -remainder,
        RoundingMode::Ceil if remainder == 0 => 0,
        RoundingMode::Ceil => interval - remainder,
        RoundingMode::Nearest if remainder * 2 >= interval => interval - remainder,
        RoundingMode::Nearest => -remainder,
    };

    truncated
        .checked_add_signed(TimeDelta::minutes(shift))
        .unwrap_or(truncated)
}
