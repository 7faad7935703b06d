// Time units for documents and the wall clock.
//
// Documents carry microsecond timestamps; the wall clock is read at
// millisecond resolution. Conversions between the two are always explicit.

use std::fmt;
use std::ops::{Add, Sub};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Microseconds per millisecond.
pub const MICROS_PER_MILLI: i64 = 1_000;
/// Milliseconds per day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;
/// Milliseconds per minute.
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// How far back a document may have been written and still be rendered,
/// and the default lifetime of a chat message: two days.
pub const HORIZON: Millis = Millis(2 * MILLIS_PER_DAY);
/// Lifetime of a log thrown on the fire: one hour.
pub const LOG_BURN: Millis = Millis(60 * MILLIS_PER_MINUTE);

/// A microsecond timestamp or span, as stored on documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Micros(pub i64);

/// A millisecond timestamp or span, as read from the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millis(pub i64);

impl Micros {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_micros())
    }

    /// Truncating conversion to milliseconds.
    pub fn to_millis(self) -> Millis {
        Millis(self.0.div_euclid(MICROS_PER_MILLI))
    }

    /// Microseconds as fractional milliseconds, without truncation.
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_MILLI as f64
    }
}

impl Millis {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn to_micros(self) -> Micros {
        Micros(self.0.saturating_mul(MICROS_PER_MILLI))
    }

    pub fn minutes(minutes: i64) -> Self {
        Self(minutes.saturating_mul(MILLIS_PER_MINUTE))
    }
}

impl Add for Micros {
    type Output = Micros;

    fn add(self, rhs: Self) -> Self::Output {
        Micros(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Micros {
    type Output = Micros;

    fn sub(self, rhs: Self) -> Self::Output {
        Micros(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Millis {
    type Output = Millis;

    fn add(self, rhs: Self) -> Self::Output {
        Millis(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Millis {
    type Output = Millis;

    fn sub(self, rhs: Self) -> Self::Output {
        Millis(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Source of wall-clock time. Tests substitute a fixed clock.
pub trait Clock {
    fn now(&self) -> Millis;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        Millis::now()
    }
}
