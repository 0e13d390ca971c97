//! Work-hour quantities.
//!
//! Hours are stored as whole minutes so that any sequence of reserve/release
//! operations on the ledger returns to exactly the value it started from.
//! On the wire they are a decimal number of hours (`5.0`, `2.5`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

const MINUTES_PER_HOUR: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Hours {
    minutes: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid hour quantity: {0}")]
pub struct InvalidHours(pub f64);

impl Hours {
    pub const ZERO: Hours = Hours { minutes: 0 };

    pub const fn whole(hours: u32) -> Self {
        Self {
            minutes: hours * MINUTES_PER_HOUR,
        }
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    /// Rounds to the nearest minute. Negative, NaN and out-of-range inputs are rejected.
    pub fn from_f64(hours: f64) -> Result<Self, InvalidHours> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(InvalidHours(hours));
        }
        let minutes = (hours * MINUTES_PER_HOUR as f64).round();
        if minutes > u32::MAX as f64 {
            return Err(InvalidHours(hours));
        }
        Ok(Self {
            minutes: minutes as u32,
        })
    }

    pub fn as_f64(self) -> f64 {
        self.minutes as f64 / MINUTES_PER_HOUR as f64
    }

    pub fn minutes(self) -> u32 {
        self.minutes
    }

    pub fn is_zero(self) -> bool {
        self.minutes == 0
    }

    pub fn saturating_sub(self, rhs: Hours) -> Hours {
        Hours {
            minutes: self.minutes.saturating_sub(rhs.minutes),
        }
    }

    pub fn checked_add(self, rhs: Hours) -> Option<Hours> {
        self.minutes
            .checked_add(rhs.minutes)
            .map(|minutes| Hours { minutes })
    }

    /// `self * ratio`, rounded down to the minute.
    pub fn scaled(self, ratio: f64) -> Hours {
        let minutes = (self.minutes as f64 * ratio).floor().max(0.0);
        Hours {
            minutes: minutes.min(u32::MAX as f64) as u32,
        }
    }
}

impl TryFrom<f64> for Hours {
    type Error = InvalidHours;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Hours::from_f64(value)
    }
}

impl From<Hours> for f64 {
    fn from(value: Hours) -> Self {
        value.as_f64()
    }
}

impl Add for Hours {
    type Output = Hours;

    fn add(self, rhs: Hours) -> Hours {
        Hours {
            minutes: self.minutes.saturating_add(rhs.minutes),
        }
    }
}

impl AddAssign for Hours {
    fn add_assign(&mut self, rhs: Hours) {
        *self = *self + rhs;
    }
}

impl Sum for Hours {
    fn sum<I: Iterator<Item = Hours>>(iter: I) -> Self {
        iter.fold(Hours::ZERO, Add::add)
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}h", self.as_f64())
    }
}
