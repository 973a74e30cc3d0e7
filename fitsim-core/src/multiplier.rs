//! Fixed-point attribute multipliers.
//!
//! Mutated attribute values are stored as integers so that the percentage shown
//! to the user and the multiplier handed to the recomputation pipeline always
//! describe the same number. Floats only appear at the edges (parsing and
//! display).

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Attribute strength factor with scale 10000.
///
/// Represents multipliers as integers: 1.15 → 11500, 1.0 → 10000.
/// One raw step is 0.0001 as a multiplier and exactly 0.01 as a percentage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Multiplier(i64);

impl Multiplier {
    /// Scale factor: 10000 = 1.0
    pub const SCALE: i64 = 10000;

    /// Raw steps per percentage point.
    pub const STEPS_PER_PERCENT: i64 = Self::SCALE / 100;

    pub const ZERO: Multiplier = Multiplier(0);
    /// Unmodified attribute.
    pub const ONE: Multiplier = Multiplier(10000);

    /// Create from raw scaled value
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Multiplier(raw)
    }

    /// Convert from f64, rounding to the nearest step.
    ///
    /// NaN and infinities map to `ZERO`, which lies outside every valid range.
    pub fn from_f64(v: f64) -> Self {
        if !v.is_finite() {
            return Multiplier::ZERO;
        }

        let scaled = (v * Self::SCALE as f64).round();
        if scaled >= i64::MAX as f64 {
            return Multiplier(i64::MAX);
        }
        if scaled <= i64::MIN as f64 {
            return Multiplier(i64::MIN);
        }

        Multiplier(scaled as i64)
    }

    /// Build from a percentage delta (15.0 → 1.15), rounding to the nearest 0.01%.
    pub fn from_percentage(percent: f64) -> Self {
        if !percent.is_finite() {
            return Multiplier::ZERO;
        }

        let steps = (percent * Self::STEPS_PER_PERCENT as f64).round();
        if steps >= (i64::MAX - Self::SCALE) as f64 {
            return Multiplier(i64::MAX);
        }
        if steps <= (i64::MIN + Self::SCALE) as f64 {
            return Multiplier(i64::MIN);
        }

        Multiplier(Self::SCALE + steps as i64)
    }

    /// Convert to f64 (display and hand-off only)
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Percentage delta from an unmodified value: `(m - 1) * 100`.
    #[inline]
    pub fn to_percentage(self) -> f64 {
        self.percent_hundredths() as f64 / Self::STEPS_PER_PERCENT as f64
    }

    /// Percentage delta in hundredths of a percent. Exact, except that it
    /// saturates at `i64::MIN` for multipliers near the bottom of the range.
    #[inline]
    pub const fn percent_hundredths(self) -> i64 {
        self.0.saturating_sub(Self::SCALE)
    }

    /// Raw integer value
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Multiplier {
    type Output = Multiplier;
    #[inline]
    fn add(self, other: Multiplier) -> Multiplier {
        Multiplier(self.0.saturating_add(other.0))
    }
}

impl Sub for Multiplier {
    type Output = Multiplier;
    #[inline]
    fn sub(self, other: Multiplier) -> Multiplier {
        Multiplier(self.0.saturating_sub(other.0))
    }
}

impl From<f64> for Multiplier {
    fn from(v: f64) -> Self {
        Multiplier::from_f64(v)
    }
}

impl From<Multiplier> for f64 {
    fn from(m: Multiplier) -> Self {
        m.to_f64()
    }
}

impl std::fmt::Debug for Multiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Multiplier({} = {})", self.0, self.to_f64())
    }
}

impl std::fmt::Display for Multiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}
