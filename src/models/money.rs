//! Fixed-point money type.
//!
//! Amounts are stored as minor units (cents) in an i64, so every balance
//! fold and settlement comparison is exact integer arithmetic. Decimal
//! floats appear only at the crate boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Largest distance from the minor-unit grid still attributed to floating
/// point representation rather than to a third decimal place.
const GRID_EPSILON: f64 = 1e-6;

/// A monetary amount in minor units (hundredths of the currency unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Convert a decimal amount, requiring it to sit on the minor-unit grid.
    ///
    /// Returns `None` for non-finite values and for values with more than two
    /// decimal places. Ordinary two-decimal doubles such as 16.67 do not land
    /// exactly on the grid, so the check allows a tiny representation epsilon.
    pub fn try_from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = value * 100.0;
        if (scaled - scaled.round()).abs() > GRID_EPSILON {
            return None;
        }
        Some(Self(scaled.round() as i64))
    }

    /// Convert a decimal amount, rounding to the nearest minor unit.
    ///
    /// Used for untrusted proposal shares, which may carry extra decimals.
    /// The caller must have checked the value is finite.
    pub fn from_decimal_lossy(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_decimal() {
        assert_eq!(Money::try_from_decimal(16.67).unwrap().cents(), 1667);
        assert_eq!(Money::try_from_decimal(0.29).unwrap().cents(), 29);
        assert_eq!(Money::try_from_decimal(-10.50).unwrap().cents(), -1050);
        assert_eq!(Money::try_from_decimal(50.0).unwrap().cents(), 5000);
        assert!(Money::try_from_decimal(3.333).is_none());
        assert!(Money::try_from_decimal(f64::NAN).is_none());
        assert!(Money::try_from_decimal(f64::INFINITY).is_none());
    }

    #[test]
    fn test_from_decimal_lossy_rounds() {
        assert_eq!(Money::from_decimal_lossy(16.666).cents(), 1667);
        assert_eq!(Money::from_decimal_lossy(16.664).cents(), 1666);
        assert_eq!(Money::from_decimal_lossy(25.0).cents(), 2500);
    }

    #[test]
    fn test_to_decimal_round_trip() {
        let m = Money::from_cents(1667);
        assert_eq!(m.to_decimal(), 16.67);
        assert_eq!(Money::try_from_decimal(m.to_decimal()).unwrap(), m);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1050)), "10.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
        assert_eq!(format!("{}", Money::from_cents(-1050)), "-10.50");
        assert_eq!(format!("{}", Money::from_cents(5)), "0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(a.min(b), b);
        assert_eq!(Money::from_cents(-300).abs().cents(), 300);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 600);
    }

    #[test]
    fn test_serde_transparent() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
