//! Exact dyadic coefficients.
//!
//! Every kinship and inbreeding coefficient is a sum of powers of one half,
//! so it is stored exactly as `numerator / 2^exponent` with an unbounded
//! numerator. No floating point is involved anywhere.

use crate::{LineageError, limbs};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A non-negative rational `numerator / 2^exponent`.
///
/// Kept in lowest terms: the numerator is odd unless the exponent is 0, and
/// zero is the empty numerator with exponent 0. Equal values therefore have
/// equal representations.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Coefficient {
    numerator: Vec<u64>,
    exponent: u32,
}

impl Coefficient {
    #[must_use]
    pub fn zero() -> Self {
        Self {
            numerator: Vec::new(),
            exponent: 0,
        }
    }

    #[must_use]
    pub fn one() -> Self {
        Self {
            numerator: vec![1],
            exponent: 0,
        }
    }

    /// `1 / 2^exponent`.
    #[must_use]
    pub fn power_of_half(exponent: u32) -> Self {
        Self {
            numerator: vec![1],
            exponent,
        }
    }

    fn reduced(mut numerator: Vec<u64>, exponent: u32) -> Self {
        limbs::trim(&mut numerator);
        if numerator.is_empty() {
            return Self::zero();
        }
        let shift = limbs::trailing_zeros(&numerator).min(exponent);
        Self {
            numerator: limbs::shift_right(&numerator, shift),
            exponent: exponent - shift,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.numerator.is_empty()
    }

    /// Power of two in the reduced denominator.
    #[must_use]
    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    #[must_use]
    pub fn half(&self) -> Self {
        Self::reduced(self.numerator.clone(), self.exponent.saturating_add(1))
    }

    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        let exponent = self.exponent.max(other.exponent);
        let (a, b) = self.aligned(other, exponent);
        Self::reduced(limbs::add(&a, &b), exponent)
    }

    /// Both numerators scaled to a common `2^exponent` denominator.
    fn aligned(&self, other: &Self, exponent: u32) -> (Vec<u64>, Vec<u64>) {
        (
            limbs::shift_left(&self.numerator, exponent - self.exponent),
            limbs::shift_left(&other.numerator, exponent - other.exponent),
        )
    }

    /// `(numerator, denominator)` when both fit in a `u128`.
    #[must_use]
    pub fn to_ratio(&self) -> Option<(u128, u128)> {
        if self.exponent >= 128 {
            return None;
        }
        let numerator = match self.numerator.as_slice() {
            [] => 0,
            [low] => u128::from(*low),
            [low, high] => (u128::from(*high) << 64) | u128::from(*low),
            _ => return None,
        };
        Some((numerator, 1u128 << self.exponent))
    }

    /// Decimal expansion truncated to `places` digits after the point.
    ///
    /// `Coefficient::power_of_half(4).to_decimal(4)` is `"0.0625"`.
    #[must_use]
    pub fn to_decimal(&self, places: usize) -> String {
        let mut scaled = self.numerator.clone();
        for _ in 0..places {
            scaled = limbs::mul_add_small(&scaled, 10, 0);
        }
        let digits = limbs::to_decimal(&limbs::shift_right(&scaled, self.exponent));
        if places == 0 {
            return digits;
        }
        let padded = format!("{digits:0>width$}", width = places + 1);
        let (whole, fraction) = padded.split_at(padded.len() - places);
        format!("{whole}.{fraction}")
    }
}

impl Default for Coefficient {
    fn default() -> Self {
        Self::zero()
    }
}

impl Ord for Coefficient {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = self.aligned(other, self.exponent.max(other.exponent));
        limbs::compare(&a, &b)
    }
}

impl PartialOrd for Coefficient {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numerator = limbs::to_decimal(&self.numerator);
        if self.exponent == 0 {
            return f.pad(&numerator);
        }
        let denominator = limbs::to_decimal(&limbs::shift_left(&[1], self.exponent));
        f.pad(&format!("{numerator}/{denominator}"))
    }
}

impl fmt::Debug for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coefficient({})", self)
    }
}

impl FromStr for Coefficient {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LineageError::InvalidCoefficient(s.to_string());
        let (numerator, denominator) = match s.trim().split_once('/') {
            Some((n, d)) => (n.trim(), Some(d.trim())),
            None => (s.trim(), None),
        };
        let numerator = limbs::parse_decimal(numerator).ok_or_else(invalid)?;
        let exponent = match denominator {
            None => 0,
            Some(d) => {
                let d = limbs::parse_decimal(d).ok_or_else(invalid)?;
                limbs::power_of_two(&d).ok_or_else(invalid)?
            }
        };
        Ok(Self::reduced(numerator, exponent))
    }
}

impl Serialize for Coefficient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coefficient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
