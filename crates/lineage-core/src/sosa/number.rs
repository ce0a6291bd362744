//! Unbounded Sosa-Stradonitz numbers.
//!
//! A Sosa number doubles with every generation, so 64 bits run out after 63
//! generations. `SosaNumber` stores the value as little-endian `u64` limbs and
//! implements only what ancestor numbering needs: doubling, halving, bit
//! inspection, ordering, and decimal text.

use crate::{Branch, LineageError, limbs};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A positive ancestor number relative to some root (the root is 1).
///
/// Limbs are little-endian with no trailing zero limb, so equal values have
/// equal representations and the derived `Eq`/`Hash` are sound.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SosaNumber {
    limbs: Vec<u64>,
}

impl SosaNumber {
    /// The root's number.
    #[must_use]
    pub fn one() -> Self {
        Self { limbs: vec![1] }
    }

    /// Number of the father of the person holding `self` (2n).
    #[must_use]
    pub fn father(&self) -> Self {
        Self {
            limbs: limbs::shift_left(&self.limbs, 1),
        }
    }

    /// Number of the mother of the person holding `self` (2n + 1).
    #[must_use]
    pub fn mother(&self) -> Self {
        let mut next = self.father();
        next.limbs[0] |= 1;
        next
    }

    /// Number of the child through whom this ancestor is reached (n / 2).
    ///
    /// Returns `None` for the root.
    #[must_use]
    pub fn child(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            limbs: limbs::shift_right(&self.limbs, 1),
        })
    }

    /// True for the number 1.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.limbs == [1]
    }

    /// True for even numbers (father slots).
    #[must_use]
    pub fn is_even(&self) -> bool {
        self.limbs.first().is_none_or(|limb| limb & 1 == 0)
    }

    /// Side of the slot: root, father (even), or mother (odd).
    #[must_use]
    pub fn branch(&self) -> Branch {
        if self.is_root() {
            Branch::Root
        } else if self.is_even() {
            Branch::Paternal
        } else {
            Branch::Maternal
        }
    }

    /// Generation of the slot, `floor(log2(n)) + 1`; the root is generation 1.
    #[must_use]
    pub fn generation(&self) -> u32 {
        let top = self.limbs.last().copied().unwrap_or(0);
        let full = (self.limbs.len() as u32).saturating_sub(1);
        full * 64 + (64 - top.leading_zeros())
    }

    /// Parent directions from the root up to this slot.
    ///
    /// Yields `false` for a father step and `true` for a mother step, read
    /// from the bits below the leading one, most significant first.
    pub fn steps_from_root(&self) -> impl Iterator<Item = bool> + '_ {
        let below_top = self.generation().saturating_sub(1);
        (0..below_top).rev().map(move |bit| self.bit(bit))
    }

    fn bit(&self, index: u32) -> bool {
        let limb = self.limbs.get((index / 64) as usize).copied().unwrap_or(0);
        (limb >> (index % 64)) & 1 == 1
    }

    /// The value as a `u128`, when it fits.
    #[must_use]
    pub fn to_u128(&self) -> Option<u128> {
        match self.limbs.as_slice() {
            [low] => Some(u128::from(*low)),
            [low, high] => Some((u128::from(*high) << 64) | u128::from(*low)),
            _ => None,
        }
    }

    fn from_limbs(mut limbs: Vec<u64>) -> Result<Self, LineageError> {
        limbs::trim(&mut limbs);
        if limbs.is_empty() {
            return Err(LineageError::InvalidSosaNumber("0".to_string()));
        }
        Ok(Self { limbs })
    }
}

impl Ord for SosaNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        limbs::compare(&self.limbs, &other.limbs)
    }
}

impl PartialOrd for SosaNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<u64> for SosaNumber {
    type Error = LineageError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_limbs(vec![value])
    }
}

impl TryFrom<u128> for SosaNumber {
    type Error = LineageError;

    fn try_from(value: u128) -> Result<Self, Self::Error> {
        Self::from_limbs(vec![value as u64, (value >> 64) as u64])
    }
}

impl FromStr for SosaNumber {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        limbs::parse_decimal(s.trim())
            .ok_or_else(|| LineageError::InvalidSosaNumber(s.to_string()))
            .and_then(Self::from_limbs)
            .map_err(|_| LineageError::InvalidSosaNumber(s.to_string()))
    }
}

impl fmt::Display for SosaNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&limbs::to_decimal(&self.limbs))
    }
}

impl fmt::Debug for SosaNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SosaNumber({})", self)
    }
}

impl Serialize for SosaNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SosaNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn n(value: u64) -> SosaNumber {
        SosaNumber::try_from(value).expect("positive")
    }

    #[test]
    fn parents_double_the_number() {
        let root = SosaNumber::one();
        assert_eq!(root.father(), n(2));
        assert_eq!(root.mother(), n(3));
        assert_eq!(n(2).mother(), n(5));
        assert_eq!(n(3).father(), n(6));
    }

    #[test]
    fn child_halves_the_number() {
        assert_eq!(n(5).child(), Some(n(2)));
        assert_eq!(n(4).child(), Some(n(2)));
        assert_eq!(SosaNumber::one().child(), None);
    }

    #[test]
    fn branch_follows_parity() {
        assert_eq!(n(1).branch(), Branch::Root);
        assert_eq!(n(4).branch(), Branch::Paternal);
        assert_eq!(n(7).branch(), Branch::Maternal);
    }

    #[test]
    fn generation_is_bit_length() {
        assert_eq!(n(1).generation(), 1);
        assert_eq!(n(3).generation(), 2);
        assert_eq!(n(4).generation(), 3);
        assert_eq!(n(7).generation(), 3);
        assert_eq!(n(u64::MAX).generation(), 64);
    }

    #[test]
    fn grows_past_sixty_four_bits() {
        let mut number = SosaNumber::one();
        for _ in 0..100 {
            number = number.father();
        }
        assert_eq!(number.generation(), 101);
        assert!(number.is_even());
        assert_eq!(number.to_u128(), Some(1u128 << 100));

        let mut back = number.clone();
        for _ in 0..100 {
            back = back.child().expect("above root");
        }
        assert!(back.is_root());
    }

    #[test]
    fn ordering_is_numeric() {
        let big = SosaNumber::try_from(1u128 << 70).expect("positive");
        assert!(n(3) < n(4));
        assert!(n(u64::MAX) < big);
        assert!(big > n(2));
    }

    #[test]
    fn decimal_text_roundtrip_beyond_u128() {
        let text = "1267650600228229401496703205376"; // 2^100
        let parsed: SosaNumber = text.parse().expect("parse");
        assert_eq!(parsed.to_string(), text);
        assert_eq!(parsed.generation(), 101);

        let huge = "340282366920938463463374607431768211457"; // 2^128 + 1
        let parsed: SosaNumber = huge.parse().expect("parse");
        assert_eq!(parsed.to_u128(), None);
        assert_eq!(parsed.to_string(), huge);
        assert_eq!(parsed.branch(), Branch::Maternal);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!("0".parse::<SosaNumber>().is_err());
        assert!("000".parse::<SosaNumber>().is_err());
        assert!("".parse::<SosaNumber>().is_err());
        assert!("12a".parse::<SosaNumber>().is_err());
        assert!("-4".parse::<SosaNumber>().is_err());
        assert!(SosaNumber::try_from(0u64).is_err());
    }

    #[test]
    fn steps_spell_the_path_from_root() {
        // 11 = 0b1011: root -> father (0) -> mother (1) -> mother (1)
        let steps: Vec<bool> = n(11).steps_from_root().collect();
        assert_eq!(steps, vec![false, true, true]);
        assert_eq!(n(1).steps_from_root().count(), 0);
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&n(42)).expect("serialize");
        assert_eq!(json, "\"42\"");
        let back: SosaNumber = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, n(42));
    }
}
