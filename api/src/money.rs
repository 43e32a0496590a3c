//! Thai baht amounts.
//!
//! Amounts are held as integer satang (1/100 baht) so that price arithmetic
//! is exact. The wire format is looser: the API sends prices either as JSON
//! numbers (`1500`, `1500.5`) or as decimal strings (`"1500.00"`).

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// Satang per baht.
const SATANG_PER_BAHT: u64 = 100;

/// A non-negative amount of Thai baht.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero baht.
    pub const ZERO: Self = Self(0);

    /// Create from satang.
    #[must_use]
    pub const fn from_satang(satang: u64) -> Self {
        Self(satang)
    }

    /// Create from whole baht.
    #[must_use]
    pub const fn from_baht(baht: u64) -> Self {
        Self(baht.saturating_mul(SATANG_PER_BAHT))
    }

    /// Amount in satang.
    #[must_use]
    pub const fn satang(self) -> u64 {
        self.0
    }

    /// Amount in baht as a float, for display conversion only.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_baht_f64(self) -> f64 {
        self.0 as f64 / SATANG_PER_BAHT as f64
    }

    /// Multiply by a count (guests, add-on quantity), saturating.
    #[must_use]
    pub const fn times(self, count: u32) -> Self {
        Self(self.0.saturating_mul(count as u64))
    }

    /// Add, saturating at the maximum amount.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtract, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Returns `true` for zero baht.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert a float baht amount, rejecting negative and non-finite values.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_baht_f64(baht: f64) -> Option<Self> {
        if !baht.is_finite() || baht < 0.0 {
            return None;
        }
        let satang = (baht * 100.0).round();
        if satang > u64::MAX as f64 {
            return None;
        }
        Some(Self(satang as u64))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / SATANG_PER_BAHT, self.0 % SATANG_PER_BAHT)
    }
}

/// Error for amounts that are not a non-negative decimal with at most two places.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount: {0:?}")]
pub struct InvalidAmount(pub String);

impl FromStr for Money {
    type Err = InvalidAmount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidAmount(s.to_string());
        let trimmed = s.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let baht: u64 = whole.parse().map_err(|_| invalid())?;
        let satang: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        baht.checked_mul(SATANG_PER_BAHT)
            .and_then(|v| v.checked_add(satang))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative baht amount as a number or decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                v.checked_mul(SATANG_PER_BAHT)
                    .map(Money)
                    .ok_or_else(|| E::custom("amount too large"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom("negative amount"))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                Money::from_baht_f64(v).ok_or_else(|| E::custom("negative or non-finite amount"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_strings() {
        let values: Vec<Money> =
            serde_json::from_str(r#"[1500, 1500.5, "1500.00", "99.9", "0"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Money::from_baht(1500),
                Money::from_satang(150_050),
                Money::from_baht(1500),
                Money::from_satang(9_990),
                Money::ZERO,
            ]
        );
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert!(serde_json::from_str::<Money>("-1").is_err());
        assert!(serde_json::from_str::<Money>("-0.5").is_err());
        assert!(serde_json::from_str::<Money>(r#""12.345""#).is_err());
        assert!(serde_json::from_str::<Money>(r#""1,500""#).is_err());
        assert!(serde_json::from_str::<Money>(r#""""#).is_err());
    }

    #[test]
    fn serializes_as_decimal_string() {
        assert_eq!(serde_json::to_string(&Money::from_satang(145_000)).unwrap(), r#""1450.00""#);
        assert_eq!(Money::from_satang(5).to_string(), "0.05");
    }

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(Money::from_baht(500).times(2), Money::from_baht(1000));
        assert_eq!(Money::from_baht(1).saturating_sub(Money::from_baht(2)), Money::ZERO);
        let total: Money = [Money::from_baht(100), Money::from_baht(250)].into_iter().sum();
        assert_eq!(total, Money::from_baht(350));
    }
}
