//! Token amount with exact decimal precision.
//!
//! Amounts are backed by [`rust_decimal::Decimal`] so that prices such as
//! `0.3` and products such as `2 × 1.5` are represented exactly. Equality is
//! numeric: `1.50` and `1.5` are the same amount.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GridError;

/// A non-negative token amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, GridError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(GridError::InvalidAmount(format!(
                "negative values not allowed: {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Creates an amount from whole tokens.
    #[must_use]
    pub fn from_whole(tokens: u64) -> Self {
        Self(Decimal::from(tokens))
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiplies a unit price by a (non-negative) quantity.
    ///
    /// Returns `None` on overflow, if the quantity is negative, or if the
    /// exact product needs more fractional digits than a decimal can hold.
    #[must_use]
    pub fn checked_mul_quantity(self, quantity: Decimal) -> Option<Self> {
        if quantity.is_sign_negative() && !quantity.is_zero() {
            return None;
        }
        let product = self.0.checked_mul(quantity)?;
        // checked_mul rounds instead of failing once the scale exceeds 28.
        let exact_scale = self.0.normalize().scale() + quantity.normalize().scale();
        if exact_scale > Decimal::MAX_SCALE {
            return None;
        }
        Some(Self(product))
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Canonical string form: no trailing fractional zeros.
    ///
    /// This is the representation handed to the ledger.
    #[must_use]
    pub fn to_canonical_string(self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0.normalize().to_string())
    }
}

impl FromStr for Amount {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| GridError::InvalidAmount(format!("invalid number {s:?}: {e}")))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = GridError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Accepts both "1.5" and 1.5 in JSON.
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Amount {
        s.parse().expect("valid amount")
    }

    #[test]
    fn zero_is_zero() {
        assert!(Amount::ZERO.is_zero());
        assert_eq!(Amount::ZERO.to_string(), "0");
    }

    #[test]
    fn from_whole_converts() {
        assert_eq!(Amount::from_whole(5), amount("5"));
    }

    #[test]
    fn equality_ignores_trailing_zeros() {
        assert_eq!(amount("1.50"), amount("1.5"));
        assert_eq!(amount("3.600"), amount("3.6"));
    }

    #[test]
    fn canonical_string_strips_trailing_zeros() {
        assert_eq!(amount("3.600").to_canonical_string(), "3.6");
        assert_eq!(amount("50.000").to_canonical_string(), "50");
    }

    #[test]
    fn price_times_quantity_is_exact() {
        let price = amount("0.3");
        let total = price
            .checked_mul_quantity(Decimal::new(2, 0))
            .expect("no overflow");
        assert_eq!(total, amount("0.6"));
    }

    #[test]
    fn tenths_sum_exactly() {
        let mut total = Amount::ZERO;
        for _ in 0..10 {
            total = total.checked_add(amount("0.1")).expect("no overflow");
        }
        assert_eq!(total, Amount::from_whole(1));
    }

    #[test]
    fn checked_mul_rejects_negative_quantity() {
        assert!(amount("1").checked_mul_quantity(Decimal::new(-1, 0)).is_none());
    }

    #[test]
    fn checked_mul_keeps_fractional_memory_exact() {
        // 1 MiB of memory is 0.0009765625 MRU.
        let mru = Decimal::new(9_765_625, 10);
        let cost = amount("1.5").checked_mul_quantity(mru).expect("fits");
        assert_eq!(cost, amount("0.00146484375"));
    }

    #[test]
    fn checked_mul_refuses_to_round() {
        let mru = Decimal::new(9_765_625, 10);
        let price = amount("0.0000000000000000001");
        assert!(price.as_decimal().checked_mul(mru).is_some());
        assert!(price.checked_mul_quantity(mru).is_none());
    }

    #[test]
    fn checked_add_returns_none_on_overflow() {
        let max = Amount::new(Decimal::MAX).expect("max is positive");
        assert!(max.checked_add(amount("1")).is_none());
    }

    #[test]
    fn from_str_rejects_invalid() {
        assert!("abc".parse::<Amount>().is_err());
        assert!("-1.0".parse::<Amount>().is_err());
    }

    #[test]
    fn negative_zero_is_accepted() {
        assert!(Amount::new(-Decimal::ZERO).is_ok());
    }

    #[test]
    fn serde_deserializes_from_string_and_number() {
        let from_str: Amount = serde_json::from_str(r#""2.5""#).expect("string");
        let from_num: Amount = serde_json::from_str("2.5").expect("number");
        assert_eq!(from_str, amount("2.5"));
        assert_eq!(from_num, amount("2.5"));
    }

    #[test]
    fn serde_deserializes_inside_struct() {
        #[derive(Deserialize)]
        struct Price {
            cru: Amount,
        }
        let price: Price = serde_json::from_str(r#"{"cru": "0.3"}"#).expect("struct");
        assert_eq!(price.cru, amount("0.3"));
    }

    #[test]
    fn serde_serializes_canonical_string() {
        let json = serde_json::to_string(&amount("1.2300")).expect("serialize");
        assert_eq!(json, r#""1.23""#);
    }

    #[test]
    fn serde_rejects_negative() {
        assert!(serde_json::from_str::<Amount>(r#""-3""#).is_err());
    }
}
