//! Monetary amounts with fixed two-decimal precision.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A USD amount, always carrying exactly two decimal places.
///
/// Every constructor rounds (half away from zero) so that sums of line items,
/// tax rates, and provider amounts stay comparable without float drift.
/// Serialized as a string (e.g. `"19.99"`), matching what payment providers
/// send and expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create from a decimal amount, rounding to two places.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Create from an integral number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount in cents, as payment APIs want it.
    ///
    /// Returns `None` if the amount does not fit in an `i64` (never happens
    /// for realistic order totals).
    #[must_use]
    pub fn to_cents(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp(0)
            .to_i64()
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    fn mul(self, qty: i32) -> Self {
        Self(self.0 * Decimal::from(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::from_decimal(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

// SQLx support (with postgres feature): stored as NUMERIC.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_rounds_half_away_from_zero() {
        let money = Money::from_decimal(Decimal::new(12345, 3)); // 12.345
        assert_eq!(money, Money::from_cents(1235));
    }

    #[test]
    fn test_line_total() {
        let price = Money::from_cents(1999);
        assert_eq!(price * 3, Money::from_cents(5997));
    }

    #[test]
    fn test_sum_of_lines() {
        let total: Money = [Money::from_cents(500), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(750));
    }

    #[test]
    fn test_to_cents() {
        assert_eq!(Money::from_cents(12999).to_cents(), Some(12999));
        assert_eq!(Money::ZERO.to_cents(), Some(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "$10.50");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_serde_as_string() {
        let money = Money::from_cents(1999);
        let json = serde_json::to_string(&money).unwrap();
        assert_eq!(json, "\"19.99\"");

        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, money);
    }
}
