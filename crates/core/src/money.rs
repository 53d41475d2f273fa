//! Fixed-point money in integer minor units.
//!
//! All arithmetic is exact on `i64` minor units and fails with
//! [`SettleError::Overflow`] instead of wrapping. The single rounding point is
//! [`Money::multiply_by_ratio`], which rounds half-to-even so that applying the
//! same ratio many times carries no systematic bias.
//!
//! Combining two values of different currencies is a programming error and
//! panics; callers that accept external data validate currencies up front.

use core::cmp::Ordering;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::error::{SettleError, SettleResult};

/// Immutable amount of one currency, stored in minor units (e.g. centavos).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    pub fn new(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Convert an exact decimal amount (`100.01`) into minor units.
    ///
    /// Amounts with more fractional digits than the currency allows are
    /// rejected rather than rounded.
    pub fn from_decimal(amount: Decimal, currency: Currency) -> SettleResult<Self> {
        let scaled = amount
            .checked_mul(Decimal::from(currency.minor_per_major()))
            .ok_or(SettleError::Overflow)?;
        if !scaled.fract().is_zero() {
            return Err(SettleError::validation(format!(
                "{amount} has more than {} fractional digits for {currency}",
                currency.exponent()
            )));
        }
        let minor = scaled.to_i64().ok_or(SettleError::Overflow)?;
        Ok(Self::new(minor, currency))
    }

    /// Parse a decimal literal such as `"100.01"`.
    pub fn parse(amount: &str, currency: Currency) -> SettleResult<Self> {
        let value: Decimal = amount
            .trim()
            .parse()
            .map_err(|e| SettleError::validation(format!("invalid amount {amount:?}: {e}")))?;
        Self::from_decimal(value, currency)
    }

    /// Sum an iterator of amounts, starting from zero in `currency`.
    pub fn sum<I>(currency: Currency, amounts: I) -> SettleResult<Self>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(currency), |acc, m| acc.add(m))
    }

    pub fn minor(&self) -> i64 {
        self.minor
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.minor, u32::from(self.currency.exponent()))
    }

    /// # Panics
    ///
    /// Panics if the currencies differ.
    pub fn add(self, other: Money) -> SettleResult<Money> {
        self.assert_same_currency(&other, "add");
        let minor = self
            .minor
            .checked_add(other.minor)
            .ok_or(SettleError::Overflow)?;
        Ok(Self::new(minor, self.currency))
    }

    /// # Panics
    ///
    /// Panics if the currencies differ.
    pub fn subtract(self, other: Money) -> SettleResult<Money> {
        self.assert_same_currency(&other, "subtract");
        let minor = self
            .minor
            .checked_sub(other.minor)
            .ok_or(SettleError::Overflow)?;
        Ok(Self::new(minor, self.currency))
    }

    /// `self * numerator / denominator`, rounded half-to-even to the nearest
    /// minor unit.
    pub fn multiply_by_ratio(self, numerator: i64, denominator: i64) -> SettleResult<Money> {
        if denominator == 0 {
            return Err(SettleError::DivisionByZero);
        }
        // i64 * i64 always fits in i128.
        let product = i128::from(self.minor) * i128::from(numerator);
        let rounded = div_round_half_even(product, i128::from(denominator));
        let minor = i64::try_from(rounded).map_err(|_| SettleError::Overflow)?;
        Ok(Self::new(minor, self.currency))
    }

    /// # Panics
    ///
    /// Panics if the currencies differ.
    pub fn compare(&self, other: &Money) -> Ordering {
        self.assert_same_currency(other, "compare");
        self.minor.cmp(&other.minor)
    }

    /// Smaller of two amounts of the same currency.
    pub fn min(self, other: Money) -> Money {
        match self.compare(&other) {
            Ordering::Greater => other,
            _ => self,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    pub fn is_negative(&self) -> bool {
        self.minor < 0
    }

    pub fn signum(&self) -> i64 {
        self.minor.signum()
    }

    pub fn abs(self) -> SettleResult<Money> {
        let minor = self.minor.checked_abs().ok_or(SettleError::Overflow)?;
        Ok(Self::new(minor, self.currency))
    }

    pub fn negate(self) -> SettleResult<Money> {
        let minor = self.minor.checked_neg().ok_or(SettleError::Overflow)?;
        Ok(Self::new(minor, self.currency))
    }

    fn assert_same_currency(&self, other: &Money, op: &str) {
        assert!(
            self.currency == other.currency,
            "cannot {op} {} and {}: currency mismatch",
            self.currency,
            other.currency
        );
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.currency)
    }
}

/// Integer division rounding to nearest, ties to even. `denominator != 0`.
fn div_round_half_even(numerator: i128, denominator: i128) -> i128 {
    let (n, d) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };
    let quotient = n.div_euclid(d);
    let twice_remainder = n.rem_euclid(d) * 2;
    match twice_remainder.cmp(&d) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal if quotient % 2 == 0 => quotient,
        Ordering::Equal => quotient + 1,
    }
}
