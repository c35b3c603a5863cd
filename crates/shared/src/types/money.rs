//! Money type with integer minor units and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are stored as `i64` minor units (cents for USD) and every
//! arithmetic operation requires both operands to share a currency.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by money arithmetic and currency parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Operands carry different currencies.
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Currency of the left-hand operand.
        expected: Currency,
        /// Currency of the right-hand operand.
        found: Currency,
    },

    /// Currency code is not in the registry.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Result does not fit into `i64` minor units.
    #[error("Amount overflow in {0} arithmetic")]
    Overflow(Currency),

    /// Major-unit amount has more decimals than the currency allows.
    #[error("Amount {amount} has more precision than {currency} allows")]
    Precision {
        /// The rejected amount.
        amount: Decimal,
        /// Target currency.
        currency: Currency,
    },
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Japanese Yen
    Jpy,
    /// Swiss Franc
    Chf,
    /// Chinese Yuan
    Cny,
    /// Indonesian Rupiah
    Idr,
    /// Singapore Dollar
    Sgd,
    /// Russian Ruble
    Rub,
    /// Uzbekistani Som
    Uzs,
    /// Kazakhstani Tenge
    Kzt,
    /// Kuwaiti Dinar
    Kwd,
}

impl Currency {
    /// Every registered currency.
    pub const ALL: [Self; 12] = [
        Self::Usd,
        Self::Eur,
        Self::Gbp,
        Self::Jpy,
        Self::Chf,
        Self::Cny,
        Self::Idr,
        Self::Sgd,
        Self::Rub,
        Self::Uzs,
        Self::Kzt,
        Self::Kwd,
    ];

    /// Returns the ISO 4217 alphabetic code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Chf => "CHF",
            Self::Cny => "CNY",
            Self::Idr => "IDR",
            Self::Sgd => "SGD",
            Self::Rub => "RUB",
            Self::Uzs => "UZS",
            Self::Kzt => "KZT",
            Self::Kwd => "KWD",
        }
    }

    /// Number of decimal places between the major and the minor unit.
    #[must_use]
    pub const fn minor_unit_exponent(self) -> u32 {
        match self {
            Self::Jpy => 0,
            Self::Kwd => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| MoneyError::UnknownCurrency(s.to_string()))
    }
}

/// Represents a monetary amount with currency.
///
/// Immutable: every operation returns a new value. Equality and ordering are
/// only meaningful within one currency, so `partial_cmp` returns `None` for
/// values in different currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// The amount in the smallest currency unit (e.g., cents).
    amount_minor: i64,
    /// ISO 4217 currency.
    currency: Currency,
}

impl Money {
    /// Creates a new Money instance from minor units.
    #[must_use]
    pub const fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Creates a Money instance from minor units and a currency code.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::UnknownCurrency` if the code is not registered.
    pub fn from_code(amount_minor: i64, currency_code: &str) -> Result<Self, MoneyError> {
        Ok(Self::new(amount_minor, currency_code.parse()?))
    }

    /// Creates a Money instance from a major-unit decimal (e.g. `74.50`).
    ///
    /// # Errors
    ///
    /// Returns an error if the amount has more decimals than the currency
    /// supports or does not fit into minor units.
    pub fn from_major_units(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        let factor = Decimal::from(10_i64.pow(currency.minor_unit_exponent()));
        let scaled = amount
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow(currency))?;
        if !scaled.fract().is_zero() {
            return Err(MoneyError::Precision { amount, currency });
        }
        let minor = scaled.to_i64().ok_or(MoneyError::Overflow(currency))?;
        Ok(Self::new(minor, currency))
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Returns the currency.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns the amount in major units for display (e.g. `74.50`).
    #[must_use]
    pub fn as_major_units(&self) -> Decimal {
        Decimal::new(self.amount_minor, self.currency.minor_unit_exponent())
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.amount_minor < 0
    }

    /// Fails unless `other` is in the same currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for differing currencies.
    pub fn ensure_same_currency(&self, other: &Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            })
        }
    }

    /// Adds two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatch or overflow.
    pub fn add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(&other)?;
        self.amount_minor
            .checked_add(other.amount_minor)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow(self.currency))
    }

    /// Subtracts `other` from `self`; both must share a currency.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatch or overflow.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(&other)?;
        self.amount_minor
            .checked_sub(other.amount_minor)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow(self.currency))
    }

    /// Returns the amount with the opposite sign, in the same currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` for `i64::MIN` minor units.
    pub fn negate(self) -> Result<Self, MoneyError> {
        self.amount_minor
            .checked_neg()
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow(self.currency))
    }

    /// Returns the absolute amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` for `i64::MIN` minor units.
    pub fn abs(self) -> Result<Self, MoneyError> {
        if self.is_negative() { self.negate() } else { Ok(self) }
    }

    /// Compares two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for differing currencies.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount_minor.cmp(&other.amount_minor))
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_major_units(), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_new() {
        let money = Money::new(10_000, Currency::Usd);
        assert_eq!(money.amount_minor(), 10_000);
        assert_eq!(money.currency(), Currency::Usd);
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Idr);
        assert!(money.is_zero());
        assert!(!money.is_positive());
        assert!(!money.is_negative());
        assert_eq!(money.currency(), Currency::Idr);
    }

    #[test]
    fn test_from_code_validates_registry() {
        assert_eq!(
            Money::from_code(250, "usd").unwrap(),
            Money::new(250, Currency::Usd)
        );
        assert_eq!(
            Money::from_code(250, "XXX"),
            Err(MoneyError::UnknownCurrency("XXX".to_string()))
        );
        assert!(Money::from_code(250, "").is_err());
    }

    #[rstest]
    #[case(Money::new(7450, Currency::Usd), dec!(74.50))]
    #[case(Money::new(-2550, Currency::Eur), dec!(-25.50))]
    #[case(Money::new(1500, Currency::Jpy), dec!(1500))]
    #[case(Money::new(1250, Currency::Kwd), dec!(1.250))]
    fn test_as_major_units(#[case] money: Money, #[case] expected: Decimal) {
        assert_eq!(money.as_major_units(), expected);
    }

    #[test]
    fn test_from_major_units() {
        assert_eq!(
            Money::from_major_units(dec!(100.00), Currency::Usd).unwrap(),
            Money::new(10_000, Currency::Usd)
        );
        assert_eq!(
            Money::from_major_units(dec!(42), Currency::Jpy).unwrap(),
            Money::new(42, Currency::Jpy)
        );
        assert!(matches!(
            Money::from_major_units(dec!(1.005), Currency::Usd),
            Err(MoneyError::Precision { .. })
        ));
    }

    #[test]
    fn test_add_same_currency() {
        let sum = Money::new(10_000, Currency::Usd)
            .add(Money::new(-2550, Currency::Usd))
            .unwrap();
        assert_eq!(sum, Money::new(7450, Currency::Usd));
    }

    #[test]
    fn test_add_currency_mismatch() {
        let err = Money::new(100, Currency::Usd)
            .add(Money::new(100, Currency::Eur))
            .unwrap_err();
        assert_eq!(
            err,
            MoneyError::CurrencyMismatch {
                expected: Currency::Usd,
                found: Currency::Eur,
            }
        );
    }

    #[test]
    fn test_add_overflow() {
        let result = Money::new(i64::MAX, Currency::Usd).add(Money::new(1, Currency::Usd));
        assert_eq!(result, Err(MoneyError::Overflow(Currency::Usd)));
    }

    #[test]
    fn test_checked_sub() {
        let diff = Money::new(50_000, Currency::Usd)
            .checked_sub(Money::new(20_000, Currency::Usd))
            .unwrap();
        assert_eq!(diff, Money::new(30_000, Currency::Usd));
        assert!(
            Money::new(1, Currency::Usd)
                .checked_sub(Money::new(1, Currency::Gbp))
                .is_err()
        );
    }

    #[test]
    fn test_negate_and_abs() {
        let money = Money::new(4200, Currency::Usd);
        assert_eq!(money.negate().unwrap(), Money::new(-4200, Currency::Usd));
        assert_eq!(money.negate().unwrap().abs().unwrap(), money);
        assert!(Money::new(i64::MIN, Currency::Usd).negate().is_err());
    }

    #[test]
    fn test_ordering_within_currency_only() {
        let small = Money::new(100, Currency::Usd);
        let large = Money::new(200, Currency::Usd);
        let euros = Money::new(50, Currency::Eur);

        assert!(small < large);
        assert_eq!(small.try_cmp(&large).unwrap(), Ordering::Less);
        assert_eq!(small.partial_cmp(&euros), None);
        assert!(small.try_cmp(&euros).is_err());
        assert_ne!(small, Money::new(100, Currency::Eur));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(7450, Currency::Usd).to_string(), "74.50 USD");
        assert_eq!(Money::new(-5, Currency::Eur).to_string(), "-0.05 EUR");
        assert_eq!(Money::new(300, Currency::Jpy).to_string(), "300 JPY");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str("uzs").unwrap(), Currency::Uzs);
        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn test_currency_codes_round_trip() {
        for currency in Currency::ALL {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
            assert_eq!(currency.to_string(), currency.code());
        }
    }
}
