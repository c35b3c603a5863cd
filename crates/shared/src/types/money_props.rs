//! Property-based tests for `Money`.
//!
//! - Arithmetic never changes the currency of its inputs
//! - Cross-currency addition always fails with `CurrencyMismatch`

use proptest::prelude::*;

use super::money::{Currency, Money, MoneyError};

/// Strategy to generate registered currencies.
fn currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

/// Strategy to generate amounts that cannot overflow when added once.
fn amount() -> impl Strategy<Value = i64> {
    -1_000_000_000_000i64..1_000_000_000_000i64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Adding two same-currency values keeps the currency and sums minor units.
    #[test]
    fn prop_add_preserves_currency(
        a in amount(),
        b in amount(),
        c in currency(),
    ) {
        let sum = Money::new(a, c).add(Money::new(b, c)).unwrap();
        prop_assert_eq!(sum.currency(), c);
        prop_assert_eq!(sum.amount_minor(), a + b);
    }

    /// Negation keeps the currency and is its own inverse.
    #[test]
    fn prop_negate_preserves_currency(
        a in amount(),
        c in currency(),
    ) {
        let money = Money::new(a, c);
        let negated = money.negate().unwrap();
        prop_assert_eq!(negated.currency(), c);
        prop_assert_eq!(negated.negate().unwrap(), money);
    }

    /// Adding values of two different currencies always fails.
    #[test]
    fn prop_cross_currency_add_fails(
        a in amount(),
        b in amount(),
        left in currency(),
        right in currency(),
    ) {
        prop_assume!(left != right);
        let result = Money::new(a, left).add(Money::new(b, right));
        prop_assert_eq!(
            result,
            Err(MoneyError::CurrencyMismatch { expected: left, found: right })
        );
    }

    /// Major-unit conversion round-trips through minor units.
    #[test]
    fn prop_major_units_round_trip(
        a in amount(),
        c in currency(),
    ) {
        let money = Money::new(a, c);
        let back = Money::from_major_units(money.as_major_units(), c).unwrap();
        prop_assert_eq!(back, money);
    }
}
