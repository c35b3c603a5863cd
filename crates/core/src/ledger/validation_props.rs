//! Property-based tests for transaction shape validation.
//!
//! Property 1: Transaction Shape Invariant
//! For every kind and every combination of origin, destination, and exchange
//! presence, validation accepts exactly the shapes the kind allows.

use moneta_shared::types::{Currency, Money, MoneyAccountId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{ExchangeDetails, Movement, TransactionKind};
use super::validation::validate_movement;

/// Strategy to generate a transaction kind.
fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
    prop::sample::select(TransactionKind::ALL.to_vec())
}

/// Strategy to generate a valid positive amount in minor units.
fn positive_minor() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

fn expected_valid(kind: TransactionKind, origin: bool, destination: bool, exchange: bool) -> bool {
    match kind {
        TransactionKind::Deposit => !origin && destination && !exchange,
        TransactionKind::Withdrawal => origin && !destination && !exchange,
        TransactionKind::Transfer => origin && destination && !exchange,
        TransactionKind::Exchange => origin && destination && exchange,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1.1: Shape validity is decided by kind and presence alone.
    #[test]
    fn prop_shape_matches_kind(
        kind in kind_strategy(),
        has_origin in any::<bool>(),
        has_destination in any::<bool>(),
        has_exchange in any::<bool>(),
        amount in positive_minor(),
        destination_amount in positive_minor(),
    ) {
        let movement = Movement {
            kind,
            amount: Money::new(amount, Currency::Usd),
            origin_account_id: has_origin.then(MoneyAccountId::new),
            destination_account_id: has_destination.then(MoneyAccountId::new),
            exchange: has_exchange.then(|| ExchangeDetails {
                rate: Decimal::new(92, 2),
                destination_amount: Money::new(destination_amount, Currency::Eur),
            }),
        };

        let result = validate_movement(&movement);
        if expected_valid(kind, has_origin, has_destination, has_exchange) {
            prop_assert!(result.is_ok(), "expected valid: {:?}", result);
        } else {
            let is_shape_error = matches!(
                result,
                Err(LedgerError::InvalidTransactionShape { kind: k, .. }) if k == kind
            );
            prop_assert!(is_shape_error, "expected shape error, got {:?}", result);
        }
    }

    /// Property 1.2: Non-positive amounts are rejected on well-shaped movements.
    #[test]
    fn prop_non_positive_amount_rejected(
        amount in -100_000_000i64..=0i64,
    ) {
        let movement =
            Movement::withdrawal(MoneyAccountId::new(), Money::new(amount, Currency::Usd));
        prop_assert!(matches!(validate_movement(&movement), Err(LedgerError::InvalidAmount(_))));
    }

    /// Property 1.3: A movement never references the same account twice.
    #[test]
    fn prop_same_account_rejected(
        amount in positive_minor(),
        exchange in any::<bool>(),
    ) {
        let account = MoneyAccountId::new();
        let movement = if exchange {
            Movement::exchange(
                account,
                account,
                Money::new(amount, Currency::Usd),
                Decimal::ONE,
                Money::new(amount, Currency::Gbp),
            )
        } else {
            Movement::transfer(account, account, Money::new(amount, Currency::Usd))
        };
        let is_shape_error = matches!(
            validate_movement(&movement),
            Err(LedgerError::InvalidTransactionShape { .. })
        );
        prop_assert!(is_shape_error);
    }
}
