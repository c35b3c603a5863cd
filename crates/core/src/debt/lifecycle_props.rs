//! Property-based tests for the debt lifecycle.
//!
//! Property 3: Debt Non-Negativity
//! For any sequence of partial settlements, the outstanding amount never
//! goes negative, never exceeds the original, and a rejected settlement
//! leaves the debt unchanged.

use chrono::Utc;
use moneta_shared::types::{CounterpartyId, Currency, Money, TenantId};
use proptest::prelude::*;

use super::types::{CreateDebtInput, Debt, DebtStatus, DebtType};

/// Strategy to generate a settlement amount, including invalid ones.
fn settlement_amount() -> impl Strategy<Value = i64> {
    prop_oneof![
        8 => 1i64..20_000i64,
        1 => -1_000i64..=0i64,
    ]
}

fn open_debt(original: i64) -> Debt {
    Debt::open(
        TenantId::new(),
        CreateDebtInput {
            debt_type: DebtType::Receivable,
            counterparty_id: CounterpartyId::new(),
            original_amount: Money::new(original, Currency::Usd),
            description: String::new(),
            due_date: None,
        },
        Utc::now(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 3.1: Outstanding stays within [0, original] and failures are no-ops.
    #[test]
    fn prop_outstanding_never_negative(
        original in 1i64..100_000i64,
        settlements in prop::collection::vec(settlement_amount(), 1..30),
    ) {
        let mut debt = open_debt(original);

        for amount in settlements {
            let before = debt.clone();
            let result =
                debt.record_partial_settlement(Money::new(amount, Currency::Usd), Utc::now());

            match result {
                Ok(()) => {
                    prop_assert_eq!(
                        debt.outstanding_amount.amount_minor(),
                        before.outstanding_amount.amount_minor() - amount
                    );
                }
                Err(_) => prop_assert_eq!(&debt, &before),
            }

            prop_assert!(!debt.outstanding_amount.is_negative());
            prop_assert!(debt.outstanding_amount.amount_minor() <= original);
            prop_assert!(debt.validate().is_ok());
            prop_assert_eq!(
                debt.status == DebtStatus::Settled,
                debt.outstanding_amount.is_zero()
            );
        }
    }

    /// Property 3.2: Settled debts reject every further settlement.
    #[test]
    fn prop_settled_is_terminal(
        original in 1i64..100_000i64,
        extra in 1i64..100_000i64,
    ) {
        let mut debt = open_debt(original);
        debt.record_partial_settlement(Money::new(original, Currency::Usd), Utc::now()).unwrap();
        prop_assert_eq!(debt.status, DebtStatus::Settled);

        let before = debt.clone();
        prop_assert!(
            debt.record_partial_settlement(Money::new(extra, Currency::Usd), Utc::now())
                .is_err()
        );
        prop_assert_eq!(debt, before);
    }
}
