//! Property-based tests for the balance engine.
//!
//! Property 2: Balance Reconciliation
//! Applying net deltas write by write (creates, replacements, deletes)
//! always lands on the balance derived from the surviving history.

use std::collections::BTreeMap;

use moneta_shared::types::{Currency, Money, MoneyAccountId};
use proptest::prelude::*;

use super::balance::{derive_balance, net_deltas, replacement_deltas};
use super::types::Movement;

#[derive(Debug, Clone)]
enum Op {
    Deposit { to: usize, amount: i64 },
    Withdraw { from: usize, amount: i64 },
    Transfer { from: usize, to: usize, amount: i64 },
    Replace { index: usize, amount: i64 },
    Delete { index: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let account = 0usize..3;
    let amount = 1i64..1_000_000i64;
    prop_oneof![
        (account.clone(), amount.clone()).prop_map(|(to, amount)| Op::Deposit { to, amount }),
        (account.clone(), amount.clone()).prop_map(|(from, amount)| Op::Withdraw { from, amount }),
        (account.clone(), account, amount.clone())
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (any::<usize>(), amount).prop_map(|(index, amount)| Op::Replace { index, amount }),
        any::<usize>().prop_map(|index| Op::Delete { index }),
    ]
}

fn usd(minor: i64) -> Money {
    Money::new(minor, Currency::Usd)
}

fn apply(cache: &mut BTreeMap<MoneyAccountId, Money>, deltas: BTreeMap<MoneyAccountId, Money>) {
    for (account, delta) in deltas {
        let entry = cache.entry(account).or_insert_with(|| usd(0));
        *entry = entry.add(delta).unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 2.1: Incremental cache equals the derived balance.
    #[test]
    fn prop_incremental_matches_derived(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let accounts = [MoneyAccountId::new(), MoneyAccountId::new(), MoneyAccountId::new()];
        let mut history: Vec<Movement> = Vec::new();
        let mut cache: BTreeMap<MoneyAccountId, Money> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Deposit { to, amount } => {
                    let movement = Movement::deposit(accounts[to], usd(amount));
                    apply(&mut cache, net_deltas(movement.effects().unwrap()).unwrap());
                    history.push(movement);
                }
                Op::Withdraw { from, amount } => {
                    let movement = Movement::withdrawal(accounts[from], usd(amount));
                    apply(&mut cache, net_deltas(movement.effects().unwrap()).unwrap());
                    history.push(movement);
                }
                Op::Transfer { from, to, amount } => {
                    if from == to {
                        continue;
                    }
                    let movement = Movement::transfer(accounts[from], accounts[to], usd(amount));
                    apply(&mut cache, net_deltas(movement.effects().unwrap()).unwrap());
                    history.push(movement);
                }
                Op::Replace { index, amount } => {
                    if history.is_empty() {
                        continue;
                    }
                    let index = index % history.len();
                    let mut replacement = history[index];
                    replacement.amount = usd(amount);
                    apply(&mut cache, replacement_deltas(&history[index], &replacement).unwrap());
                    history[index] = replacement;
                }
                Op::Delete { index } => {
                    if history.is_empty() {
                        continue;
                    }
                    let removed = history.remove(index % history.len());
                    apply(&mut cache, net_deltas(removed.reversal_effects().unwrap()).unwrap());
                }
            }
        }

        for account in accounts {
            let derived = derive_balance(account, Currency::Usd, &history).unwrap();
            let cached = cache.get(&account).copied().unwrap_or(usd(0));
            prop_assert_eq!(cached, derived);
        }
    }

    /// Property 2.2: A transfer's net deltas sum to zero.
    #[test]
    fn prop_transfer_conserves_money(amount in 1i64..1_000_000_000i64) {
        let movement =
            Movement::transfer(MoneyAccountId::new(), MoneyAccountId::new(), usd(amount));
        let total = net_deltas(movement.effects().unwrap())
            .unwrap()
            .into_values()
            .try_fold(usd(0), Money::add)
            .unwrap();
        prop_assert!(total.is_zero());
    }
}
