//! Balance engine.
//!
//! A money account's balance is the signed sum of every movement that
//! references it: the destination side gains the credited amount (the
//! destination amount for exchanges), the origin side loses `amount`.
//! The cached balance in storage is only a cache of `derive_balance`.

use std::collections::BTreeMap;

use moneta_shared::types::{Currency, Money, MoneyAccountId};
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};
use super::types::Movement;

/// Signed change a movement applies to one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEffect {
    /// Affected account.
    pub account_id: MoneyAccountId,
    /// Signed delta in the account's currency.
    pub delta: Money,
}

impl AccountEffect {
    /// Returns the effect that undoes this one.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the delta cannot be negated.
    pub fn reversed(self) -> LedgerResult<Self> {
        Ok(Self {
            account_id: self.account_id,
            delta: self.delta.negate()?,
        })
    }
}

impl Movement {
    /// Returns the signed effects of this movement, origin first.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the amount cannot be negated.
    pub fn effects(&self) -> LedgerResult<Vec<AccountEffect>> {
        let mut effects = Vec::with_capacity(2);
        if let Some(account_id) = self.origin_account_id {
            effects.push(AccountEffect {
                account_id,
                delta: self.amount.negate()?,
            });
        }
        if let Some(account_id) = self.destination_account_id {
            effects.push(AccountEffect {
                account_id,
                delta: self.credited_amount(),
            });
        }
        Ok(effects)
    }

    /// Returns the effects that undo this movement.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if an amount cannot be negated.
    pub fn reversal_effects(&self) -> LedgerResult<Vec<AccountEffect>> {
        self.effects()?
            .into_iter()
            .map(AccountEffect::reversed)
            .collect()
    }
}

/// Sums effects per account.
///
/// The map is ordered by account id, which is the order rows must be locked
/// in. Accounts whose effects cancel out keep a zero entry.
///
/// # Errors
///
/// Returns `CurrencyMismatch` if one account receives deltas in two
/// currencies, or `AmountOverflow` on overflow.
pub fn net_deltas(
    effects: impl IntoIterator<Item = AccountEffect>,
) -> LedgerResult<BTreeMap<MoneyAccountId, Money>> {
    let mut deltas: BTreeMap<MoneyAccountId, Money> = BTreeMap::new();
    for effect in effects {
        let entry = deltas
            .entry(effect.account_id)
            .or_insert_with(|| Money::zero(effect.delta.currency()));
        *entry = entry.add(effect.delta)?;
    }
    Ok(deltas)
}

/// Net per-account change of replacing `old` with `new`.
///
/// # Errors
///
/// See [`net_deltas`].
pub fn replacement_deltas(
    old: &Movement,
    new: &Movement,
) -> LedgerResult<BTreeMap<MoneyAccountId, Money>> {
    let mut effects = old.reversal_effects()?;
    effects.extend(new.effects()?);
    net_deltas(effects)
}

/// Folds a movement history into the balance of one account.
///
/// Movements that do not reference `account_id` are ignored.
///
/// # Errors
///
/// Returns `CurrencyMismatch` if a movement credits or debits the account in
/// a currency other than `currency`, or `AmountOverflow` on overflow.
pub fn derive_balance<'a>(
    account_id: MoneyAccountId,
    currency: Currency,
    history: impl IntoIterator<Item = &'a Movement>,
) -> LedgerResult<Money> {
    history
        .into_iter()
        .try_fold(Money::zero(currency), |balance, movement| {
            movement
                .effects()?
                .into_iter()
                .filter(|effect| effect.account_id == account_id)
                .try_fold(balance, |acc, effect| {
                    acc.add(effect.delta).map_err(LedgerError::from)
                })
        })
}
