//! Money account domain types.

use chrono::{DateTime, NaiveDate, Utc};
use moneta_shared::types::{Currency, Money, MoneyAccountId, TenantId};
use serde::{Deserialize, Serialize};

use crate::ledger::{
    CreateTransactionInput, LedgerError, LedgerResult, Movement, TransactionDetails,
};

/// Comment of the synthetic deposit recording an opening balance.
pub const OPENING_BALANCE_COMMENT: &str = "Opening balance";

/// A money account.
///
/// `balance` is a cache of the signed sum of every transaction referencing
/// the account and can only change through the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAccount {
    /// Account id.
    pub id: MoneyAccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// External account number.
    pub account_number: String,
    /// Free-text description.
    pub description: String,
    /// Cached balance in the account currency.
    pub balance: Money,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MoneyAccount {
    /// Currency the account is denominated in.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.balance.currency()
    }
}

/// Input for opening a money account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMoneyAccountInput {
    /// Display name.
    pub name: String,
    /// External account number.
    pub account_number: String,
    /// Free-text description.
    pub description: String,
    /// Opening balance; its currency is the account currency.
    pub opening_balance: Money,
    /// Date recorded on the opening-balance deposit.
    pub opened_on: NaiveDate,
}

impl CreateMoneyAccountInput {
    /// Currency of the new account.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.opening_balance.currency()
    }

    /// Returns the synthetic deposit recording the opening balance.
    ///
    /// A zero opening balance records nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a negative opening balance.
    pub fn opening_deposit(
        &self,
        account_id: MoneyAccountId,
    ) -> LedgerResult<Option<CreateTransactionInput>> {
        if self.opening_balance.is_negative() {
            return Err(LedgerError::InvalidAmount(format!(
                "opening balance cannot be negative, got {}",
                self.opening_balance
            )));
        }
        if self.opening_balance.is_zero() {
            return Ok(None);
        }
        Ok(Some(CreateTransactionInput {
            movement: Movement::deposit(account_id, self.opening_balance),
            details: TransactionDetails::on(self.opened_on).with_comment(OPENING_BALANCE_COMMENT),
        }))
    }
}

/// Editable account fields. The balance is never directly settable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMoneyAccountInput {
    /// Display name.
    pub name: String,
    /// External account number.
    pub account_number: String,
    /// Free-text description.
    pub description: String,
}

/// Filter for account lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoneyAccountFilter {
    /// Case-insensitive substring of name, account number, or description.
    pub search: Option<String>,
    /// Only accounts in this currency.
    pub currency: Option<Currency>,
}

/// Sortable account fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyAccountSortField {
    /// Display name.
    Name,
    /// Cached balance in minor units.
    Balance,
    /// Creation timestamp.
    CreatedAt,
}
