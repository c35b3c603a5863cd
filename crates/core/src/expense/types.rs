//! Expense domain types.

use chrono::{DateTime, NaiveDate, Utc};
use moneta_shared::types::{CategoryId, ExpenseId, FileId, Money, MoneyAccountId, TenantId};
use serde::{Deserialize, Serialize};

use crate::attachment::AttachmentSet;
use crate::ledger::{
    CreateTransactionInput, LedgerResult, Movement, Transaction, TransactionDetails,
};

/// An expense paid from a money account.
///
/// The underlying withdrawal stores a positive magnitude; the expense's
/// signed amount is that magnitude negated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense id.
    pub id: ExpenseId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Underlying withdrawal.
    pub transaction: Transaction,
    /// Expense category.
    pub category_id: CategoryId,
    /// Attached files.
    pub attachments: AttachmentSet,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Positive amount spent.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.transaction.movement.amount
    }

    /// Amount as it affects the account: the magnitude negated.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the magnitude cannot be negated.
    pub fn signed_amount(&self) -> LedgerResult<Money> {
        Ok(self.amount().negate()?)
    }

    /// Comment of the underlying withdrawal.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.transaction.details.comment
    }

    /// Account the expense was paid from.
    #[must_use]
    pub fn account_id(&self) -> Option<MoneyAccountId> {
        self.transaction.movement.origin_account_id
    }
}

/// Input for recording (or fully replacing) an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateExpenseInput {
    /// Positive magnitude spent.
    pub amount: Money,
    /// Paying account.
    pub account_id: MoneyAccountId,
    /// Expense category.
    pub category_id: CategoryId,
    /// Dates and comment of the withdrawal.
    pub details: TransactionDetails,
    /// Files to attach.
    pub attachments: Vec<FileId>,
}

/// Full replacement of an expense.
pub type UpdateExpenseInput = CreateExpenseInput;

impl CreateExpenseInput {
    /// Withdrawal recording this expense.
    #[must_use]
    pub fn transaction_input(&self) -> CreateTransactionInput {
        CreateTransactionInput {
            movement: Movement::withdrawal(self.account_id, self.amount),
            details: self.details.clone(),
        }
    }

    /// Attachment set, rejecting duplicate file ids.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAttachment` for a repeated file id.
    pub fn attachment_set(&self) -> LedgerResult<AttachmentSet> {
        AttachmentSet::from_ids(self.attachments.iter().copied())
    }
}

/// Filter for expense lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    /// Only this category.
    pub category_id: Option<CategoryId>,
    /// Only withdrawals from this account.
    pub account_id: Option<MoneyAccountId>,
    /// Inclusive lower bound on the transaction date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the transaction date.
    pub date_to: Option<NaiveDate>,
}

/// Sortable expense fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseSortField {
    /// Transaction date.
    TransactionDate,
    /// Creation timestamp.
    CreatedAt,
    /// Amount in minor units.
    Amount,
}
