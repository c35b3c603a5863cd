//! Payment domain types.

use chrono::{DateTime, NaiveDate, Utc};
use moneta_shared::types::{
    CategoryId, CounterpartyId, FileId, Money, MoneyAccountId, PaymentId, TenantId,
};
use serde::{Deserialize, Serialize};

use crate::attachment::AttachmentSet;
use crate::ledger::{
    CreateTransactionInput, LedgerResult, Movement, Transaction, TransactionDetails,
};

/// Category of a payment. A missing category is explicit, not a placeholder row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCategory {
    /// No category assigned.
    #[default]
    Uncategorized,
    /// Assigned category.
    Category(CategoryId),
}

impl PaymentCategory {
    /// Returns the category id, if any.
    #[must_use]
    pub const fn id(self) -> Option<CategoryId> {
        match self {
            Self::Uncategorized => None,
            Self::Category(id) => Some(id),
        }
    }
}

impl From<Option<CategoryId>> for PaymentCategory {
    fn from(id: Option<CategoryId>) -> Self {
        id.map_or(Self::Uncategorized, Self::Category)
    }
}

/// A payment received into a money account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment id.
    pub id: PaymentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Underlying deposit.
    pub transaction: Transaction,
    /// Payer.
    pub counterparty_id: CounterpartyId,
    /// Category.
    pub category: PaymentCategory,
    /// Attached files.
    pub attachments: AttachmentSet,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Amount received.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.transaction.movement.amount
    }

    /// Account the payment was deposited into.
    #[must_use]
    pub fn account_id(&self) -> Option<MoneyAccountId> {
        self.transaction.movement.destination_account_id
    }
}

/// Input for recording (or fully replacing) a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentInput {
    /// Amount received, positive.
    pub amount: Money,
    /// Receiving account.
    pub account_id: MoneyAccountId,
    /// Payer.
    pub counterparty_id: CounterpartyId,
    /// Category.
    pub category: PaymentCategory,
    /// Dates and comment of the deposit.
    pub details: TransactionDetails,
    /// Files to attach.
    pub attachments: Vec<FileId>,
}

/// Full replacement of a payment.
pub type UpdatePaymentInput = CreatePaymentInput;

impl CreatePaymentInput {
    /// Deposit recording this payment.
    #[must_use]
    pub fn transaction_input(&self) -> CreateTransactionInput {
        CreateTransactionInput {
            movement: Movement::deposit(self.account_id, self.amount),
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

/// Filter for payment lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    /// Only this payer.
    pub counterparty_id: Option<CounterpartyId>,
    /// Only this category (`Uncategorized` matches payments without one).
    pub category: Option<PaymentCategory>,
    /// Only deposits into this account.
    pub account_id: Option<MoneyAccountId>,
    /// Inclusive lower bound on the transaction date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the transaction date.
    pub date_to: Option<NaiveDate>,
}

/// Sortable payment fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSortField {
    /// Transaction date.
    TransactionDate,
    /// Creation timestamp.
    CreatedAt,
    /// Amount in minor units.
    Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerError, TransactionKind};
    use moneta_shared::types::Currency;

    fn input(attachments: Vec<FileId>) -> CreatePaymentInput {
        CreatePaymentInput {
            amount: Money::new(12_500, Currency::Usd),
            account_id: MoneyAccountId::new(),
            counterparty_id: CounterpartyId::new(),
            category: PaymentCategory::Uncategorized,
            details: TransactionDetails::on(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()),
            attachments,
        }
    }

    #[test]
    fn test_transaction_input_is_deposit() {
        let input = input(vec![]);
        let tx = input.transaction_input();
        assert_eq!(tx.movement.kind, TransactionKind::Deposit);
        assert_eq!(tx.movement.destination_account_id, Some(input.account_id));
        assert_eq!(tx.movement.origin_account_id, None);
        assert_eq!(tx.movement.amount, input.amount);
    }

    #[test]
    fn test_duplicate_attachments_rejected() {
        let file = FileId::new();
        assert_eq!(
            input(vec![file, file]).attachment_set(),
            Err(LedgerError::DuplicateAttachment(file))
        );
    }

    #[test]
    fn test_category_from_option() {
        let id = CategoryId::new();
        assert_eq!(PaymentCategory::from(Some(id)), PaymentCategory::Category(id));
        assert_eq!(PaymentCategory::from(None), PaymentCategory::Uncategorized);
        assert_eq!(PaymentCategory::Category(id).id(), Some(id));
        assert_eq!(PaymentCategory::default(), PaymentCategory::Uncategorized);
    }
}
