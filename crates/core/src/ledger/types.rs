//! Ledger domain types.
//!
//! A `Transaction` is the only record that moves money. Its `Movement`
//! carries a positive magnitude; the direction is implied by the kind and by
//! which account references are populated.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use moneta_shared::types::{Currency, Money, MoneyAccountId, TenantId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money enters a destination account.
    Deposit,
    /// Money leaves an origin account.
    Withdrawal,
    /// Money moves between two accounts of the same currency.
    Transfer,
    /// Money moves between two accounts of different currencies.
    Exchange,
}

impl TransactionKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Deposit, Self::Withdrawal, Self::Transfer, Self::Exchange];

    /// Returns the lowercase name used in storage and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
            Self::Exchange => "exchange",
        }
    }

    /// Returns true if this kind debits an origin account.
    #[must_use]
    pub const fn requires_origin(self) -> bool {
        !matches!(self, Self::Deposit)
    }

    /// Returns true if this kind credits a destination account.
    #[must_use]
    pub const fn requires_destination(self) -> bool {
        !matches!(self, Self::Withdrawal)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second leg of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDetails {
    /// Rate applied by the caller; recorded, not recomputed.
    pub rate: Decimal,
    /// Amount credited to the destination account, in its currency.
    pub destination_amount: Money,
}

/// The money-moving part of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Positive magnitude in the origin (or deposit) currency.
    pub amount: Money,
    /// Debited account.
    pub origin_account_id: Option<MoneyAccountId>,
    /// Credited account.
    pub destination_account_id: Option<MoneyAccountId>,
    /// Exchange leg, present only for `Exchange`.
    pub exchange: Option<ExchangeDetails>,
}

impl Movement {
    /// Money entering `destination`.
    #[must_use]
    pub const fn deposit(destination: MoneyAccountId, amount: Money) -> Self {
        Self {
            kind: TransactionKind::Deposit,
            amount,
            origin_account_id: None,
            destination_account_id: Some(destination),
            exchange: None,
        }
    }

    /// Money leaving `origin`.
    #[must_use]
    pub const fn withdrawal(origin: MoneyAccountId, amount: Money) -> Self {
        Self {
            kind: TransactionKind::Withdrawal,
            amount,
            origin_account_id: Some(origin),
            destination_account_id: None,
            exchange: None,
        }
    }

    /// Same-currency move from `origin` to `destination`.
    #[must_use]
    pub const fn transfer(
        origin: MoneyAccountId,
        destination: MoneyAccountId,
        amount: Money,
    ) -> Self {
        Self {
            kind: TransactionKind::Transfer,
            amount,
            origin_account_id: Some(origin),
            destination_account_id: Some(destination),
            exchange: None,
        }
    }

    /// Cross-currency move: `amount` leaves `origin`, `destination_amount` enters `destination`.
    #[must_use]
    pub const fn exchange(
        origin: MoneyAccountId,
        destination: MoneyAccountId,
        amount: Money,
        rate: Decimal,
        destination_amount: Money,
    ) -> Self {
        Self {
            kind: TransactionKind::Exchange,
            amount,
            origin_account_id: Some(origin),
            destination_account_id: Some(destination),
            exchange: Some(ExchangeDetails {
                rate,
                destination_amount,
            }),
        }
    }

    /// Amount credited to the destination side.
    ///
    /// For an exchange this is the destination amount, otherwise `amount`.
    #[must_use]
    pub fn credited_amount(&self) -> Money {
        self.exchange
            .map_or(self.amount, |exchange| exchange.destination_amount)
    }

    /// Currency the destination account must hold.
    #[must_use]
    pub fn destination_currency(&self) -> Currency {
        self.credited_amount().currency()
    }

    /// Referenced account ids, without duplicates, in ascending order.
    #[must_use]
    pub fn account_ids(&self) -> Vec<MoneyAccountId> {
        let mut ids: Vec<MoneyAccountId> = self
            .origin_account_id
            .into_iter()
            .chain(self.destination_account_id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Descriptive metadata of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    /// Date the money moved.
    pub transaction_date: NaiveDate,
    /// Date of the accounting period the transaction is reported in.
    pub accounting_period: NaiveDate,
    /// Free-text comment.
    pub comment: String,
}

impl TransactionDetails {
    /// Details dated `date` in the period of the same date, without comment.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            transaction_date: date,
            accounting_period: date,
            comment: String::new(),
        }
    }

    /// Replaces the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Replaces the accounting period.
    #[must_use]
    pub fn in_period(mut self, period: NaiveDate) -> Self {
        self.accounting_period = period;
        self
    }
}

/// A persisted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id.
    pub id: TransactionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Money movement.
    pub movement: Movement,
    /// Dates and comment.
    pub details: TransactionDetails,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a new transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTransactionInput {
    /// Money movement.
    pub movement: Movement,
    /// Dates and comment.
    pub details: TransactionDetails,
}

/// Full replacement of a transaction's movement and metadata.
pub type UpdateTransactionInput = CreateTransactionInput;

/// Filter for transaction lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only this kind.
    pub kind: Option<TransactionKind>,
    /// Account on either side.
    pub account_id: Option<MoneyAccountId>,
    /// Debited account.
    pub origin_account_id: Option<MoneyAccountId>,
    /// Credited account.
    pub destination_account_id: Option<MoneyAccountId>,
    /// Inclusive lower bound on the transaction date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the transaction date.
    pub date_to: Option<NaiveDate>,
    /// Exact accounting period.
    pub accounting_period: Option<NaiveDate>,
    /// Case-insensitive substring of the comment.
    pub comment_contains: Option<String>,
}

/// Sortable transaction fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSortField {
    /// Transaction date.
    TransactionDate,
    /// Accounting period.
    AccountingPeriod,
    /// Amount in minor units.
    Amount,
    /// Creation timestamp.
    CreatedAt,
}
