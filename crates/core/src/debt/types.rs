//! Debt domain types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use moneta_shared::types::{CounterpartyId, DebtId, Money, TenantId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::ledger::{LedgerError, LedgerResult};

/// Direction of a debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtType {
    /// The counterparty owes the tenant.
    Receivable,
    /// The tenant owes the counterparty.
    Payable,
}

impl DebtType {
    /// Returns the lowercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receivable => "receivable",
            Self::Payable => "payable",
        }
    }
}

/// Debt status.
///
/// `Open → PartiallySettled → Settled`, and `Open | PartiallySettled →
/// Cancelled`. `Settled` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    /// Nothing settled yet.
    Open,
    /// Some of the original amount settled.
    PartiallySettled,
    /// Fully settled, outstanding is zero.
    Settled,
    /// Written off.
    Cancelled,
}

impl DebtStatus {
    /// Returns the snake_case name used in storage and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::PartiallySettled => "partially_settled",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled)
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A receivable or payable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    /// Debt id.
    pub id: DebtId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Direction.
    pub debt_type: DebtType,
    /// Lifecycle status.
    pub status: DebtStatus,
    /// The other party.
    pub counterparty_id: CounterpartyId,
    /// Amount at creation.
    pub original_amount: Money,
    /// Amount still owed, same currency as `original_amount`.
    pub outstanding_amount: Money,
    /// Free-text description.
    pub description: String,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Transaction that settled the debt, if any.
    pub settlement_transaction_id: Option<TransactionId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a debt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDebtInput {
    /// Direction.
    pub debt_type: DebtType,
    /// The other party.
    pub counterparty_id: CounterpartyId,
    /// Amount owed.
    pub original_amount: Money,
    /// Free-text description.
    pub description: String,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

impl CreateDebtInput {
    /// Validates the input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` unless the original amount is positive.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.original_amount.is_positive() {
            Ok(())
        } else {
            Err(LedgerError::InvalidAmount(format!(
                "debt amount must be positive, got {}",
                self.original_amount
            )))
        }
    }
}

/// Editable debt metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDebtInput {
    /// The other party.
    pub counterparty_id: CounterpartyId,
    /// Free-text description.
    pub description: String,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

/// Filter for debt lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebtFilter {
    /// Only this counterparty.
    pub counterparty_id: Option<CounterpartyId>,
    /// Only this direction.
    pub debt_type: Option<DebtType>,
    /// Only this status.
    pub status: Option<DebtStatus>,
    /// Created at or after.
    pub created_from: Option<DateTime<Utc>>,
    /// Created at or before.
    pub created_to: Option<DateTime<Utc>>,
}

/// Sortable debt fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtSortField {
    /// Creation timestamp.
    CreatedAt,
    /// Due date.
    DueDate,
    /// Outstanding amount in minor units.
    OutstandingAmount,
}
