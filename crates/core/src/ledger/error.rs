//! Ledger error types.
//!
//! Every ledger, account, debt, payment, and expense operation reports
//! failures through `LedgerError`. Validation errors are produced before any
//! durable write; `Storage` wraps failures of the persistence layer.

use std::fmt;

use moneta_shared::AppError;
use moneta_shared::types::{Currency, DebtId, FileId, Money, MoneyError, TransactionId};
use thiserror::Error;
use uuid::Uuid;

use super::types::TransactionKind;
use crate::debt::DebtStatus;

/// Result type alias using `LedgerError`.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Entity named by a `NotFound` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Money account.
    MoneyAccount,
    /// Ledger transaction.
    Transaction,
    /// Debt.
    Debt,
    /// Payment.
    Payment,
    /// Expense.
    Expense,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MoneyAccount => "Money account",
            Self::Transaction => "Transaction",
            Self::Debt => "Debt",
            Self::Payment => "Payment",
            Self::Expense => "Expense",
        })
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Money Errors ==========
    /// Two amounts or an amount and an account disagree on currency.
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Currency required by the context.
        expected: Currency,
        /// Currency actually supplied.
        found: Currency,
    },

    /// Currency code is not registered.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Arithmetic left the `i64` minor-unit range.
    #[error("Amount overflow")]
    AmountOverflow,

    /// Amount or rate is not acceptable (zero, negative, too precise).
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // ========== Transaction Errors ==========
    /// Account references or exchange data do not fit the kind.
    #[error("Invalid {kind} transaction: {reason}")]
    InvalidTransactionShape {
        /// Kind of the rejected transaction.
        kind: TransactionKind,
        /// What is wrong with it.
        reason: String,
    },

    /// Transaction belongs to a payment or expense and must be changed
    /// through it.
    #[error("Transaction {transaction_id} is owned by a {owner} and cannot be changed directly")]
    TransactionOwned {
        /// The owned transaction.
        transaction_id: TransactionId,
        /// Kind of the owning record.
        owner: EntityKind,
    },

    // ========== Debt Errors ==========
    /// Settlement larger than the outstanding amount.
    #[error("Settlement of {requested} exceeds outstanding {outstanding} on debt {debt_id}")]
    OverSettlement {
        /// The debt.
        debt_id: DebtId,
        /// Requested settlement.
        requested: Money,
        /// Outstanding amount at the time of the request.
        outstanding: Money,
    },

    /// Operation not permitted in the debt's current status.
    #[error("Cannot {action} debt {debt_id} in status {from}")]
    InvalidDebtTransition {
        /// The debt.
        debt_id: DebtId,
        /// Status the debt was in.
        from: DebtStatus,
        /// Attempted operation.
        action: &'static str,
    },

    /// Transaction was already applied as a debt settlement.
    #[error("Transaction {transaction_id} already settles debt {debt_id}")]
    SettlementAlreadyApplied {
        /// The settlement transaction.
        transaction_id: TransactionId,
        /// Debt it was applied to.
        debt_id: DebtId,
    },

    // ========== Lookup Errors ==========
    /// Entity does not exist in the tenant.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: EntityKind,
        /// Requested id.
        id: Uuid,
    },

    // ========== Attachment Errors ==========
    /// File id appears twice in one attachment set.
    #[error("File {0} is already attached")]
    DuplicateAttachment(FileId),

    /// File id is not part of the attachment set.
    #[error("File {0} is not attached")]
    AttachmentNotFound(FileId),

    // ========== Storage Errors ==========
    /// Persistence layer failure; the unit of work was rolled back.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Builds a `NotFound` error for `entity` with the given typed id.
    pub fn not_found(entity: EntityKind, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Builds an `InvalidTransactionShape` error.
    pub fn shape(kind: TransactionKind, reason: impl Into<String>) -> Self {
        Self::InvalidTransactionShape {
            kind,
            reason: reason.into(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidTransactionShape { .. } => "INVALID_TRANSACTION_SHAPE",
            Self::TransactionOwned { .. } => "TRANSACTION_OWNED",
            Self::OverSettlement { .. } => "OVER_SETTLEMENT",
            Self::InvalidDebtTransition { .. } => "INVALID_DEBT_TRANSITION",
            Self::SettlementAlreadyApplied { .. } => "SETTLEMENT_ALREADY_APPLIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DuplicateAttachment(_) => "DUPLICATE_ATTACHMENT",
            Self::AttachmentNotFound(_) => "ATTACHMENT_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::CurrencyMismatch { .. }
            | Self::UnknownCurrency(_)
            | Self::InvalidAmount(_)
            | Self::InvalidTransactionShape { .. } => 400,

            // 404 Not Found
            Self::NotFound { .. } | Self::AttachmentNotFound(_) => 404,

            // 409 Conflict
            Self::DuplicateAttachment(_)
            | Self::TransactionOwned { .. }
            | Self::SettlementAlreadyApplied { .. } => 409,

            // 422 Unprocessable - business rule violations
            Self::AmountOverflow
            | Self::OverSettlement { .. }
            | Self::InvalidDebtTransition { .. } => 422,

            // 500 Internal Server Error
            Self::Storage(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::CurrencyMismatch { expected, found } => {
                Self::CurrencyMismatch { expected, found }
            }
            MoneyError::UnknownCurrency(code) => Self::UnknownCurrency(code),
            MoneyError::Overflow(_) => Self::AmountOverflow,
            err @ MoneyError::Precision { .. } => Self::InvalidAmount(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::CurrencyMismatch { .. }
            | LedgerError::UnknownCurrency(_)
            | LedgerError::InvalidAmount(_)
            | LedgerError::InvalidTransactionShape { .. } => Self::Validation(message),
            LedgerError::NotFound { .. } | LedgerError::AttachmentNotFound(_) => {
                Self::NotFound(message)
            }
            LedgerError::DuplicateAttachment(_)
            | LedgerError::TransactionOwned { .. }
            | LedgerError::SettlementAlreadyApplied { .. } => Self::Conflict(message),
            LedgerError::AmountOverflow
            | LedgerError::OverSettlement { .. }
            | LedgerError::InvalidDebtTransition { .. } => Self::BusinessRule(message),
            LedgerError::Storage(_) => Self::Database(message),
        }
    }
}
