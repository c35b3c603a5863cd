//! String-backed enums stored in short `VARCHAR` columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored form of `moneta_core::ledger::TransactionKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionKind {
    /// Deposit.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Withdrawal.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Transfer.
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// Exchange.
    #[sea_orm(string_value = "exchange")]
    Exchange,
}

/// Stored form of `moneta_core::debt::DebtType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DebtType {
    /// Receivable.
    #[sea_orm(string_value = "receivable")]
    Receivable,
    /// Payable.
    #[sea_orm(string_value = "payable")]
    Payable,
}

/// Stored form of `moneta_core::debt::DebtStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum DebtStatus {
    /// Open.
    #[sea_orm(string_value = "open")]
    Open,
    /// Partially settled.
    #[sea_orm(string_value = "partially_settled")]
    PartiallySettled,
    /// Settled.
    #[sea_orm(string_value = "settled")]
    Settled,
    /// Cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<moneta_core::ledger::TransactionKind> for TransactionKind {
    fn from(kind: moneta_core::ledger::TransactionKind) -> Self {
        use moneta_core::ledger::TransactionKind as Domain;
        match kind {
            Domain::Deposit => Self::Deposit,
            Domain::Withdrawal => Self::Withdrawal,
            Domain::Transfer => Self::Transfer,
            Domain::Exchange => Self::Exchange,
        }
    }
}

impl From<TransactionKind> for moneta_core::ledger::TransactionKind {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Deposit => Self::Deposit,
            TransactionKind::Withdrawal => Self::Withdrawal,
            TransactionKind::Transfer => Self::Transfer,
            TransactionKind::Exchange => Self::Exchange,
        }
    }
}

impl From<moneta_core::debt::DebtType> for DebtType {
    fn from(debt_type: moneta_core::debt::DebtType) -> Self {
        match debt_type {
            moneta_core::debt::DebtType::Receivable => Self::Receivable,
            moneta_core::debt::DebtType::Payable => Self::Payable,
        }
    }
}

impl From<DebtType> for moneta_core::debt::DebtType {
    fn from(debt_type: DebtType) -> Self {
        match debt_type {
            DebtType::Receivable => Self::Receivable,
            DebtType::Payable => Self::Payable,
        }
    }
}

impl From<moneta_core::debt::DebtStatus> for DebtStatus {
    fn from(status: moneta_core::debt::DebtStatus) -> Self {
        use moneta_core::debt::DebtStatus as Domain;
        match status {
            Domain::Open => Self::Open,
            Domain::PartiallySettled => Self::PartiallySettled,
            Domain::Settled => Self::Settled,
            Domain::Cancelled => Self::Cancelled,
        }
    }
}

impl From<DebtStatus> for moneta_core::debt::DebtStatus {
    fn from(status: DebtStatus) -> Self {
        match status {
            DebtStatus::Open => Self::Open,
            DebtStatus::PartiallySettled => Self::PartiallySettled,
            DebtStatus::Settled => Self::Settled,
            DebtStatus::Cancelled => Self::Cancelled,
        }
    }
}
