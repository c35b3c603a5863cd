//! Debt tracking: receivables and payables settled through the ledger.
//!
//! This module implements:
//! - Debt types and the status machine
//! - Settlement and correction rules (`lifecycle`)
//! - Per-counterparty aggregation (`summary`)
//! - The `DebtStore` persistence seam

pub mod lifecycle;
pub mod store;
pub mod summary;
pub mod types;

#[cfg(test)]
mod lifecycle_props;

pub use store::DebtStore;
pub use summary::{CounterpartyDebtSummary, summarize_by_counterparty};
pub use types::{
    CreateDebtInput, Debt, DebtFilter, DebtSortField, DebtStatus, DebtType, UpdateDebtInput,
};
