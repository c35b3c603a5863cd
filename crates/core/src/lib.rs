//! Core ledger logic for Moneta.
//!
//! This crate contains pure business logic with ZERO database dependencies.
//! All domain types, validation rules, and balance calculations live here,
//! together with the store traits the `moneta-db` crate implements.
//!
//! # Modules
//!
//! - `ledger` - Transactions, shape validation, and the balance engine
//! - `account` - Money accounts and opening balances
//! - `debt` - Receivable/payable lifecycle and counterparty summaries
//! - `payment` - Deposits with counterparty and category metadata
//! - `expense` - Categorized withdrawals
//! - `attachment` - File-id sets linked to payments and expenses
//! - `query` - Filter, sort, and page parameters for list operations

pub mod account;
pub mod attachment;
pub mod debt;
pub mod expense;
pub mod ledger;
pub mod payment;
pub mod query;

pub use ledger::{EntityKind, LedgerError, LedgerResult};
pub use query::FindParams;
