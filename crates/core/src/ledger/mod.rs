//! Ledger logic: the transaction record and everything derived from it.
//!
//! This module implements:
//! - Transaction movements and their shape rules per kind
//! - The balance engine (signed effects, net deltas, derived balances)
//! - The error taxonomy shared by every ledger operation
//! - The `TransactionStore` persistence seam

pub mod balance;
pub mod error;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod validation_props;

pub use balance::{AccountEffect, derive_balance, net_deltas, replacement_deltas};
pub use error::{EntityKind, LedgerError, LedgerResult};
pub use store::TransactionStore;
pub use types::{
    CreateTransactionInput, ExchangeDetails, Movement, Transaction, TransactionDetails,
    TransactionFilter, TransactionKind, TransactionSortField, UpdateTransactionInput,
};
pub use validation::{AccountCurrencies, validate_account_currencies, validate_movement};
