//! Repository implementations of the `moneta-core` store traits.
//!
//! Every mutation runs inside one database transaction. Helpers that take a
//! `&DatabaseTransaction` never touch the pooled connection, so the same code
//! paths work on a single-connection SQLite pool.

mod support;

pub mod debt;
pub mod expense;
pub mod money_account;
pub mod payment;
pub mod transaction;

pub use debt::DebtRepository;
pub use expense::ExpenseRepository;
pub use money_account::MoneyAccountRepository;
pub use payment::PaymentRepository;
pub use transaction::TransactionRepository;
