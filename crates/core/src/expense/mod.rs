//! Expenses: categorized withdrawals from a money account.

pub mod store;
pub mod types;

pub use store::ExpenseStore;
pub use types::{CreateExpenseInput, Expense, ExpenseFilter, ExpenseSortField, UpdateExpenseInput};
