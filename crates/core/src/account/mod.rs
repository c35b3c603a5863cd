//! Money accounts: named, currency-denominated holders of a cached balance.

pub mod store;
pub mod types;

pub use store::MoneyAccountStore;
pub use types::{
    CreateMoneyAccountInput, MoneyAccount, MoneyAccountFilter, MoneyAccountSortField,
    OPENING_BALANCE_COMMENT, UpdateMoneyAccountInput,
};
