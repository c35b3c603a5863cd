//! Payments: deposits into a money account from a counterparty.

pub mod store;
pub mod types;

pub use store::PaymentStore;
pub use types::{
    CreatePaymentInput, Payment, PaymentCategory, PaymentFilter, PaymentSortField,
    UpdatePaymentInput,
};
