//! `SeaORM` entity definitions.
//!
//! One module per table. Amounts are stored as `BIGINT` minor units next to a
//! three-letter currency column.

pub mod debt_settlements;
pub mod debts;
pub mod expense_attachments;
pub mod expenses;
pub mod money_accounts;
pub mod payment_attachments;
pub mod payments;
pub mod sea_orm_active_enums;
pub mod transactions;
