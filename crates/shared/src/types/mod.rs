//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

#[cfg(test)]
mod money_props;

pub use id::*;
pub use money::{Currency, Money, MoneyError};
pub use pagination::{PageMeta, PageRequest, PageResponse, SortBy, SortDirection};
