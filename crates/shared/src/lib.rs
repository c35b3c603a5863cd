//! Shared types, errors, and configuration for Moneta.
//!
//! This crate provides common types used across all other crates:
//! - Money types with integer minor units and a currency registry
//! - Typed IDs for type-safe entity references
//! - Pagination and sorting types for list queries
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, BalanceStrategy, DatabaseConfig, LedgerConfig};
pub use error::{AppError, AppResult};
