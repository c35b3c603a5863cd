//! Shared fixtures for repository integration tests.
//!
//! Each test gets its own in-memory SQLite database migrated with the real
//! migrator. The pool is pinned to one connection because every new SQLite
//! memory connection opens a separate, empty database, so writers on it run
//! one after another.
//!
//! Row locking only happens on PostgreSQL. Tests that need writers racing on
//! separate connections use [`postgres_db`], which connects to
//! `MONETA_TEST_DATABASE_URL` (or `DATABASE_URL`) when one is set.

#![allow(dead_code)]

use chrono::NaiveDate;
use moneta_core::account::{CreateMoneyAccountInput, MoneyAccount, MoneyAccountStore};
use moneta_core::ledger::{CreateTransactionInput, Movement, TransactionDetails};
use moneta_db::MoneyAccountRepository;
use moneta_db::migration::{Migrator, MigratorTrait};
use moneta_shared::types::{Currency, Money, MoneyAccountId, TenantId};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Opens a fresh migrated database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

/// Connects to the configured PostgreSQL test database, if any.
pub async fn postgres_db() -> Option<DatabaseConnection> {
    let url = std::env::var("MONETA_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| url.starts_with("postgres"))?;

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(16)
        .min_connections(2)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to PostgreSQL");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    Some(db)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn usd(minor: i64) -> Money {
    Money::new(minor, Currency::Usd)
}

pub fn eur(minor: i64) -> Money {
    Money::new(minor, Currency::Eur)
}

pub fn account_input(name: &str, opening: Money) -> CreateMoneyAccountInput {
    CreateMoneyAccountInput {
        name: name.to_string(),
        account_number: format!("{}-001", name.to_uppercase()),
        description: format!("{name} account"),
        opening_balance: opening,
        opened_on: date(2026, 1, 1),
    }
}

/// Opens an account with the given opening balance.
pub async fn open_account(
    db: &DatabaseConnection,
    tenant_id: TenantId,
    name: &str,
    opening: Money,
) -> MoneyAccount {
    MoneyAccountRepository::new(db.clone())
        .create(tenant_id, account_input(name, opening))
        .await
        .expect("Failed to open account")
}

/// Cached balance as stored on the account row.
pub async fn balance_of(
    db: &DatabaseConnection,
    tenant_id: TenantId,
    id: MoneyAccountId,
) -> Money {
    MoneyAccountRepository::new(db.clone())
        .find_by_id(tenant_id, id)
        .await
        .expect("Failed to load account")
        .expect("Account not found")
        .balance
}

pub fn entry(movement: Movement, on: NaiveDate, comment: &str) -> CreateTransactionInput {
    CreateTransactionInput {
        movement,
        details: TransactionDetails::on(on).with_comment(comment),
    }
}
