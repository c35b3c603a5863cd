//! Database seeder for Moneta development.
//!
//! Seeds a demo tenant with a few money accounts, a payment, an expense,
//! a transfer, a currency exchange and two debts, then reconciles every
//! account balance against its history.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Days, Utc};
use moneta_core::account::{CreateMoneyAccountInput, MoneyAccountStore};
use moneta_core::debt::{CreateDebtInput, DebtStore, DebtType};
use moneta_core::expense::{CreateExpenseInput, ExpenseStore};
use moneta_core::ledger::{CreateTransactionInput, Movement, TransactionDetails, TransactionStore};
use moneta_core::payment::{CreatePaymentInput, PaymentCategory, PaymentStore};
use moneta_db::migration::{Migrator, MigratorTrait};
use moneta_db::{
    DebtRepository, ExpenseRepository, MoneyAccountRepository, PaymentRepository,
    TransactionRepository, connect_with_config,
};
use moneta_shared::AppConfig;
use moneta_shared::types::{CategoryId, CounterpartyId, Currency, Money, TenantId};
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Demo tenant (stable across runs so reseeding is a no-op).
const DEMO_TENANT: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
/// Counterparty paying the demo salary and owing the demo loan.
const DEMO_EMPLOYER: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0101);
/// Counterparty the demo tenant borrowed from.
const DEMO_LENDER: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0102);
/// Category for housing expenses.
const HOUSING: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0201);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moneta=info,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        error!("Seeding failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with_config(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    let tenant_id = TenantId::from_uuid(DEMO_TENANT);
    let repos = Repos::new(&db, &config);

    if !repos.accounts.find_all(tenant_id).await?.is_empty() {
        info!(tenant_id = %tenant_id, "Demo tenant already seeded, skipping");
        return Ok(());
    }

    seed(&repos, tenant_id).await?;
    reconcile(&repos, tenant_id).await?;

    info!(tenant_id = %tenant_id, "Seeding complete");
    Ok(())
}

struct Repos {
    accounts: MoneyAccountRepository,
    transactions: TransactionRepository,
    payments: PaymentRepository,
    expenses: ExpenseRepository,
    debts: DebtRepository,
}

impl Repos {
    fn new(db: &DatabaseConnection, config: &AppConfig) -> Self {
        let ledger = &config.ledger;
        Self {
            accounts: MoneyAccountRepository::with_config(db.clone(), ledger.clone()),
            transactions: TransactionRepository::with_config(db.clone(), ledger.clone()),
            payments: PaymentRepository::with_config(db.clone(), ledger.clone()),
            expenses: ExpenseRepository::with_config(db.clone(), ledger.clone()),
            debts: DebtRepository::with_config(db.clone(), ledger.clone()),
        }
    }
}

async fn seed(repos: &Repos, tenant_id: TenantId) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let month_ago = today.checked_sub_days(Days::new(30)).unwrap_or(today);

    let account = |name: &str, number: &str, opening: Money| CreateMoneyAccountInput {
        name: name.to_string(),
        account_number: number.to_string(),
        description: format!("Demo {name} account"),
        opening_balance: opening,
        opened_on: month_ago,
    };

    let checking = repos
        .accounts
        .create(tenant_id, account("Checking", "CHK-0001", usd(250_000)))
        .await?;
    let savings = repos
        .accounts
        .create(tenant_id, account("Savings", "SAV-0001", usd(1_000_000)))
        .await?;
    let euros = repos
        .accounts
        .create(tenant_id, account("Euro wallet", "EUR-0001", Money::zero(Currency::Eur)))
        .await?;
    info!(accounts = 3, "Seeded money accounts");

    let salary = repos
        .payments
        .create(
            tenant_id,
            CreatePaymentInput {
                amount: usd(420_000),
                account_id: checking.id,
                counterparty_id: CounterpartyId::from_uuid(DEMO_EMPLOYER),
                category: PaymentCategory::Uncategorized,
                details: TransactionDetails::on(today).with_comment("Monthly salary"),
                attachments: Vec::new(),
            },
        )
        .await?;

    repos
        .expenses
        .create(
            tenant_id,
            CreateExpenseInput {
                amount: usd(150_000),
                account_id: checking.id,
                category_id: CategoryId::from_uuid(HOUSING),
                details: TransactionDetails::on(today).with_comment("Rent"),
                attachments: Vec::new(),
            },
        )
        .await?;

    repos
        .transactions
        .create(
            tenant_id,
            CreateTransactionInput {
                movement: Movement::transfer(checking.id, savings.id, usd(50_000)),
                details: TransactionDetails::on(today).with_comment("Monthly saving"),
            },
        )
        .await?;

    repos
        .transactions
        .create(
            tenant_id,
            CreateTransactionInput {
                movement: Movement::exchange(
                    checking.id,
                    euros.id,
                    usd(30_000),
                    dec!(0.92),
                    Money::new(27_600, Currency::Eur),
                ),
                details: TransactionDetails::on(today).with_comment("Travel money"),
            },
        )
        .await?;
    info!(salary_payment = %salary.id, "Seeded ledger activity");

    let loan = repos
        .debts
        .create(
            tenant_id,
            CreateDebtInput {
                debt_type: DebtType::Receivable,
                counterparty_id: CounterpartyId::from_uuid(DEMO_EMPLOYER),
                original_amount: usd(50_000),
                description: "Salary advance returned in parts".to_string(),
                due_date: today.checked_add_days(Days::new(90)),
            },
        )
        .await?;
    repos
        .debts
        .record_partial_settlement(tenant_id, loan.id, usd(20_000))
        .await?;

    repos
        .debts
        .create(
            tenant_id,
            CreateDebtInput {
                debt_type: DebtType::Payable,
                counterparty_id: CounterpartyId::from_uuid(DEMO_LENDER),
                original_amount: usd(120_000),
                description: "Car repair loan".to_string(),
                due_date: None,
            },
        )
        .await?;
    info!(debts = 2, "Seeded debts");

    Ok(())
}

async fn reconcile(repos: &Repos, tenant_id: TenantId) -> anyhow::Result<()> {
    for account in repos.accounts.find_all(tenant_id).await? {
        let balance = repos
            .accounts
            .recalculate_balance(tenant_id, account.id)
            .await?;
        info!(account = %account.name, balance = %balance, "Reconciled balance");
    }
    Ok(())
}

const fn usd(minor: i64) -> Money {
    Money::new(minor, Currency::Usd)
}
