//! Integration tests for the transaction repository.
//!
//! These tests verify that:
//! - Every create, update and delete moves cached balances by exactly the
//!   movement's effect
//! - Rejected writes leave no transaction and no balance change behind
//! - Lookups never cross tenant boundaries
//! - Filters, sorting and pagination behave on real queries

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_lines)]

mod common;

use common::{balance_of, date, entry, eur, open_account, setup_db, usd};
use moneta_core::account::MoneyAccountStore;
use moneta_core::ledger::{
    CreateTransactionInput, Movement, TransactionDetails, TransactionFilter, TransactionKind,
    TransactionSortField, TransactionStore,
};
use moneta_core::{EntityKind, FindParams, LedgerError};
use moneta_db::entities::money_accounts;
use moneta_db::{MoneyAccountRepository, TransactionRepository};
use moneta_shared::config::{BalanceStrategy, LedgerConfig};
use moneta_shared::types::{Currency, MoneyAccountId, PageRequest, SortBy, TenantId, TransactionId};
use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

// ============================================================================
// Balance Effects
// ============================================================================

#[tokio::test]
async fn test_withdrawal_reduces_balance_and_recalculates() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;

    let repo = TransactionRepository::new(db.clone());
    let tx = repo
        .create(
            tenant,
            entry(
                Movement::withdrawal(checking.id, usd(2550)),
                date(2026, 3, 1),
                "Groceries",
            ),
        )
        .await
        .unwrap();

    assert_eq!(tx.movement.kind, TransactionKind::Withdrawal);
    assert_eq!(tx.details.accounting_period, date(2026, 3, 1));
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(7450));

    let derived = MoneyAccountRepository::new(db.clone())
        .recalculate_balance(tenant, checking.id)
        .await
        .unwrap();
    assert_eq!(derived, usd(7450));
}

#[tokio::test]
async fn test_transfer_moves_money_between_accounts() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;
    let savings = open_account(&db, tenant, "Savings", usd(0)).await;

    TransactionRepository::new(db.clone())
        .create(
            tenant,
            entry(
                Movement::transfer(checking.id, savings.id, usd(3000)),
                date(2026, 3, 2),
                "Monthly saving",
            ),
        )
        .await
        .unwrap();

    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(7000));
    assert_eq!(balance_of(&db, tenant, savings.id).await, usd(3000));
}

#[tokio::test]
async fn test_exchange_credits_destination_amount() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let dollars = open_account(&db, tenant, "Dollars", usd(10_000)).await;
    let euros = open_account(&db, tenant, "Euros", eur(0)).await;

    let repo = TransactionRepository::new(db.clone());
    let tx = repo
        .create(
            tenant,
            entry(
                Movement::exchange(dollars.id, euros.id, usd(1000), dec!(0.92), eur(920)),
                date(2026, 3, 3),
                "Travel money",
            ),
        )
        .await
        .unwrap();

    assert_eq!(balance_of(&db, tenant, dollars.id).await, usd(9000));
    assert_eq!(balance_of(&db, tenant, euros.id).await, eur(920));

    let stored = repo.find_by_id(tenant, tx.id).await.unwrap().unwrap();
    let exchange = stored.movement.exchange.expect("exchange details stored");
    assert_eq!(exchange.rate, dec!(0.92));
    assert_eq!(exchange.destination_amount, eur(920));
}

#[tokio::test]
async fn test_update_moves_effect_to_new_account() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;
    let cash = open_account(&db, tenant, "Cash", usd(5000)).await;

    let repo = TransactionRepository::new(db.clone());
    let tx = repo
        .create(
            tenant,
            entry(Movement::withdrawal(checking.id, usd(1000)), date(2026, 3, 4), "Lunch"),
        )
        .await
        .unwrap();
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(9000));

    let updated = repo
        .update(
            tenant,
            tx.id,
            entry(Movement::withdrawal(cash.id, usd(400)), date(2026, 3, 5), "Lunch, paid cash"),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, tx.id);
    assert_eq!(updated.details.comment, "Lunch, paid cash");
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(10_000));
    assert_eq!(balance_of(&db, tenant, cash.id).await, usd(4600));
}

#[tokio::test]
async fn test_update_can_change_kind() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;
    let savings = open_account(&db, tenant, "Savings", usd(0)).await;

    let repo = TransactionRepository::new(db.clone());
    let tx = repo
        .create(
            tenant,
            entry(Movement::deposit(checking.id, usd(500)), date(2026, 3, 4), "Refund"),
        )
        .await
        .unwrap();

    repo.update(
        tenant,
        tx.id,
        entry(
            Movement::transfer(checking.id, savings.id, usd(500)),
            date(2026, 3, 4),
            "Actually a transfer",
        ),
    )
    .await
    .unwrap();

    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(9500));
    assert_eq!(balance_of(&db, tenant, savings.id).await, usd(500));
}

#[tokio::test]
async fn test_delete_reverses_balance_effect() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;
    let savings = open_account(&db, tenant, "Savings", usd(0)).await;

    let repo = TransactionRepository::new(db.clone());
    let tx = repo
        .create(
            tenant,
            entry(
                Movement::transfer(checking.id, savings.id, usd(2500)),
                date(2026, 3, 6),
                "Saving",
            ),
        )
        .await
        .unwrap();

    repo.delete(tenant, tx.id).await.unwrap();

    assert!(repo.find_by_id(tenant, tx.id).await.unwrap().is_none());
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(10_000));
    assert_eq!(balance_of(&db, tenant, savings.id).await, usd(0));
}

// ============================================================================
// Rejected Writes
// ============================================================================

#[tokio::test]
async fn test_invalid_shape_writes_nothing() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;
    let savings = open_account(&db, tenant, "Savings", usd(0)).await;

    let repo = TransactionRepository::new(db.clone());
    let mut movement = Movement::deposit(checking.id, usd(100));
    movement.origin_account_id = Some(savings.id);

    let result = repo
        .create(tenant, entry(movement, date(2026, 3, 7), "Bad deposit"))
        .await;

    assert!(matches!(
        result,
        Err(LedgerError::InvalidTransactionShape {
            kind: TransactionKind::Deposit,
            ..
        })
    ));
    // Only the opening deposit remains.
    assert_eq!(repo.count(tenant, TransactionFilter::default()).await.unwrap(), 1);
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(10_000));
}

#[tokio::test]
async fn test_same_account_transfer_rejected() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;

    let result = TransactionRepository::new(db.clone())
        .create(
            tenant,
            entry(
                Movement::transfer(checking.id, checking.id, usd(100)),
                date(2026, 3, 7),
                "Loop",
            ),
        )
        .await;

    assert!(matches!(result, Err(LedgerError::InvalidTransactionShape { .. })));
}

#[tokio::test]
async fn test_currency_mismatch_rejected() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;

    let result = TransactionRepository::new(db.clone())
        .create(
            tenant,
            entry(Movement::deposit(checking.id, eur(500)), date(2026, 3, 8), "Wrong currency"),
        )
        .await;

    assert_eq!(
        result.unwrap_err(),
        LedgerError::CurrencyMismatch {
            expected: Currency::Usd,
            found: Currency::Eur,
        }
    );
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(10_000));
}

#[tokio::test]
async fn test_zero_amount_rejected() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;

    let result = TransactionRepository::new(db.clone())
        .create(
            tenant,
            entry(Movement::withdrawal(checking.id, usd(0)), date(2026, 3, 8), "Nothing"),
        )
        .await;

    assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let missing = MoneyAccountId::new();

    let result = TransactionRepository::new(db.clone())
        .create(
            tenant,
            entry(Movement::deposit(missing, usd(100)), date(2026, 3, 9), "Ghost"),
        )
        .await;

    assert_eq!(
        result.unwrap_err(),
        LedgerError::not_found(EntityKind::MoneyAccount, missing)
    );
}

#[tokio::test]
async fn test_update_unknown_transaction_is_not_found() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;
    let missing = TransactionId::new();

    let repo = TransactionRepository::new(db.clone());
    let result = repo
        .update(
            tenant,
            missing,
            entry(Movement::deposit(checking.id, usd(100)), date(2026, 3, 9), "Ghost"),
        )
        .await;
    assert_eq!(
        result.unwrap_err(),
        LedgerError::not_found(EntityKind::Transaction, missing)
    );

    let result = repo.delete(tenant, missing).await;
    assert_eq!(
        result.unwrap_err(),
        LedgerError::not_found(EntityKind::Transaction, missing)
    );
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(10_000));
}

#[tokio::test]
async fn test_failed_update_keeps_original() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;
    let euros = open_account(&db, tenant, "Euros", eur(0)).await;

    let repo = TransactionRepository::new(db.clone());
    let tx = repo
        .create(
            tenant,
            entry(Movement::withdrawal(checking.id, usd(700)), date(2026, 3, 10), "Books"),
        )
        .await
        .unwrap();

    let result = repo
        .update(
            tenant,
            tx.id,
            entry(Movement::withdrawal(euros.id, usd(700)), date(2026, 3, 10), "Books"),
        )
        .await;
    assert!(matches!(result, Err(LedgerError::CurrencyMismatch { .. })));

    let stored = repo.find_by_id(tenant, tx.id).await.unwrap().unwrap();
    assert_eq!(stored.movement, tx.movement);
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(9300));
    assert_eq!(balance_of(&db, tenant, euros.id).await, eur(0));
}

// ============================================================================
// Tenant Isolation
// ============================================================================

#[tokio::test]
async fn test_cross_tenant_access_is_not_found() {
    let db = setup_db().await;
    let owner = TenantId::new();
    let intruder = TenantId::new();
    let checking = open_account(&db, owner, "Checking", usd(10_000)).await;

    let repo = TransactionRepository::new(db.clone());
    let tx = repo
        .create(
            owner,
            entry(Movement::withdrawal(checking.id, usd(100)), date(2026, 3, 11), "Coffee"),
        )
        .await
        .unwrap();

    assert!(repo.find_by_id(intruder, tx.id).await.unwrap().is_none());
    assert_eq!(
        repo.delete(intruder, tx.id).await.unwrap_err(),
        LedgerError::not_found(EntityKind::Transaction, tx.id)
    );

    // Another tenant cannot move money through the owner's account.
    let result = repo
        .create(
            intruder,
            entry(Movement::deposit(checking.id, usd(100)), date(2026, 3, 11), "Sneaky"),
        )
        .await;
    assert_eq!(
        result.unwrap_err(),
        LedgerError::not_found(EntityKind::MoneyAccount, checking.id)
    );

    assert_eq!(repo.count(intruder, TransactionFilter::default()).await.unwrap(), 0);
    assert_eq!(balance_of(&db, owner, checking.id).await, usd(9900));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_find_paginated_filters_sorts_and_pages() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(100_000)).await;
    let savings = open_account(&db, tenant, "Savings", usd(0)).await;

    let repo = TransactionRepository::new(db.clone());
    let inputs = [
        entry(Movement::withdrawal(checking.id, usd(1200)), date(2026, 4, 1), "Rent share"),
        entry(Movement::withdrawal(checking.id, usd(300)), date(2026, 4, 2), "Coffee beans"),
        entry(Movement::withdrawal(checking.id, usd(4500)), date(2026, 4, 3), "New COFFEE grinder"),
        entry(
            Movement::transfer(checking.id, savings.id, usd(10_000)),
            date(2026, 4, 4),
            "Saving",
        ),
        entry(Movement::deposit(checking.id, usd(25_000)), date(2026, 5, 1), "Salary"),
    ];
    for input in inputs {
        repo.create(tenant, input).await.unwrap();
    }

    let withdrawals = TransactionFilter {
        kind: Some(TransactionKind::Withdrawal),
        ..TransactionFilter::default()
    };
    assert_eq!(repo.count(tenant, withdrawals.clone()).await.unwrap(), 3);

    let by_amount = repo
        .find_paginated(
            tenant,
            FindParams::new(withdrawals)
                .sorted(SortBy::asc(TransactionSortField::Amount))
                .page(PageRequest::new(1, 2)),
        )
        .await
        .unwrap();
    assert_eq!(by_amount.meta.total, 3);
    assert_eq!(by_amount.meta.total_pages, 2);
    let amounts: Vec<_> = by_amount.data.iter().map(|tx| tx.movement.amount).collect();
    assert_eq!(amounts, vec![usd(300), usd(1200)]);

    let coffee = repo
        .find_paginated(
            tenant,
            FindParams::new(TransactionFilter {
                comment_contains: Some("  coffee ".to_string()),
                ..TransactionFilter::default()
            }),
        )
        .await
        .unwrap();
    assert_eq!(coffee.meta.total, 2);
    // Default order is newest transaction date first.
    assert_eq!(coffee.data[0].details.comment, "New COFFEE grinder");

    let april = TransactionFilter {
        date_from: Some(date(2026, 4, 2)),
        date_to: Some(date(2026, 4, 30)),
        ..TransactionFilter::default()
    };
    assert_eq!(repo.count(tenant, april).await.unwrap(), 3);

    let touching_savings = TransactionFilter {
        account_id: Some(savings.id),
        ..TransactionFilter::default()
    };
    assert_eq!(repo.count(tenant, touching_savings).await.unwrap(), 1);

    let from_checking = TransactionFilter {
        origin_account_id: Some(checking.id),
        ..TransactionFilter::default()
    };
    assert_eq!(repo.count(tenant, from_checking).await.unwrap(), 4);
}

#[tokio::test]
async fn test_page_size_defaults_and_bounds() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(0)).await;

    let config = LedgerConfig {
        default_page_size: 3,
        max_page_size: 4,
        ..LedgerConfig::default()
    };
    let repo = TransactionRepository::with_config(db.clone(), config);
    for day in 1..=6 {
        repo.create(
            tenant,
            entry(Movement::deposit(checking.id, usd(100)), date(2026, 6, day), "Tip"),
        )
        .await
        .unwrap();
    }

    let defaulted = repo
        .find_paginated(
            tenant,
            FindParams::new(TransactionFilter::default()).page(PageRequest::new(1, 0)),
        )
        .await
        .unwrap();
    assert_eq!(defaulted.meta.per_page, 3);
    assert_eq!(defaulted.data.len(), 3);

    let bounded = repo
        .find_paginated(
            tenant,
            FindParams::new(TransactionFilter::default()).page(PageRequest::new(2, 50)),
        )
        .await
        .unwrap();
    assert_eq!(bounded.meta.per_page, 4);
    assert_eq!(bounded.meta.total, 6);
    assert_eq!(bounded.data.len(), 2);
}

// ============================================================================
// Balance Strategies
// ============================================================================

#[tokio::test]
async fn test_recompute_strategy_matches_incremental() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let config = LedgerConfig {
        balance_strategy: BalanceStrategy::Recompute,
        ..LedgerConfig::default()
    };
    let accounts = MoneyAccountRepository::with_config(db.clone(), config.clone());
    let checking = accounts
        .create(tenant, common::account_input("Checking", usd(10_000)))
        .await
        .unwrap();
    let savings = accounts
        .create(tenant, common::account_input("Savings", usd(0)))
        .await
        .unwrap();
    assert_eq!(checking.balance, usd(10_000));

    let repo = TransactionRepository::with_config(db.clone(), config);
    let transfer = repo
        .create(
            tenant,
            entry(
                Movement::transfer(checking.id, savings.id, usd(4000)),
                date(2026, 7, 1),
                "Saving",
            ),
        )
        .await
        .unwrap();
    repo.create(
        tenant,
        entry(Movement::withdrawal(savings.id, usd(1500)), date(2026, 7, 2), "Repair"),
    )
    .await
    .unwrap();
    repo.update(
        tenant,
        transfer.id,
        CreateTransactionInput {
            movement: Movement::transfer(checking.id, savings.id, usd(5000)),
            details: TransactionDetails::on(date(2026, 7, 1)).in_period(date(2026, 6, 1)),
        },
    )
    .await
    .unwrap();

    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(5000));
    assert_eq!(balance_of(&db, tenant, savings.id).await, usd(3500));
    assert_eq!(
        accounts.recalculate_balance(tenant, savings.id).await.unwrap(),
        usd(3500)
    );
}

#[tokio::test]
async fn test_recalculate_corrects_drifted_cache() {
    let db = setup_db().await;
    let tenant = TenantId::new();
    let checking = open_account(&db, tenant, "Checking", usd(10_000)).await;

    TransactionRepository::new(db.clone())
        .create(
            tenant,
            entry(Movement::withdrawal(checking.id, usd(2550)), date(2026, 8, 1), "Groceries"),
        )
        .await
        .unwrap();

    // Corrupt the cache behind the repository's back.
    money_accounts::Entity::update_many()
        .col_expr(money_accounts::Column::BalanceMinor, Expr::value(1_i64))
        .filter(money_accounts::Column::Id.eq(checking.id.into_inner()))
        .exec(&db)
        .await
        .unwrap();
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(1));

    let accounts = MoneyAccountRepository::new(db.clone());
    assert_eq!(
        accounts.recalculate_balance(tenant, checking.id).await.unwrap(),
        usd(7450)
    );
    assert_eq!(balance_of(&db, tenant, checking.id).await, usd(7450));
}
