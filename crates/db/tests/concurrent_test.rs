//! Concurrent access tests for the ledger repositories.
//!
//! Many writers race on the same accounts. The final cached balances must
//! equal the sum of everything that committed, with no drift against a full
//! recalculation, whatever order the writers ran in.
//!
//! Every scenario runs twice:
//! - on in-memory SQLite, where the single pooled connection queues writers
//! - on PostgreSQL when `MONETA_TEST_DATABASE_URL` or `DATABASE_URL` is set,
//!   where writers hold separate connections and serialize on row locks

#![allow(clippy::cast_possible_wrap)]

mod common;

use std::future::Future;
use std::sync::Arc;

use common::{balance_of, date, entry, open_account, postgres_db, setup_db, usd};
use futures::future::join_all;
use moneta_core::account::MoneyAccountStore;
use moneta_core::ledger::{Movement, TransactionFilter, TransactionStore};
use moneta_core::{EntityKind, LedgerError};
use moneta_db::{MoneyAccountRepository, TransactionRepository};
use moneta_shared::types::TenantId;
use sea_orm::DatabaseConnection;
use tokio::sync::Barrier;

const WRITERS: usize = 40;

/// Starts `writers` tasks together and collects their results in order.
async fn race<F, Fut, T>(writers: usize, task: F) -> Vec<Result<T, LedgerError>>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T, LedgerError>> + Send + 'static,
    T: Send + 'static,
{
    let barrier = Arc::new(Barrier::new(writers));
    let handles = (0..writers).map(|i| {
        let barrier = Arc::clone(&barrier);
        let work = task(i);
        tokio::spawn(async move {
            barrier.wait().await;
            work.await
        })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("writer task panicked"))
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

async fn deposits_and_withdrawals(db: &DatabaseConnection) {
    let tenant = TenantId::new();
    let checking = open_account(db, tenant, "Checking", usd(100_000)).await;

    let repo = TransactionRepository::new(db.clone());
    let results = race(WRITERS, |i| {
        let repo = repo.clone();
        let movement = if i % 2 == 0 {
            Movement::deposit(checking.id, usd(150))
        } else {
            Movement::withdrawal(checking.id, usd(100))
        };
        async move {
            repo.create(tenant, entry(movement, date(2026, 9, 1), "Concurrent"))
                .await
        }
    })
    .await;
    assert!(results.iter().all(Result::is_ok), "{results:?}");

    let half = (WRITERS / 2) as i64;
    let expected = usd(100_000 + half * 150 - half * 100);
    assert_eq!(balance_of(db, tenant, checking.id).await, expected);
    assert_eq!(
        MoneyAccountRepository::new(db.clone())
            .recalculate_balance(tenant, checking.id)
            .await
            .unwrap(),
        expected
    );
    assert_eq!(
        repo.count(tenant, TransactionFilter::default()).await.unwrap(),
        WRITERS as u64 + 1
    );
}

async fn opposing_transfers(db: &DatabaseConnection) {
    let tenant = TenantId::new();
    let left = open_account(db, tenant, "Left", usd(50_000)).await;
    let right = open_account(db, tenant, "Right", usd(50_000)).await;

    let repo = TransactionRepository::new(db.clone());
    let results = race(WRITERS, |i| {
        let repo = repo.clone();
        // Alternate direction so writers request the same locks in opposite roles.
        let movement = if i % 2 == 0 {
            Movement::transfer(left.id, right.id, usd(700))
        } else {
            Movement::transfer(right.id, left.id, usd(300))
        };
        async move {
            repo.create(tenant, entry(movement, date(2026, 9, 2), "Shuffle"))
                .await
        }
    })
    .await;
    assert!(results.iter().all(Result::is_ok), "{results:?}");

    let half = (WRITERS / 2) as i64;
    let left_balance = balance_of(db, tenant, left.id).await;
    let right_balance = balance_of(db, tenant, right.id).await;
    assert_eq!(left_balance, usd(50_000 - half * 700 + half * 300));
    assert_eq!(right_balance, usd(50_000 + half * 700 - half * 300));
    assert_eq!(
        left_balance.amount_minor() + right_balance.amount_minor(),
        100_000
    );
}

async fn updates_and_deletes(db: &DatabaseConnection) {
    let tenant = TenantId::new();
    let checking = open_account(db, tenant, "Checking", usd(10_000)).await;
    let savings = open_account(db, tenant, "Savings", usd(0)).await;

    let repo = TransactionRepository::new(db.clone());
    let mut created = Vec::with_capacity(WRITERS);
    for _ in 0..WRITERS {
        let tx = repo
            .create(
                tenant,
                entry(
                    Movement::transfer(checking.id, savings.id, usd(100)),
                    date(2026, 9, 3),
                    "Round up",
                ),
            )
            .await
            .unwrap();
        created.push(tx.id);
    }

    // Even transfers double, odd ones are removed.
    let (checking_id, savings_id) = (checking.id, savings.id);
    let results = race(WRITERS, |i| {
        let repo = repo.clone();
        let id = created[i];
        async move {
            if i % 2 == 0 {
                repo.update(
                    tenant,
                    id,
                    entry(
                        Movement::transfer(checking_id, savings_id, usd(200)),
                        date(2026, 9, 3),
                        "Round up twice",
                    ),
                )
                .await
                .map(|_| ())
            } else {
                repo.delete(tenant, id).await
            }
        }
    })
    .await;
    assert!(results.iter().all(Result::is_ok), "{results:?}");

    let moved = (WRITERS / 2) as i64 * 200;
    assert_eq!(balance_of(db, tenant, checking.id).await, usd(10_000 - moved));
    assert_eq!(balance_of(db, tenant, savings.id).await, usd(moved));

    let accounts = MoneyAccountRepository::new(db.clone());
    assert_eq!(
        accounts.recalculate_balance(tenant, savings.id).await.unwrap(),
        usd(moved)
    );
}

/// One writer deletes an account while the others transfer into it and past it.
async fn account_delete_during_transfers(db: &DatabaseConnection) {
    let tenant = TenantId::new();
    let hub = open_account(db, tenant, "Hub", usd(100_000)).await;
    let spoke = open_account(db, tenant, "Spoke", usd(0)).await;
    let doomed = open_account(db, tenant, "Doomed", usd(5_000)).await;

    let transactions = TransactionRepository::new(db.clone());
    let accounts = MoneyAccountRepository::new(db.clone());
    let (hub_id, spoke_id, doomed_id) = (hub.id, spoke.id, doomed.id);
    let results = race(WRITERS, |i| {
        let transactions = transactions.clone();
        let accounts = accounts.clone();
        async move {
            match i {
                0 => accounts.delete(tenant, doomed_id).await,
                i if i % 2 == 0 => transactions
                    .create(
                        tenant,
                        entry(
                            Movement::transfer(hub_id, doomed_id, usd(100)),
                            date(2026, 9, 4),
                            "Into doomed",
                        ),
                    )
                    .await
                    .map(|_| ()),
                _ => transactions
                    .create(
                        tenant,
                        entry(
                            Movement::transfer(hub_id, spoke_id, usd(100)),
                            date(2026, 9, 4),
                            "Into spoke",
                        ),
                    )
                    .await
                    .map(|_| ()),
            }
        }
    })
    .await;

    let (deletion, transfers) = results.split_first().expect("writers ran");
    for result in transfers {
        assert!(
            matches!(
                result,
                Ok(()) | Err(LedgerError::NotFound {
                    entity: EntityKind::MoneyAccount,
                    ..
                })
            ),
            "{result:?}"
        );
    }
    // Losing every locking round to fresh writers is reported as retryable.
    assert!(
        deletion.is_ok() || deletion.as_ref().is_err_and(LedgerError::is_retryable),
        "{deletion:?}"
    );

    for id in [hub.id, spoke.id] {
        let cached = balance_of(db, tenant, id).await;
        assert_eq!(accounts.recalculate_balance(tenant, id).await.unwrap(), cached);
    }
    if deletion.is_ok() {
        assert!(accounts.find_by_id(tenant, doomed.id).await.unwrap().is_none());
        let remaining = transactions
            .count(
                tenant,
                TransactionFilter {
                    account_id: Some(doomed.id),
                    ..TransactionFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}

// ============================================================================
// SQLite (queued writers)
// ============================================================================

#[tokio::test]
async fn test_concurrent_deposits_and_withdrawals() {
    deposits_and_withdrawals(&setup_db().await).await;
}

#[tokio::test]
async fn test_opposing_transfers_conserve_money() {
    opposing_transfers(&setup_db().await).await;
}

#[tokio::test]
async fn test_concurrent_updates_and_deletes() {
    updates_and_deletes(&setup_db().await).await;
}

#[tokio::test]
async fn test_account_delete_during_transfers() {
    account_delete_during_transfers(&setup_db().await).await;
}

// ============================================================================
// PostgreSQL (row locks)
// ============================================================================

/// Scenarios run one after another so the migrator is applied once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_postgres_row_locking() {
    let Some(db) = postgres_db().await else {
        eprintln!("No PostgreSQL test database configured, skipping row locking scenarios");
        return;
    };

    deposits_and_withdrawals(&db).await;
    opposing_transfers(&db).await;
    updates_and_deletes(&db).await;
    account_delete_during_transfers(&db).await;
}
