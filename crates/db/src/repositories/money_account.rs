//! Money account repository.

use std::collections::BTreeSet;

use moneta_core::account::{
    CreateMoneyAccountInput, MoneyAccount, MoneyAccountFilter, MoneyAccountSortField,
    MoneyAccountStore, UpdateMoneyAccountInput,
};
use moneta_core::ledger::net_deltas;
use moneta_core::{EntityKind, FindParams, LedgerError, LedgerResult};
use moneta_shared::config::LedgerConfig;
use moneta_shared::types::{Money, MoneyAccountId, PageResponse, TenantId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::support::{DbResultExt, contains_ci, now, order, page_of, search_term, to_utc};
use super::transaction::{
    LockedAccounts, detach_dependents, insert_transaction, lock_accounts, movement,
    recompute_balance, settle_balances,
};
use crate::entities::{money_accounts, transactions};

/// Rounds of locking an account's history before deletion gives up.
const DELETE_ATTEMPTS: u32 = 5;

/// Money account repository.
#[derive(Debug, Clone)]
pub struct MoneyAccountRepository {
    db: DatabaseConnection,
    config: LedgerConfig,
}

impl MoneyAccountRepository {
    /// Creates a new money account repository with default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    /// Creates a new money account repository with explicit ledger settings.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self { db, config }
    }

    /// Deletes the account with its locked history and rebalances the
    /// counterpart accounts. Returns the number of removed transactions.
    async fn remove_with_history(
        &self,
        txn: &DatabaseTransaction,
        tenant_id: TenantId,
        id: MoneyAccountId,
        history: &[transactions::Model],
        locked: &LockedAccounts,
    ) -> LedgerResult<usize> {
        let movements = history
            .iter()
            .map(movement)
            .collect::<LedgerResult<Vec<_>>>()?;
        let transaction_ids: Vec<Uuid> = history.iter().map(|model| model.id).collect();

        detach_dependents(txn, &transaction_ids).await?;
        transactions::Entity::delete_many()
            .filter(transactions::Column::Id.is_in(transaction_ids.iter().copied()))
            .exec(txn)
            .await
            .map_db_err()?;
        money_accounts::Entity::delete_by_id(id.into_inner())
            .exec(txn)
            .await
            .map_db_err()?;

        let mut effects = Vec::new();
        for reversed in &movements {
            effects.extend(reversed.reversal_effects()?);
        }
        let mut deltas = net_deltas(effects)?;
        deltas.remove(&id);
        settle_balances(txn, tenant_id, self.config.balance_strategy, locked, deltas).await?;

        Ok(transaction_ids.len())
    }
}

impl MoneyAccountStore for MoneyAccountRepository {
    async fn create(
        &self,
        tenant_id: TenantId,
        input: CreateMoneyAccountInput,
    ) -> Result<MoneyAccount, LedgerError> {
        let id = MoneyAccountId::new();
        let opening = input.opening_deposit(id)?;
        let timestamp = now();

        let txn = self.db.begin().await.map_db_err()?;
        money_accounts::ActiveModel {
            id: Set(id.into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            name: Set(input.name.clone()),
            account_number: Set(input.account_number.clone()),
            description: Set(input.description.clone()),
            balance_minor: Set(0),
            currency: Set(input.currency().code().to_string()),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await
        .map_db_err()?;

        if let Some(deposit) = &opening {
            insert_transaction(&txn, tenant_id, deposit, self.config.balance_strategy).await?;
        }

        let model = find_model(&txn, tenant_id, id)
            .await?
            .ok_or_else(|| LedgerError::not_found(EntityKind::MoneyAccount, id))?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            account_id = %id,
            opening_balance = %input.opening_balance,
            "Money account created"
        );
        to_domain(model)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: MoneyAccountId,
        input: UpdateMoneyAccountInput,
    ) -> Result<MoneyAccount, LedgerError> {
        let model = find_model(&self.db, tenant_id, id)
            .await?
            .ok_or_else(|| LedgerError::not_found(EntityKind::MoneyAccount, id))?;

        // Only descriptive fields; the balance column stays untouched.
        let mut active: money_accounts::ActiveModel = model.into();
        active.name = Set(input.name);
        active.account_number = Set(input.account_number);
        active.description = Set(input.description);
        active.updated_at = Set(now());
        let model = active.update(&self.db).await.map_db_err()?;

        info!(tenant_id = %tenant_id, account_id = %id, "Money account updated");
        to_domain(model)
    }

    async fn delete(&self, tenant_id: TenantId, id: MoneyAccountId) -> Result<(), LedgerError> {
        for attempt in 1..=DELETE_ATTEMPTS {
            let txn = self.db.begin().await.map_db_err()?;

            // Transaction rows first, then accounts in ascending order, like
            // every other ledger write.
            let history = history_of(tenant_id, id)
                .lock_exclusive()
                .all(&txn)
                .await
                .map_db_err()?;
            let counterparts = counterpart_ids(id, &history)?;
            let locked =
                lock_accounts(&txn, tenant_id, counterparts.into_iter().chain([id])).await?;

            // Writers that committed between the two steps invalidate the lock set.
            let current = history_of(tenant_id, id).all(&txn).await.map_db_err()?;
            if !same_transactions(&history, &current) {
                txn.rollback().await.map_db_err()?;
                debug!(
                    tenant_id = %tenant_id,
                    account_id = %id,
                    attempt,
                    "Account history changed while locking, retrying"
                );
                continue;
            }

            let removed = self.remove_with_history(&txn, tenant_id, id, &history, &locked).await?;
            txn.commit().await.map_db_err()?;

            info!(
                tenant_id = %tenant_id,
                account_id = %id,
                transactions = removed,
                "Money account deleted"
            );
            return Ok(());
        }

        Err(LedgerError::Storage(format!(
            "history of money account {id} kept changing during deletion"
        )))
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: MoneyAccountId,
    ) -> Result<Option<MoneyAccount>, LedgerError> {
        find_model(&self.db, tenant_id, id)
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn find_all(&self, tenant_id: TenantId) -> Result<Vec<MoneyAccount>, LedgerError> {
        filtered(tenant_id, &MoneyAccountFilter::default())
            .order_by_asc(money_accounts::Column::Name)
            .order_by_asc(money_accounts::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_db_err()?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<MoneyAccountFilter, MoneyAccountSortField>,
    ) -> Result<PageResponse<MoneyAccount>, LedgerError> {
        let page = self.config.resolve_page(params.page);
        let query = filtered(tenant_id, &params.filter);
        let total = query.clone().count(&self.db).await.map_db_err()?;

        let query = match params.sort {
            Some(sort) => query.order_by(sort_column(sort.field), order(sort.direction)),
            None => query.order_by_desc(money_accounts::Column::CreatedAt),
        };
        let models = query
            .order_by_asc(money_accounts::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_db_err()?;

        page_of(models, page, total, to_domain)
    }

    async fn count(
        &self,
        tenant_id: TenantId,
        filter: MoneyAccountFilter,
    ) -> Result<u64, LedgerError> {
        filtered(tenant_id, &filter)
            .count(&self.db)
            .await
            .map_db_err()
    }

    async fn recalculate_balance(
        &self,
        tenant_id: TenantId,
        id: MoneyAccountId,
    ) -> Result<Money, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let locked = lock_accounts(&txn, tenant_id, [id]).await?;
        let account = locked
            .get(&id)
            .ok_or_else(|| LedgerError::not_found(EntityKind::MoneyAccount, id))?;

        let derived = recompute_balance(&txn, tenant_id, account).await?;
        txn.commit().await.map_db_err()?;

        if derived.amount_minor() != account.balance_minor {
            warn!(
                tenant_id = %tenant_id,
                account_id = %id,
                cached = account.balance_minor,
                derived = %derived,
                "Cached balance drifted from ledger history"
            );
        }
        Ok(derived)
    }
}

async fn find_model<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: MoneyAccountId,
) -> LedgerResult<Option<money_accounts::Model>> {
    money_accounts::Entity::find_by_id(id.into_inner())
        .filter(money_accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .map_db_err()
}

/// Transactions referencing `id` as origin or destination, in id order.
fn history_of(tenant_id: TenantId, id: MoneyAccountId) -> Select<transactions::Entity> {
    transactions::Entity::find()
        .filter(transactions::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(
            Condition::any()
                .add(transactions::Column::OriginAccountId.eq(id.into_inner()))
                .add(transactions::Column::DestinationAccountId.eq(id.into_inner())),
        )
        .order_by_asc(transactions::Column::Id)
}

fn same_transactions(locked: &[transactions::Model], current: &[transactions::Model]) -> bool {
    locked.len() == current.len()
        && locked
            .iter()
            .zip(current)
            .all(|(before, after)| before == after)
}

/// Other accounts touched by the history of `id`.
fn counterpart_ids(
    id: MoneyAccountId,
    history: &[transactions::Model],
) -> LedgerResult<BTreeSet<MoneyAccountId>> {
    let mut ids = BTreeSet::new();
    for model in history {
        ids.extend(
            movement(model)?
                .account_ids()
                .into_iter()
                .filter(|account_id| *account_id != id),
        );
    }
    Ok(ids)
}

fn filtered(tenant_id: TenantId, filter: &MoneyAccountFilter) -> Select<money_accounts::Entity> {
    let mut query = money_accounts::Entity::find()
        .filter(money_accounts::Column::TenantId.eq(tenant_id.into_inner()));

    if let Some(term) = search_term(filter.search.as_deref()) {
        query = query.filter(
            Condition::any()
                .add(contains_ci(money_accounts::Column::Name, term))
                .add(contains_ci(money_accounts::Column::AccountNumber, term))
                .add(contains_ci(money_accounts::Column::Description, term)),
        );
    }
    if let Some(currency) = filter.currency {
        query = query.filter(money_accounts::Column::Currency.eq(currency.code()));
    }

    query
}

const fn sort_column(field: MoneyAccountSortField) -> money_accounts::Column {
    match field {
        MoneyAccountSortField::Name => money_accounts::Column::Name,
        MoneyAccountSortField::Balance => money_accounts::Column::BalanceMinor,
        MoneyAccountSortField::CreatedAt => money_accounts::Column::CreatedAt,
    }
}

fn to_domain(model: money_accounts::Model) -> LedgerResult<MoneyAccount> {
    Ok(MoneyAccount {
        balance: Money::from_code(model.balance_minor, &model.currency)?,
        id: MoneyAccountId::from_uuid(model.id),
        tenant_id: TenantId::from_uuid(model.tenant_id),
        name: model.name,
        account_number: model.account_number,
        description: model.description,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}
