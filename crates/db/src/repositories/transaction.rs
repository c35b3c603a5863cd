//! Transaction repository: the ledger write path and balance maintenance.
//!
//! Every write follows the same order inside one database transaction:
//! validate the movement, lock the referenced account rows in ascending id
//! order, check account currencies, write the transaction row, then settle
//! the balance effect with the configured [`BalanceStrategy`].
//!
//! Lock order across all writers: transaction rows, then account rows in
//! ascending id order, then debt rows.
//!
//! Transactions owned by a payment or expense are only changed through the
//! owner; the public update and delete reject them with `TransactionOwned`.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use moneta_core::ledger::{
    AccountCurrencies, CreateTransactionInput, ExchangeDetails, Movement, Transaction,
    TransactionDetails, TransactionFilter, TransactionSortField, TransactionStore,
    UpdateTransactionInput, derive_balance, net_deltas, replacement_deltas,
    validate_account_currencies, validate_movement,
};
use moneta_core::{EntityKind, FindParams, LedgerError, LedgerResult};
use moneta_shared::config::{BalanceStrategy, LedgerConfig};
use moneta_shared::types::{
    Currency, Money, MoneyAccountId, PageResponse, TenantId, TransactionId,
};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::support::{DbResultExt, contains_ci, now, order, page_of, search_term, to_utc};
use crate::entities::{
    debt_settlements, debts, expense_attachments, expenses, money_accounts, payment_attachments,
    payments, transactions,
};

/// Account rows locked for the current unit of work, keyed by id.
pub(crate) type LockedAccounts = BTreeMap<MoneyAccountId, money_accounts::Model>;

/// Transaction repository for ledger operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    config: LedgerConfig,
}

impl TransactionRepository {
    /// Creates a new transaction repository with default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    /// Creates a new transaction repository with explicit ledger settings.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self { db, config }
    }
}

impl TransactionStore for TransactionRepository {
    async fn create(
        &self,
        tenant_id: TenantId,
        input: CreateTransactionInput,
    ) -> Result<Transaction, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let model =
            insert_transaction(&txn, tenant_id, &input, self.config.balance_strategy).await?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            transaction_id = %model.id,
            kind = %input.movement.kind,
            amount = %input.movement.amount,
            "Transaction recorded"
        );
        to_domain(model)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> Result<Transaction, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        ensure_unowned(&txn, tenant_id, id).await?;
        let model =
            replace_transaction(&txn, tenant_id, id, &input, self.config.balance_strategy).await?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            transaction_id = %id,
            kind = %input.movement.kind,
            amount = %input.movement.amount,
            "Transaction updated"
        );
        to_domain(model)
    }

    async fn delete(&self, tenant_id: TenantId, id: TransactionId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        ensure_unowned(&txn, tenant_id, id).await?;
        remove_transaction(&txn, tenant_id, id, self.config.balance_strategy).await?;
        txn.commit().await.map_db_err()?;

        info!(tenant_id = %tenant_id, transaction_id = %id, "Transaction deleted");
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await
            .map_db_err()?
            .map(to_domain)
            .transpose()
    }

    async fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<TransactionFilter, TransactionSortField>,
    ) -> Result<PageResponse<Transaction>, LedgerError> {
        let page = self.config.resolve_page(params.page);
        let query = filtered(tenant_id, &params.filter);
        let total = query.clone().count(&self.db).await.map_db_err()?;

        let query = match params.sort {
            Some(sort) => query.order_by(sort_column(sort.field), order(sort.direction)),
            None => query
                .order_by_desc(transactions::Column::TransactionDate)
                .order_by_desc(transactions::Column::CreatedAt),
        };
        let models = query
            .order_by_asc(transactions::Column::Id)
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
        filter: TransactionFilter,
    ) -> Result<u64, LedgerError> {
        filtered(tenant_id, &filter)
            .count(&self.db)
            .await
            .map_db_err()
    }
}

/// Validates and records a transaction, then settles its balance effect.
pub(crate) async fn insert_transaction(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    input: &CreateTransactionInput,
    strategy: BalanceStrategy,
) -> LedgerResult<transactions::Model> {
    validate_movement(&input.movement)?;
    let locked = lock_accounts(txn, tenant_id, input.movement.account_ids()).await?;
    validate_account_currencies(&input.movement, currencies(&input.movement, &locked)?)?;

    let mut active = transactions::ActiveModel {
        id: Set(TransactionId::new().into_inner()),
        tenant_id: Set(tenant_id.into_inner()),
        created_at: Set(now()),
        ..Default::default()
    };
    write_fields(&mut active, input);
    let model = active.insert(txn).await.map_db_err()?;

    let deltas = net_deltas(input.movement.effects()?)?;
    settle_balances(txn, tenant_id, strategy, &locked, deltas).await?;
    Ok(model)
}

/// Replaces movement and metadata of an existing transaction.
///
/// Accounts of both the old and the new movement are locked before the
/// net difference is settled.
pub(crate) async fn replace_transaction(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    id: TransactionId,
    input: &UpdateTransactionInput,
    strategy: BalanceStrategy,
) -> LedgerResult<transactions::Model> {
    validate_movement(&input.movement)?;
    let existing = find_locked(txn, tenant_id, id).await?;
    let old = movement(&existing)?;

    let account_ids = old
        .account_ids()
        .into_iter()
        .chain(input.movement.account_ids());
    let locked = lock_accounts(txn, tenant_id, account_ids).await?;
    validate_account_currencies(&input.movement, currencies(&input.movement, &locked)?)?;

    let mut active: transactions::ActiveModel = existing.into();
    write_fields(&mut active, input);
    let model = active.update(txn).await.map_db_err()?;

    let deltas = replacement_deltas(&old, &input.movement)?;
    settle_balances(txn, tenant_id, strategy, &locked, deltas).await?;
    Ok(model)
}

/// Deletes a transaction with its dependents and reverses its balance effect.
pub(crate) async fn remove_transaction(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    id: TransactionId,
    strategy: BalanceStrategy,
) -> LedgerResult<()> {
    let existing = find_locked(txn, tenant_id, id).await?;
    let movement = movement(&existing)?;
    let locked = lock_accounts(txn, tenant_id, movement.account_ids()).await?;

    detach_dependents(txn, &[existing.id]).await?;
    transactions::Entity::delete_by_id(existing.id)
        .exec(txn)
        .await
        .map_db_err()?;

    let deltas = net_deltas(movement.reversal_effects()?)?;
    settle_balances(txn, tenant_id, strategy, &locked, deltas).await
}

/// Locks account rows in ascending id order.
///
/// # Errors
///
/// Returns `NotFound` if an account does not exist in the tenant.
pub(crate) async fn lock_accounts(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    ids: impl IntoIterator<Item = MoneyAccountId>,
) -> LedgerResult<LockedAccounts> {
    let ids: BTreeSet<MoneyAccountId> = ids.into_iter().collect();
    let mut locked = BTreeMap::new();

    for id in ids {
        let account = money_accounts::Entity::find_by_id(id.into_inner())
            .filter(money_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await
            .map_db_err()?
            .ok_or_else(|| LedgerError::not_found(EntityKind::MoneyAccount, id))?;

        debug!(tenant_id = %tenant_id, account_id = %id, "Locked money account");
        locked.insert(id, account);
    }

    Ok(locked)
}

/// Applies per-account deltas according to the balance strategy.
///
/// Every account in `deltas` must already be locked.
pub(crate) async fn settle_balances(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    strategy: BalanceStrategy,
    locked: &LockedAccounts,
    deltas: BTreeMap<MoneyAccountId, Money>,
) -> LedgerResult<()> {
    for (account_id, delta) in deltas {
        let account = locked
            .get(&account_id)
            .ok_or_else(|| LedgerError::not_found(EntityKind::MoneyAccount, account_id))?;

        match strategy {
            BalanceStrategy::Incremental => apply_delta(txn, tenant_id, account, delta).await?,
            BalanceStrategy::Recompute => {
                recompute_balance(txn, tenant_id, account).await?;
            }
        }
    }
    Ok(())
}

/// Adds `delta` to the cached balance with an in-place update.
async fn apply_delta(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    account: &money_accounts::Model,
    delta: Money,
) -> LedgerResult<()> {
    if delta.is_zero() {
        return Ok(());
    }

    // The row is locked, so this is the value the update will see.
    let balance = Money::from_code(account.balance_minor, &account.currency)?;
    let expected = balance.add(delta)?;

    money_accounts::Entity::update_many()
        .col_expr(
            money_accounts::Column::BalanceMinor,
            Expr::col(money_accounts::Column::BalanceMinor).add(delta.amount_minor()),
        )
        .col_expr(money_accounts::Column::UpdatedAt, Expr::value(now()))
        .filter(money_accounts::Column::Id.eq(account.id))
        .filter(money_accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .exec(txn)
        .await
        .map_db_err()?;

    debug!(
        tenant_id = %tenant_id,
        account_id = %account.id,
        delta = %delta,
        balance = %expected,
        "Applied balance delta"
    );
    Ok(())
}

/// Folds the full history of an account and overwrites its cached balance.
pub(crate) async fn recompute_balance(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    account: &money_accounts::Model,
) -> LedgerResult<Money> {
    let currency: Currency = account.currency.parse()?;
    let history = transactions::Entity::find()
        .filter(transactions::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(
            Condition::any()
                .add(transactions::Column::OriginAccountId.eq(account.id))
                .add(transactions::Column::DestinationAccountId.eq(account.id)),
        )
        .order_by_asc(transactions::Column::TransactionDate)
        .order_by_asc(transactions::Column::CreatedAt)
        .all(txn)
        .await
        .map_db_err()?;

    let movements = history
        .iter()
        .map(movement)
        .collect::<LedgerResult<Vec<_>>>()?;
    let derived = derive_balance(MoneyAccountId::from_uuid(account.id), currency, &movements)?;

    money_accounts::Entity::update_many()
        .col_expr(
            money_accounts::Column::BalanceMinor,
            Expr::value(derived.amount_minor()),
        )
        .col_expr(money_accounts::Column::UpdatedAt, Expr::value(now()))
        .filter(money_accounts::Column::Id.eq(account.id))
        .filter(money_accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .exec(txn)
        .await
        .map_db_err()?;

    debug!(
        tenant_id = %tenant_id,
        account_id = %account.id,
        transactions = movements.len(),
        balance = %derived,
        "Recomputed balance from history"
    );
    Ok(derived)
}

/// Rejects transactions owned by a payment or an expense.
async fn ensure_unowned(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    id: TransactionId,
) -> LedgerResult<()> {
    let owned_by_payment = payments::Entity::find()
        .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(payments::Column::TransactionId.eq(id.into_inner()))
        .count(txn)
        .await
        .map_db_err()?
        > 0;
    if owned_by_payment {
        return Err(LedgerError::TransactionOwned {
            transaction_id: id,
            owner: EntityKind::Payment,
        });
    }

    let owned_by_expense = expenses::Entity::find()
        .filter(expenses::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(expenses::Column::TransactionId.eq(id.into_inner()))
        .count(txn)
        .await
        .map_db_err()?
        > 0;
    if owned_by_expense {
        return Err(LedgerError::TransactionOwned {
            transaction_id: id,
            owner: EntityKind::Expense,
        });
    }

    Ok(())
}

/// Removes payments, expenses, and their attachment links that reference the
/// given transactions, and drops debt settlement links to them.
///
/// Settled debts keep their outstanding amount.
pub(crate) async fn detach_dependents(
    txn: &DatabaseTransaction,
    transaction_ids: &[Uuid],
) -> LedgerResult<()> {
    if transaction_ids.is_empty() {
        return Ok(());
    }

    let payment_ids: Vec<Uuid> = payments::Entity::find()
        .filter(payments::Column::TransactionId.is_in(transaction_ids.iter().copied()))
        .all(txn)
        .await
        .map_db_err()?
        .into_iter()
        .map(|payment| payment.id)
        .collect();
    payment_attachments::Entity::delete_many()
        .filter(payment_attachments::Column::PaymentId.is_in(payment_ids.iter().copied()))
        .exec(txn)
        .await
        .map_db_err()?;
    payments::Entity::delete_many()
        .filter(payments::Column::Id.is_in(payment_ids))
        .exec(txn)
        .await
        .map_db_err()?;

    let expense_ids: Vec<Uuid> = expenses::Entity::find()
        .filter(expenses::Column::TransactionId.is_in(transaction_ids.iter().copied()))
        .all(txn)
        .await
        .map_db_err()?
        .into_iter()
        .map(|expense| expense.id)
        .collect();
    expense_attachments::Entity::delete_many()
        .filter(expense_attachments::Column::ExpenseId.is_in(expense_ids.iter().copied()))
        .exec(txn)
        .await
        .map_db_err()?;
    expenses::Entity::delete_many()
        .filter(expenses::Column::Id.is_in(expense_ids))
        .exec(txn)
        .await
        .map_db_err()?;

    debt_settlements::Entity::delete_many()
        .filter(debt_settlements::Column::TransactionId.is_in(transaction_ids.iter().copied()))
        .exec(txn)
        .await
        .map_db_err()?;
    debts::Entity::update_many()
        .col_expr(
            debts::Column::SettlementTransactionId,
            Expr::value(Option::<Uuid>::None),
        )
        .col_expr(debts::Column::UpdatedAt, Expr::value(now()))
        .filter(debts::Column::SettlementTransactionId.is_in(transaction_ids.iter().copied()))
        .exec(txn)
        .await
        .map_db_err()?;

    Ok(())
}

async fn find_locked(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    id: TransactionId,
) -> LedgerResult<transactions::Model> {
    transactions::Entity::find_by_id(id.into_inner())
        .filter(transactions::Column::TenantId.eq(tenant_id.into_inner()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_db_err()?
        .ok_or_else(|| LedgerError::not_found(EntityKind::Transaction, id))
}

fn currencies(movement: &Movement, locked: &LockedAccounts) -> LedgerResult<AccountCurrencies> {
    let currency_of = |id: Option<MoneyAccountId>| -> LedgerResult<Option<Currency>> {
        id.and_then(|id| locked.get(&id))
            .map(|account| account.currency.parse::<Currency>().map_err(LedgerError::from))
            .transpose()
    };

    Ok(AccountCurrencies {
        origin: currency_of(movement.origin_account_id)?,
        destination: currency_of(movement.destination_account_id)?,
    })
}

fn write_fields(active: &mut transactions::ActiveModel, input: &CreateTransactionInput) {
    let movement = &input.movement;
    let exchange = movement.exchange;

    active.kind = Set(movement.kind.into());
    active.amount_minor = Set(movement.amount.amount_minor());
    active.currency = Set(movement.amount.currency().code().to_string());
    active.origin_account_id = Set(movement.origin_account_id.map(MoneyAccountId::into_inner));
    active.destination_account_id =
        Set(movement.destination_account_id.map(MoneyAccountId::into_inner));
    active.exchange_rate = Set(exchange.map(|e| e.rate.normalize().to_string()));
    active.destination_amount_minor = Set(exchange.map(|e| e.destination_amount.amount_minor()));
    active.destination_currency =
        Set(exchange.map(|e| e.destination_amount.currency().code().to_string()));
    active.transaction_date = Set(input.details.transaction_date);
    active.accounting_period = Set(input.details.accounting_period);
    active.comment = Set(input.details.comment.clone());
}

fn filtered(tenant_id: TenantId, filter: &TransactionFilter) -> Select<transactions::Entity> {
    let mut query = transactions::Entity::find()
        .filter(transactions::Column::TenantId.eq(tenant_id.into_inner()));

    if let Some(kind) = filter.kind {
        query = query.filter(transactions::Column::Kind.eq(
            crate::entities::sea_orm_active_enums::TransactionKind::from(kind),
        ));
    }
    if let Some(account_id) = filter.account_id {
        query = query.filter(
            Condition::any()
                .add(transactions::Column::OriginAccountId.eq(account_id.into_inner()))
                .add(transactions::Column::DestinationAccountId.eq(account_id.into_inner())),
        );
    }
    if let Some(account_id) = filter.origin_account_id {
        query = query.filter(transactions::Column::OriginAccountId.eq(account_id.into_inner()));
    }
    if let Some(account_id) = filter.destination_account_id {
        query =
            query.filter(transactions::Column::DestinationAccountId.eq(account_id.into_inner()));
    }
    if let Some(date_from) = filter.date_from {
        query = query.filter(transactions::Column::TransactionDate.gte(date_from));
    }
    if let Some(date_to) = filter.date_to {
        query = query.filter(transactions::Column::TransactionDate.lte(date_to));
    }
    if let Some(period) = filter.accounting_period {
        query = query.filter(transactions::Column::AccountingPeriod.eq(period));
    }
    if let Some(term) = search_term(filter.comment_contains.as_deref()) {
        query = query.filter(contains_ci(transactions::Column::Comment, term));
    }

    query
}

const fn sort_column(field: TransactionSortField) -> transactions::Column {
    match field {
        TransactionSortField::TransactionDate => transactions::Column::TransactionDate,
        TransactionSortField::AccountingPeriod => transactions::Column::AccountingPeriod,
        TransactionSortField::Amount => transactions::Column::AmountMinor,
        TransactionSortField::CreatedAt => transactions::Column::CreatedAt,
    }
}

/// Reads the movement stored in a transaction row.
///
/// # Errors
///
/// Returns `UnknownCurrency` for unregistered currency codes.
pub(crate) fn movement(model: &transactions::Model) -> LedgerResult<Movement> {
    let exchange = match (
        model.exchange_rate.as_deref(),
        model.destination_amount_minor,
        model.destination_currency.as_deref(),
    ) {
        (Some(rate), Some(minor), Some(code)) => Some(ExchangeDetails {
            rate: Decimal::from_str(rate).map_err(|err| {
                LedgerError::Storage(format!("invalid exchange rate {rate:?}: {err}"))
            })?,
            destination_amount: Money::from_code(minor, code)?,
        }),
        _ => None,
    };

    Ok(Movement {
        kind: model.kind.into(),
        amount: Money::from_code(model.amount_minor, &model.currency)?,
        origin_account_id: model.origin_account_id.map(MoneyAccountId::from_uuid),
        destination_account_id: model.destination_account_id.map(MoneyAccountId::from_uuid),
        exchange,
    })
}

pub(crate) fn to_domain(model: transactions::Model) -> LedgerResult<Transaction> {
    Ok(Transaction {
        movement: movement(&model)?,
        id: TransactionId::from_uuid(model.id),
        tenant_id: TenantId::from_uuid(model.tenant_id),
        details: TransactionDetails {
            transaction_date: model.transaction_date,
            accounting_period: model.accounting_period,
            comment: model.comment,
        },
        created_at: to_utc(model.created_at),
    })
}
