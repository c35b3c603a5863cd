//! Debt repository.
//!
//! Lifecycle operations lock the debt row, apply the domain transition, and
//! write the result back. A rejected transition leaves the row untouched.
//!
//! Settling via a transaction locks the transaction row before the debt row,
//! matching the transaction-then-account-then-debt order of the ledger write
//! path. Each transaction is recorded in `debt_settlements` at most once.

use chrono::Utc;
use moneta_core::debt::{
    CounterpartyDebtSummary, CreateDebtInput, Debt, DebtFilter, DebtSortField, DebtStore,
    UpdateDebtInput, summarize_by_counterparty,
};
use moneta_core::{EntityKind, FindParams, LedgerError, LedgerResult};
use moneta_shared::config::LedgerConfig;
use moneta_shared::types::{
    CounterpartyId, DebtId, Money, PageResponse, TenantId, TransactionId,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::{debug, info};

use super::support::{DbResultExt, now, order, page_of, to_utc};
use super::transaction;
use crate::entities::sea_orm_active_enums::{DebtStatus, DebtType};
use crate::entities::{debt_settlements, debts, transactions};

/// Debt repository.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    db: DatabaseConnection,
    config: LedgerConfig,
}

impl DebtRepository {
    /// Creates a new debt repository with default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    /// Creates a new debt repository with explicit ledger settings.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self { db, config }
    }
}

impl DebtStore for DebtRepository {
    async fn create(
        &self,
        tenant_id: TenantId,
        input: CreateDebtInput,
    ) -> Result<Debt, LedgerError> {
        let debt = Debt::open(tenant_id, input, Utc::now())?;
        let model = to_active(&debt).insert(&self.db).await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            debt_id = %debt.id,
            debt_type = debt.debt_type.as_str(),
            amount = %debt.original_amount,
            "Debt opened"
        );
        to_domain(model)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: DebtId,
        input: UpdateDebtInput,
    ) -> Result<Debt, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let mut debt = find_locked(&txn, tenant_id, id).await?;
        debt.counterparty_id = input.counterparty_id;
        debt.description = input.description;
        debt.due_date = input.due_date;
        debt.updated_at = Utc::now();
        let model = save(&txn, &debt).await?;
        txn.commit().await.map_db_err()?;

        info!(tenant_id = %tenant_id, debt_id = %id, "Debt updated");
        to_domain(model)
    }

    async fn delete(&self, tenant_id: TenantId, id: DebtId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        find_locked(&txn, tenant_id, id).await?;

        debt_settlements::Entity::delete_many()
            .filter(debt_settlements::Column::DebtId.eq(id.into_inner()))
            .filter(debt_settlements::Column::TenantId.eq(tenant_id.into_inner()))
            .exec(&txn)
            .await
            .map_db_err()?;
        debts::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .map_db_err()?;
        txn.commit().await.map_db_err()?;

        info!(tenant_id = %tenant_id, debt_id = %id, "Debt deleted");
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: DebtId,
    ) -> Result<Option<Debt>, LedgerError> {
        debts::Entity::find_by_id(id.into_inner())
            .filter(debts::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await
            .map_db_err()?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_counterparty(
        &self,
        tenant_id: TenantId,
        counterparty_id: CounterpartyId,
    ) -> Result<Vec<Debt>, LedgerError> {
        let filter = DebtFilter {
            counterparty_id: Some(counterparty_id),
            ..DebtFilter::default()
        };

        filtered(tenant_id, &filter)
            .order_by_asc(debts::Column::CreatedAt)
            .order_by_asc(debts::Column::Id)
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
        params: FindParams<DebtFilter, DebtSortField>,
    ) -> Result<PageResponse<Debt>, LedgerError> {
        let page = self.config.resolve_page(params.page);
        let query = filtered(tenant_id, &params.filter);
        let total = query.clone().count(&self.db).await.map_db_err()?;

        let query = match params.sort {
            Some(sort) => query.order_by(sort_column(sort.field), order(sort.direction)),
            None => query.order_by_desc(debts::Column::CreatedAt),
        };
        let models = query
            .order_by_asc(debts::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_db_err()?;

        page_of(models, page, total, to_domain)
    }

    async fn count(&self, tenant_id: TenantId, filter: DebtFilter) -> Result<u64, LedgerError> {
        filtered(tenant_id, &filter)
            .count(&self.db)
            .await
            .map_db_err()
    }

    async fn record_partial_settlement(
        &self,
        tenant_id: TenantId,
        id: DebtId,
        amount: Money,
    ) -> Result<Debt, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let mut debt = find_locked(&txn, tenant_id, id).await?;
        debt.record_partial_settlement(amount, Utc::now())?;
        let model = save(&txn, &debt).await?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            debt_id = %id,
            amount = %amount,
            outstanding = %debt.outstanding_amount,
            status = %debt.status,
            "Debt partially settled"
        );
        to_domain(model)
    }

    async fn settle_via_transaction(
        &self,
        tenant_id: TenantId,
        id: DebtId,
        transaction_id: TransactionId,
    ) -> Result<Debt, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;

        let settlement = transactions::Entity::find_by_id(transaction_id.into_inner())
            .filter(transactions::Column::TenantId.eq(tenant_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_db_err()?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Transaction, transaction_id))?;
        let settlement = transaction::to_domain(settlement)?;

        if let Some(link) = debt_settlements::Entity::find_by_id(transaction_id.into_inner())
            .one(&txn)
            .await
            .map_db_err()?
        {
            return Err(LedgerError::SettlementAlreadyApplied {
                transaction_id,
                debt_id: DebtId::from_uuid(link.debt_id),
            });
        }

        let mut debt = find_locked(&txn, tenant_id, id).await?;
        let before = debt.outstanding_amount;
        debt.settle_via_transaction(&settlement, Utc::now())?;
        let applied = before.checked_sub(debt.outstanding_amount)?;

        let model = save(&txn, &debt).await?;
        debt_settlements::ActiveModel {
            transaction_id: Set(transaction_id.into_inner()),
            debt_id: Set(id.into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            applied_amount_minor: Set(applied.amount_minor()),
            currency: Set(applied.currency().code().to_string()),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await
        .map_db_err()?;
        txn.commit().await.map_db_err()?;

        debug!(
            tenant_id = %tenant_id,
            debt_id = %id,
            transaction_id = %transaction_id,
            applied = %applied,
            "Recorded debt settlement"
        );
        info!(
            tenant_id = %tenant_id,
            debt_id = %id,
            transaction_id = %transaction_id,
            outstanding = %debt.outstanding_amount,
            status = %debt.status,
            "Debt settled via transaction"
        );
        to_domain(model)
    }

    async fn cancel(&self, tenant_id: TenantId, id: DebtId) -> Result<Debt, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let mut debt = find_locked(&txn, tenant_id, id).await?;
        debt.cancel(Utc::now())?;
        let model = save(&txn, &debt).await?;
        txn.commit().await.map_db_err()?;

        info!(tenant_id = %tenant_id, debt_id = %id, "Debt cancelled");
        to_domain(model)
    }

    async fn counterparty_summaries(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<CounterpartyDebtSummary>, LedgerError> {
        let debts = filtered(tenant_id, &DebtFilter::default())
            .all(&self.db)
            .await
            .map_db_err()?
            .into_iter()
            .map(to_domain)
            .collect::<LedgerResult<Vec<_>>>()?;

        summarize_by_counterparty(&debts)
    }
}

async fn find_locked(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    id: DebtId,
) -> LedgerResult<Debt> {
    let model = debts::Entity::find_by_id(id.into_inner())
        .filter(debts::Column::TenantId.eq(tenant_id.into_inner()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_db_err()?
        .ok_or_else(|| LedgerError::not_found(EntityKind::Debt, id))?;
    to_domain(model)
}

async fn save(txn: &DatabaseTransaction, debt: &Debt) -> LedgerResult<debts::Model> {
    debt.validate()?;
    to_active(debt).update(txn).await.map_db_err()
}

fn filtered(tenant_id: TenantId, filter: &DebtFilter) -> Select<debts::Entity> {
    let mut query =
        debts::Entity::find().filter(debts::Column::TenantId.eq(tenant_id.into_inner()));

    if let Some(counterparty_id) = filter.counterparty_id {
        query = query.filter(debts::Column::CounterpartyId.eq(counterparty_id.into_inner()));
    }
    if let Some(debt_type) = filter.debt_type {
        query = query.filter(debts::Column::DebtType.eq(DebtType::from(debt_type)));
    }
    if let Some(status) = filter.status {
        query = query.filter(debts::Column::Status.eq(DebtStatus::from(status)));
    }
    if let Some(created_from) = filter.created_from {
        query =
            query.filter(debts::Column::CreatedAt.gte(DateTimeWithTimeZone::from(created_from)));
    }
    if let Some(created_to) = filter.created_to {
        query = query.filter(debts::Column::CreatedAt.lte(DateTimeWithTimeZone::from(created_to)));
    }

    query
}

const fn sort_column(field: DebtSortField) -> debts::Column {
    match field {
        DebtSortField::CreatedAt => debts::Column::CreatedAt,
        DebtSortField::DueDate => debts::Column::DueDate,
        DebtSortField::OutstandingAmount => debts::Column::OutstandingAmountMinor,
    }
}

fn to_active(debt: &Debt) -> debts::ActiveModel {
    debts::ActiveModel {
        id: Set(debt.id.into_inner()),
        tenant_id: Set(debt.tenant_id.into_inner()),
        debt_type: Set(debt.debt_type.into()),
        status: Set(debt.status.into()),
        counterparty_id: Set(debt.counterparty_id.into_inner()),
        original_amount_minor: Set(debt.original_amount.amount_minor()),
        outstanding_amount_minor: Set(debt.outstanding_amount.amount_minor()),
        currency: Set(debt.original_amount.currency().code().to_string()),
        description: Set(debt.description.clone()),
        due_date: Set(debt.due_date),
        settlement_transaction_id: Set(debt
            .settlement_transaction_id
            .map(TransactionId::into_inner)),
        created_at: Set(debt.created_at.into()),
        updated_at: Set(debt.updated_at.into()),
    }
}

fn to_domain(model: debts::Model) -> LedgerResult<Debt> {
    Ok(Debt {
        id: DebtId::from_uuid(model.id),
        tenant_id: TenantId::from_uuid(model.tenant_id),
        debt_type: model.debt_type.into(),
        status: model.status.into(),
        counterparty_id: CounterpartyId::from_uuid(model.counterparty_id),
        original_amount: Money::from_code(model.original_amount_minor, &model.currency)?,
        outstanding_amount: Money::from_code(model.outstanding_amount_minor, &model.currency)?,
        description: model.description,
        due_date: model.due_date,
        settlement_transaction_id: model.settlement_transaction_id.map(TransactionId::from_uuid),
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}
