//! Expense repository.
//!
//! An expense is a withdrawal plus an `expenses` row and its attachment
//! links, written together in one database transaction. The withdrawal holds
//! the positive magnitude.

use std::collections::HashMap;

use moneta_core::attachment::AttachmentSet;
use moneta_core::expense::{
    CreateExpenseInput, Expense, ExpenseFilter, ExpenseSortField, ExpenseStore,
    UpdateExpenseInput,
};
use moneta_core::{EntityKind, FindParams, LedgerError, LedgerResult};
use moneta_shared::config::LedgerConfig;
use moneta_shared::types::{
    CategoryId, ExpenseId, FileId, PageResponse, SortBy, TenantId, TransactionId,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::support::{DbResultExt, now, order, position, to_utc};
use super::transaction::{self, insert_transaction, remove_transaction, replace_transaction};
use crate::entities::{expense_attachments, expenses, transactions};

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
    config: LedgerConfig,
}

impl ExpenseRepository {
    /// Creates a new expense repository with default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    /// Creates a new expense repository with explicit ledger settings.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self { db, config }
    }
}

impl ExpenseStore for ExpenseRepository {
    async fn create(
        &self,
        tenant_id: TenantId,
        input: CreateExpenseInput,
    ) -> Result<Expense, LedgerError> {
        let attachments = input.attachment_set()?;
        let timestamp = now();

        let txn = self.db.begin().await.map_db_err()?;
        let withdrawal = insert_transaction(
            &txn,
            tenant_id,
            &input.transaction_input(),
            self.config.balance_strategy,
        )
        .await?;

        let model = expenses::ActiveModel {
            id: Set(ExpenseId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            transaction_id: Set(withdrawal.id),
            category_id: Set(input.category_id.into_inner()),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await
        .map_db_err()?;

        insert_attachments(&txn, tenant_id, model.id, &attachments).await?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            expense_id = %model.id,
            transaction_id = %withdrawal.id,
            amount = %input.amount,
            "Expense recorded"
        );
        to_domain(model, withdrawal, attachments)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
        input: UpdateExpenseInput,
    ) -> Result<Expense, LedgerError> {
        let attachments = input.attachment_set()?;

        let txn = self.db.begin().await.map_db_err()?;
        let existing = find_locked(&txn, tenant_id, id).await?;
        let withdrawal = replace_transaction(
            &txn,
            tenant_id,
            TransactionId::from_uuid(existing.transaction_id),
            &input.transaction_input(),
            self.config.balance_strategy,
        )
        .await?;

        let mut active: expenses::ActiveModel = existing.into();
        active.category_id = Set(input.category_id.into_inner());
        active.updated_at = Set(now());
        let model = active.update(&txn).await.map_db_err()?;

        expense_attachments::Entity::delete_many()
            .filter(expense_attachments::Column::ExpenseId.eq(model.id))
            .exec(&txn)
            .await
            .map_db_err()?;
        insert_attachments(&txn, tenant_id, model.id, &attachments).await?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            expense_id = %id,
            amount = %input.amount,
            "Expense updated"
        );
        to_domain(model, withdrawal, attachments)
    }

    async fn delete(&self, tenant_id: TenantId, id: ExpenseId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let existing = find_locked(&txn, tenant_id, id).await?;

        expense_attachments::Entity::delete_many()
            .filter(expense_attachments::Column::ExpenseId.eq(existing.id))
            .exec(&txn)
            .await
            .map_db_err()?;
        expenses::Entity::delete_by_id(existing.id)
            .exec(&txn)
            .await
            .map_db_err()?;
        remove_transaction(
            &txn,
            tenant_id,
            TransactionId::from_uuid(existing.transaction_id),
            self.config.balance_strategy,
        )
        .await?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            expense_id = %id,
            transaction_id = %existing.transaction_id,
            "Expense deleted"
        );
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
    ) -> Result<Option<Expense>, LedgerError> {
        let Some(model) = find_model(&self.db, tenant_id, id).await? else {
            return Ok(None);
        };
        Ok(load(&self.db, vec![model]).await?.pop())
    }

    async fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<ExpenseFilter, ExpenseSortField>,
    ) -> Result<PageResponse<Expense>, LedgerError> {
        let page = self.config.resolve_page(params.page);
        let query = filtered(tenant_id, &params.filter);
        let total = query.clone().count(&self.db).await.map_db_err()?;

        let query = match params.sort {
            Some(SortBy {
                field: ExpenseSortField::TransactionDate,
                direction,
            }) => query.order_by(transactions::Column::TransactionDate, order(direction)),
            Some(SortBy {
                field: ExpenseSortField::Amount,
                direction,
            }) => query.order_by(transactions::Column::AmountMinor, order(direction)),
            Some(SortBy {
                field: ExpenseSortField::CreatedAt,
                direction,
            }) => query.order_by(expenses::Column::CreatedAt, order(direction)),
            None => query
                .order_by_desc(transactions::Column::TransactionDate)
                .order_by_desc(expenses::Column::CreatedAt),
        };
        let models = query
            .order_by_asc(expenses::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_db_err()?;

        let data = load(&self.db, models).await?;
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn count(&self, tenant_id: TenantId, filter: ExpenseFilter) -> Result<u64, LedgerError> {
        filtered(tenant_id, &filter)
            .count(&self.db)
            .await
            .map_db_err()
    }

    async fn attach_file(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
        file_id: FileId,
    ) -> Result<bool, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let existing = find_locked(&txn, tenant_id, id).await?;
        let rows = attachment_rows(&txn, existing.id).await?;

        let mut set =
            AttachmentSet::from_ids(rows.iter().map(|row| FileId::from_uuid(row.file_id)))?;
        match set.attach(file_id) {
            Ok(()) => {}
            Err(LedgerError::DuplicateAttachment(_)) => return Ok(false),
            Err(err) => return Err(err),
        }

        expense_attachments::ActiveModel {
            expense_id: Set(existing.id),
            file_id: Set(file_id.into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            position: Set(rows.last().map_or(0, |row| row.position.saturating_add(1))),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await
        .map_db_err()?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            expense_id = %id,
            file_id = %file_id,
            "File attached to expense"
        );
        Ok(true)
    }

    async fn detach_file(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
        file_id: FileId,
    ) -> Result<bool, LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let existing = find_locked(&txn, tenant_id, id).await?;
        let rows = attachment_rows(&txn, existing.id).await?;

        let mut set =
            AttachmentSet::from_ids(rows.iter().map(|row| FileId::from_uuid(row.file_id)))?;
        match set.detach(file_id) {
            Ok(()) => {}
            Err(LedgerError::AttachmentNotFound(_)) => return Ok(false),
            Err(err) => return Err(err),
        }

        expense_attachments::Entity::delete_by_id((existing.id, file_id.into_inner()))
            .exec(&txn)
            .await
            .map_db_err()?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            expense_id = %id,
            file_id = %file_id,
            "File detached from expense"
        );
        Ok(true)
    }

    async fn list_attachments(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
    ) -> Result<AttachmentSet, LedgerError> {
        let existing = find_model(&self.db, tenant_id, id)
            .await?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Expense, id))?;
        let rows = attachment_rows(&self.db, existing.id).await?;
        AttachmentSet::from_ids(rows.into_iter().map(|row| FileId::from_uuid(row.file_id)))
    }
}

async fn find_model<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: ExpenseId,
) -> LedgerResult<Option<expenses::Model>> {
    expenses::Entity::find_by_id(id.into_inner())
        .filter(expenses::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .map_db_err()
}

async fn find_locked(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    id: ExpenseId,
) -> LedgerResult<expenses::Model> {
    expenses::Entity::find_by_id(id.into_inner())
        .filter(expenses::Column::TenantId.eq(tenant_id.into_inner()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_db_err()?
        .ok_or_else(|| LedgerError::not_found(EntityKind::Expense, id))
}

async fn attachment_rows<C: ConnectionTrait>(
    conn: &C,
    expense_id: Uuid,
) -> LedgerResult<Vec<expense_attachments::Model>> {
    expense_attachments::Entity::find()
        .filter(expense_attachments::Column::ExpenseId.eq(expense_id))
        .order_by_asc(expense_attachments::Column::Position)
        .all(conn)
        .await
        .map_db_err()
}

async fn insert_attachments(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    expense_id: Uuid,
    attachments: &AttachmentSet,
) -> LedgerResult<()> {
    let timestamp = now();
    for (index, file_id) in attachments.iter().enumerate() {
        expense_attachments::ActiveModel {
            expense_id: Set(expense_id),
            file_id: Set(file_id.into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            position: Set(position(index)?),
            created_at: Set(timestamp),
        }
        .insert(txn)
        .await
        .map_db_err()?;
    }
    Ok(())
}

/// Joins expense rows with their withdrawals and attachment sets, keeping order.
async fn load<C: ConnectionTrait>(
    conn: &C,
    models: Vec<expenses::Model>,
) -> LedgerResult<Vec<Expense>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let mut withdrawals: HashMap<Uuid, transactions::Model> = transactions::Entity::find()
        .filter(transactions::Column::Id.is_in(models.iter().map(|model| model.transaction_id)))
        .all(conn)
        .await
        .map_db_err()?
        .into_iter()
        .map(|withdrawal| (withdrawal.id, withdrawal))
        .collect();

    let mut files: HashMap<Uuid, Vec<FileId>> = HashMap::new();
    for row in expense_attachments::Entity::find()
        .filter(expense_attachments::Column::ExpenseId.is_in(models.iter().map(|model| model.id)))
        .order_by_asc(expense_attachments::Column::Position)
        .all(conn)
        .await
        .map_db_err()?
    {
        files
            .entry(row.expense_id)
            .or_default()
            .push(FileId::from_uuid(row.file_id));
    }

    models
        .into_iter()
        .map(|model| {
            let withdrawal = withdrawals.remove(&model.transaction_id).ok_or_else(|| {
                LedgerError::Storage(format!("expense {} has no transaction", model.id))
            })?;
            let attachments = AttachmentSet::from_ids(files.remove(&model.id).unwrap_or_default())?;
            to_domain(model, withdrawal, attachments)
        })
        .collect()
}

fn filtered(tenant_id: TenantId, filter: &ExpenseFilter) -> Select<expenses::Entity> {
    let mut query = expenses::Entity::find()
        .inner_join(transactions::Entity)
        .filter(expenses::Column::TenantId.eq(tenant_id.into_inner()));

    if let Some(category_id) = filter.category_id {
        query = query.filter(expenses::Column::CategoryId.eq(category_id.into_inner()));
    }
    if let Some(account_id) = filter.account_id {
        query =
            query.filter(transactions::Column::OriginAccountId.eq(account_id.into_inner()));
    }
    if let Some(date_from) = filter.date_from {
        query = query.filter(transactions::Column::TransactionDate.gte(date_from));
    }
    if let Some(date_to) = filter.date_to {
        query = query.filter(transactions::Column::TransactionDate.lte(date_to));
    }

    query
}

fn to_domain(
    model: expenses::Model,
    withdrawal: transactions::Model,
    attachments: AttachmentSet,
) -> LedgerResult<Expense> {
    Ok(Expense {
        id: ExpenseId::from_uuid(model.id),
        tenant_id: TenantId::from_uuid(model.tenant_id),
        transaction: transaction::to_domain(withdrawal)?,
        category_id: CategoryId::from_uuid(model.category_id),
        attachments,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}
