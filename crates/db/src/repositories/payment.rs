//! Payment repository.
//!
//! A payment is a deposit plus a `payments` row and its attachment links,
//! written together in one database transaction.

use std::collections::HashMap;

use moneta_core::attachment::AttachmentSet;
use moneta_core::payment::{
    CreatePaymentInput, Payment, PaymentCategory, PaymentFilter, PaymentSortField, PaymentStore,
    UpdatePaymentInput,
};
use moneta_core::{EntityKind, FindParams, LedgerError, LedgerResult};
use moneta_shared::config::LedgerConfig;
use moneta_shared::types::{
    CategoryId, CounterpartyId, FileId, PageResponse, PaymentId, SortBy, TenantId, TransactionId,
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
use crate::entities::{payment_attachments, payments, transactions};

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
    config: LedgerConfig,
}

impl PaymentRepository {
    /// Creates a new payment repository with default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::default())
    }

    /// Creates a new payment repository with explicit ledger settings.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self { db, config }
    }
}

impl PaymentStore for PaymentRepository {
    async fn create(
        &self,
        tenant_id: TenantId,
        input: CreatePaymentInput,
    ) -> Result<Payment, LedgerError> {
        let attachments = input.attachment_set()?;
        let timestamp = now();

        let txn = self.db.begin().await.map_db_err()?;
        let deposit = insert_transaction(
            &txn,
            tenant_id,
            &input.transaction_input(),
            self.config.balance_strategy,
        )
        .await?;

        let model = payments::ActiveModel {
            id: Set(PaymentId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            transaction_id: Set(deposit.id),
            counterparty_id: Set(input.counterparty_id.into_inner()),
            category_id: Set(input.category.id().map(CategoryId::into_inner)),
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
            payment_id = %model.id,
            transaction_id = %deposit.id,
            amount = %input.amount,
            "Payment recorded"
        );
        to_domain(model, deposit, attachments)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        input: UpdatePaymentInput,
    ) -> Result<Payment, LedgerError> {
        let attachments = input.attachment_set()?;

        let txn = self.db.begin().await.map_db_err()?;
        let existing = find_locked(&txn, tenant_id, id).await?;
        let deposit = replace_transaction(
            &txn,
            tenant_id,
            TransactionId::from_uuid(existing.transaction_id),
            &input.transaction_input(),
            self.config.balance_strategy,
        )
        .await?;

        let mut active: payments::ActiveModel = existing.into();
        active.counterparty_id = Set(input.counterparty_id.into_inner());
        active.category_id = Set(input.category.id().map(CategoryId::into_inner));
        active.updated_at = Set(now());
        let model = active.update(&txn).await.map_db_err()?;

        payment_attachments::Entity::delete_many()
            .filter(payment_attachments::Column::PaymentId.eq(model.id))
            .exec(&txn)
            .await
            .map_db_err()?;
        insert_attachments(&txn, tenant_id, model.id, &attachments).await?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            payment_id = %id,
            amount = %input.amount,
            "Payment updated"
        );
        to_domain(model, deposit, attachments)
    }

    async fn delete(&self, tenant_id: TenantId, id: PaymentId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_db_err()?;
        let existing = find_locked(&txn, tenant_id, id).await?;

        payment_attachments::Entity::delete_many()
            .filter(payment_attachments::Column::PaymentId.eq(existing.id))
            .exec(&txn)
            .await
            .map_db_err()?;
        payments::Entity::delete_by_id(existing.id)
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
            payment_id = %id,
            transaction_id = %existing.transaction_id,
            "Payment deleted"
        );
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<Option<Payment>, LedgerError> {
        let Some(model) = find_model(&self.db, tenant_id, id).await? else {
            return Ok(None);
        };
        Ok(load(&self.db, vec![model]).await?.pop())
    }

    async fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<PaymentFilter, PaymentSortField>,
    ) -> Result<PageResponse<Payment>, LedgerError> {
        let page = self.config.resolve_page(params.page);
        let query = filtered(tenant_id, &params.filter);
        let total = query.clone().count(&self.db).await.map_db_err()?;

        let query = match params.sort {
            Some(SortBy {
                field: PaymentSortField::TransactionDate,
                direction,
            }) => query.order_by(transactions::Column::TransactionDate, order(direction)),
            Some(SortBy {
                field: PaymentSortField::Amount,
                direction,
            }) => query.order_by(transactions::Column::AmountMinor, order(direction)),
            Some(SortBy {
                field: PaymentSortField::CreatedAt,
                direction,
            }) => query.order_by(payments::Column::CreatedAt, order(direction)),
            None => query
                .order_by_desc(transactions::Column::TransactionDate)
                .order_by_desc(payments::Column::CreatedAt),
        };
        let models = query
            .order_by_asc(payments::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_db_err()?;

        let data = load(&self.db, models).await?;
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn count(&self, tenant_id: TenantId, filter: PaymentFilter) -> Result<u64, LedgerError> {
        filtered(tenant_id, &filter)
            .count(&self.db)
            .await
            .map_db_err()
    }

    async fn attach_file(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
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

        payment_attachments::ActiveModel {
            payment_id: Set(existing.id),
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
            payment_id = %id,
            file_id = %file_id,
            "File attached to payment"
        );
        Ok(true)
    }

    async fn detach_file(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
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

        payment_attachments::Entity::delete_by_id((existing.id, file_id.into_inner()))
            .exec(&txn)
            .await
            .map_db_err()?;
        txn.commit().await.map_db_err()?;

        info!(
            tenant_id = %tenant_id,
            payment_id = %id,
            file_id = %file_id,
            "File detached from payment"
        );
        Ok(true)
    }

    async fn list_attachments(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<AttachmentSet, LedgerError> {
        let existing = find_model(&self.db, tenant_id, id)
            .await?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Payment, id))?;
        let rows = attachment_rows(&self.db, existing.id).await?;
        AttachmentSet::from_ids(rows.into_iter().map(|row| FileId::from_uuid(row.file_id)))
    }
}

async fn find_model<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: PaymentId,
) -> LedgerResult<Option<payments::Model>> {
    payments::Entity::find_by_id(id.into_inner())
        .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await
        .map_db_err()
}

async fn find_locked(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    id: PaymentId,
) -> LedgerResult<payments::Model> {
    payments::Entity::find_by_id(id.into_inner())
        .filter(payments::Column::TenantId.eq(tenant_id.into_inner()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_db_err()?
        .ok_or_else(|| LedgerError::not_found(EntityKind::Payment, id))
}

async fn attachment_rows<C: ConnectionTrait>(
    conn: &C,
    payment_id: Uuid,
) -> LedgerResult<Vec<payment_attachments::Model>> {
    payment_attachments::Entity::find()
        .filter(payment_attachments::Column::PaymentId.eq(payment_id))
        .order_by_asc(payment_attachments::Column::Position)
        .all(conn)
        .await
        .map_db_err()
}

async fn insert_attachments(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    payment_id: Uuid,
    attachments: &AttachmentSet,
) -> LedgerResult<()> {
    let timestamp = now();
    for (index, file_id) in attachments.iter().enumerate() {
        payment_attachments::ActiveModel {
            payment_id: Set(payment_id),
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

/// Joins payment rows with their deposits and attachment sets, keeping order.
async fn load<C: ConnectionTrait>(
    conn: &C,
    models: Vec<payments::Model>,
) -> LedgerResult<Vec<Payment>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let mut deposits: HashMap<Uuid, transactions::Model> = transactions::Entity::find()
        .filter(transactions::Column::Id.is_in(models.iter().map(|model| model.transaction_id)))
        .all(conn)
        .await
        .map_db_err()?
        .into_iter()
        .map(|deposit| (deposit.id, deposit))
        .collect();

    let mut files: HashMap<Uuid, Vec<FileId>> = HashMap::new();
    for row in payment_attachments::Entity::find()
        .filter(payment_attachments::Column::PaymentId.is_in(models.iter().map(|model| model.id)))
        .order_by_asc(payment_attachments::Column::Position)
        .all(conn)
        .await
        .map_db_err()?
    {
        files
            .entry(row.payment_id)
            .or_default()
            .push(FileId::from_uuid(row.file_id));
    }

    models
        .into_iter()
        .map(|model| {
            let deposit = deposits.remove(&model.transaction_id).ok_or_else(|| {
                LedgerError::Storage(format!("payment {} has no transaction", model.id))
            })?;
            let attachments = AttachmentSet::from_ids(files.remove(&model.id).unwrap_or_default())?;
            to_domain(model, deposit, attachments)
        })
        .collect()
}

fn filtered(tenant_id: TenantId, filter: &PaymentFilter) -> Select<payments::Entity> {
    let mut query = payments::Entity::find()
        .inner_join(transactions::Entity)
        .filter(payments::Column::TenantId.eq(tenant_id.into_inner()));

    if let Some(counterparty_id) = filter.counterparty_id {
        query = query.filter(payments::Column::CounterpartyId.eq(counterparty_id.into_inner()));
    }
    match filter.category {
        Some(PaymentCategory::Uncategorized) => {
            query = query.filter(payments::Column::CategoryId.is_null());
        }
        Some(PaymentCategory::Category(category_id)) => {
            query = query.filter(payments::Column::CategoryId.eq(category_id.into_inner()));
        }
        None => {}
    }
    if let Some(account_id) = filter.account_id {
        query =
            query.filter(transactions::Column::DestinationAccountId.eq(account_id.into_inner()));
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
    model: payments::Model,
    deposit: transactions::Model,
    attachments: AttachmentSet,
) -> LedgerResult<Payment> {
    Ok(Payment {
        id: PaymentId::from_uuid(model.id),
        tenant_id: TenantId::from_uuid(model.tenant_id),
        transaction: transaction::to_domain(deposit)?,
        counterparty_id: CounterpartyId::from_uuid(model.counterparty_id),
        category: PaymentCategory::from(model.category_id.map(CategoryId::from_uuid)),
        attachments,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}
