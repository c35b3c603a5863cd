//! Persistence seam for ledger transactions.

use std::future::Future;

use moneta_shared::types::{PageResponse, TenantId, TransactionId};

use super::error::LedgerError;
use super::types::{
    CreateTransactionInput, Transaction, TransactionFilter, TransactionSortField,
    UpdateTransactionInput,
};
use crate::query::FindParams;

/// Repository trait for transaction persistence.
///
/// This trait is implemented by the db crate. Every write validates the
/// movement, applies its balance effect, and commits in one storage
/// transaction.
pub trait TransactionStore: Send + Sync {
    /// Records a transaction and applies its balance effect.
    fn create(
        &self,
        tenant_id: TenantId,
        input: CreateTransactionInput,
    ) -> impl Future<Output = Result<Transaction, LedgerError>> + Send;

    /// Replaces movement and metadata, moving the balance effect accordingly.
    fn update(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> impl Future<Output = Result<Transaction, LedgerError>> + Send;

    /// Deletes a transaction and reverses its balance effect.
    fn delete(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Finds a transaction by id.
    fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>, LedgerError>> + Send;

    /// Lists transactions matching the filter, newest first by default.
    fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<TransactionFilter, TransactionSortField>,
    ) -> impl Future<Output = Result<PageResponse<Transaction>, LedgerError>> + Send;

    /// Counts transactions matching the filter.
    fn count(
        &self,
        tenant_id: TenantId,
        filter: TransactionFilter,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;
}
