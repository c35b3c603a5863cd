//! Persistence seam for money accounts.

use std::future::Future;

use moneta_shared::types::{Money, MoneyAccountId, PageResponse, TenantId};

use super::types::{
    CreateMoneyAccountInput, MoneyAccount, MoneyAccountFilter, MoneyAccountSortField,
    UpdateMoneyAccountInput,
};
use crate::ledger::LedgerError;
use crate::query::FindParams;

/// Repository trait for money account persistence.
pub trait MoneyAccountStore: Send + Sync {
    /// Opens an account, recording a positive opening balance as a deposit.
    fn create(
        &self,
        tenant_id: TenantId,
        input: CreateMoneyAccountInput,
    ) -> impl Future<Output = Result<MoneyAccount, LedgerError>> + Send;

    /// Updates name, account number, and description.
    fn update(
        &self,
        tenant_id: TenantId,
        id: MoneyAccountId,
        input: UpdateMoneyAccountInput,
    ) -> impl Future<Output = Result<MoneyAccount, LedgerError>> + Send;

    /// Deletes the account and every transaction referencing it.
    ///
    /// Payments and expenses over those transactions go with them, debt
    /// settlement links are cleared, and counterpart accounts are
    /// recomputed. Irrecoverable.
    fn delete(
        &self,
        tenant_id: TenantId,
        id: MoneyAccountId,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Finds an account by id.
    fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: MoneyAccountId,
    ) -> impl Future<Output = Result<Option<MoneyAccount>, LedgerError>> + Send;

    /// Lists every account of the tenant, by name.
    fn find_all(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<MoneyAccount>, LedgerError>> + Send;

    /// Lists accounts matching the filter.
    fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<MoneyAccountFilter, MoneyAccountSortField>,
    ) -> impl Future<Output = Result<PageResponse<MoneyAccount>, LedgerError>> + Send;

    /// Counts accounts matching the filter.
    fn count(
        &self,
        tenant_id: TenantId,
        filter: MoneyAccountFilter,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Recomputes the cached balance from the full history and returns it.
    ///
    /// Idempotent. On failure the previous cached value is kept.
    fn recalculate_balance(
        &self,
        tenant_id: TenantId,
        id: MoneyAccountId,
    ) -> impl Future<Output = Result<Money, LedgerError>> + Send;
}
