//! Persistence seam for debts.

use std::future::Future;

use moneta_shared::types::{CounterpartyId, DebtId, Money, PageResponse, TenantId, TransactionId};

use super::summary::CounterpartyDebtSummary;
use super::types::{CreateDebtInput, Debt, DebtFilter, DebtSortField, UpdateDebtInput};
use crate::ledger::LedgerError;
use crate::query::FindParams;

/// Repository trait for debt persistence.
///
/// Lifecycle operations load the debt under a row lock, apply the domain
/// rule, and persist the result in one storage transaction.
pub trait DebtStore: Send + Sync {
    /// Records an open debt with the full amount outstanding.
    fn create(
        &self,
        tenant_id: TenantId,
        input: CreateDebtInput,
    ) -> impl Future<Output = Result<Debt, LedgerError>> + Send;

    /// Updates description, due date, and counterparty.
    fn update(
        &self,
        tenant_id: TenantId,
        id: DebtId,
        input: UpdateDebtInput,
    ) -> impl Future<Output = Result<Debt, LedgerError>> + Send;

    /// Deletes a debt. Its settlement transaction is left untouched.
    fn delete(
        &self,
        tenant_id: TenantId,
        id: DebtId,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Finds a debt by id.
    fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: DebtId,
    ) -> impl Future<Output = Result<Option<Debt>, LedgerError>> + Send;

    /// Lists every debt with a counterparty, newest first.
    fn find_by_counterparty(
        &self,
        tenant_id: TenantId,
        counterparty_id: CounterpartyId,
    ) -> impl Future<Output = Result<Vec<Debt>, LedgerError>> + Send;

    /// Lists debts matching the filter.
    fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<DebtFilter, DebtSortField>,
    ) -> impl Future<Output = Result<PageResponse<Debt>, LedgerError>> + Send;

    /// Counts debts matching the filter.
    fn count(
        &self,
        tenant_id: TenantId,
        filter: DebtFilter,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Settles part of the outstanding amount.
    fn record_partial_settlement(
        &self,
        tenant_id: TenantId,
        id: DebtId,
        amount: Money,
    ) -> impl Future<Output = Result<Debt, LedgerError>> + Send;

    /// Links a settlement transaction and applies its amount.
    fn settle_via_transaction(
        &self,
        tenant_id: TenantId,
        id: DebtId,
        transaction_id: TransactionId,
    ) -> impl Future<Output = Result<Debt, LedgerError>> + Send;

    /// Cancels an open or partially settled debt.
    fn cancel(
        &self,
        tenant_id: TenantId,
        id: DebtId,
    ) -> impl Future<Output = Result<Debt, LedgerError>> + Send;

    /// Aggregates debts per counterparty and currency.
    fn counterparty_summaries(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<CounterpartyDebtSummary>, LedgerError>> + Send;
}
