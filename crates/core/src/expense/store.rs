//! Persistence seam for expenses.

use std::future::Future;

use moneta_shared::types::{ExpenseId, FileId, PageResponse, TenantId};

use super::types::{
    CreateExpenseInput, Expense, ExpenseFilter, ExpenseSortField, UpdateExpenseInput,
};
use crate::attachment::AttachmentSet;
use crate::ledger::LedgerError;
use crate::query::FindParams;

/// Repository trait for expense persistence.
///
/// Create, update, and delete write the withdrawal, the expense row, its
/// attachment links, and the balance effect in one storage transaction.
pub trait ExpenseStore: Send + Sync {
    /// Records the withdrawal and the expense.
    fn create(
        &self,
        tenant_id: TenantId,
        input: CreateExpenseInput,
    ) -> impl Future<Output = Result<Expense, LedgerError>> + Send;

    /// Rewrites the withdrawal, then the expense fields and attachments.
    fn update(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
        input: UpdateExpenseInput,
    ) -> impl Future<Output = Result<Expense, LedgerError>> + Send;

    /// Deletes the expense, its attachment links, and its withdrawal.
    fn delete(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Finds an expense by id.
    fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
    ) -> impl Future<Output = Result<Option<Expense>, LedgerError>> + Send;

    /// Lists expenses matching the filter.
    fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<ExpenseFilter, ExpenseSortField>,
    ) -> impl Future<Output = Result<PageResponse<Expense>, LedgerError>> + Send;

    /// Counts expenses matching the filter.
    fn count(
        &self,
        tenant_id: TenantId,
        filter: ExpenseFilter,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Attaches a file; returns false if it was already attached.
    fn attach_file(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
        file_id: FileId,
    ) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    /// Detaches a file; returns false if it was not attached.
    fn detach_file(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
        file_id: FileId,
    ) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    /// Lists attached files in attachment order.
    fn list_attachments(
        &self,
        tenant_id: TenantId,
        id: ExpenseId,
    ) -> impl Future<Output = Result<AttachmentSet, LedgerError>> + Send;
}
