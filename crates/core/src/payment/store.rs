//! Persistence seam for payments.

use std::future::Future;

use moneta_shared::types::{FileId, PageResponse, PaymentId, TenantId};

use super::types::{
    CreatePaymentInput, Payment, PaymentFilter, PaymentSortField, UpdatePaymentInput,
};
use crate::attachment::AttachmentSet;
use crate::ledger::LedgerError;
use crate::query::FindParams;

/// Repository trait for payment persistence.
///
/// Create, update, and delete write the deposit, the payment row, its
/// attachment links, and the balance effect in one storage transaction.
pub trait PaymentStore: Send + Sync {
    /// Records the deposit and the payment.
    fn create(
        &self,
        tenant_id: TenantId,
        input: CreatePaymentInput,
    ) -> impl Future<Output = Result<Payment, LedgerError>> + Send;

    /// Rewrites the deposit, then the payment fields and attachments.
    fn update(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        input: UpdatePaymentInput,
    ) -> impl Future<Output = Result<Payment, LedgerError>> + Send;

    /// Deletes the payment, its attachment links, and its deposit.
    fn delete(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Finds a payment by id.
    fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> impl Future<Output = Result<Option<Payment>, LedgerError>> + Send;

    /// Lists payments matching the filter.
    fn find_paginated(
        &self,
        tenant_id: TenantId,
        params: FindParams<PaymentFilter, PaymentSortField>,
    ) -> impl Future<Output = Result<PageResponse<Payment>, LedgerError>> + Send;

    /// Counts payments matching the filter.
    fn count(
        &self,
        tenant_id: TenantId,
        filter: PaymentFilter,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Attaches a file; returns false if it was already attached.
    fn attach_file(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        file_id: FileId,
    ) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    /// Detaches a file; returns false if it was not attached.
    fn detach_file(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        file_id: FileId,
    ) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    /// Lists attached files in attachment order.
    fn list_attachments(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> impl Future<Output = Result<AttachmentSet, LedgerError>> + Send;
}
