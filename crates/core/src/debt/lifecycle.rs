//! Debt lifecycle rules.
//!
//! Every operation validates first and mutates only on success, so a failed
//! call leaves the debt exactly as it was.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use moneta_shared::types::{DebtId, Money, TenantId};

use super::types::{CreateDebtInput, Debt, DebtStatus};
use crate::ledger::{EntityKind, LedgerError, LedgerResult, Transaction};

impl Debt {
    /// Opens a debt with the full amount outstanding.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` unless the amount is positive.
    pub fn open(
        tenant_id: TenantId,
        input: CreateDebtInput,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        input.validate()?;
        Ok(Self {
            id: DebtId::new(),
            tenant_id,
            debt_type: input.debt_type,
            status: DebtStatus::Open,
            counterparty_id: input.counterparty_id,
            original_amount: input.original_amount,
            outstanding_amount: input.original_amount,
            description: input.description,
            due_date: input.due_date,
            settlement_transaction_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks the amount and status invariants.
    ///
    /// # Errors
    ///
    /// - `CurrencyMismatch` if outstanding and original currencies differ
    /// - `InvalidAmount` if outstanding is negative or exceeds the original
    /// - `InvalidDebtTransition` if `Settled` with a non-zero outstanding
    pub fn validate(&self) -> LedgerResult<()> {
        self.original_amount
            .ensure_same_currency(&self.outstanding_amount)?;
        if self.outstanding_amount.is_negative() {
            return Err(LedgerError::InvalidAmount(format!(
                "outstanding amount cannot be negative, got {}",
                self.outstanding_amount
            )));
        }
        if self.outstanding_amount.try_cmp(&self.original_amount)? == Ordering::Greater {
            return Err(LedgerError::InvalidAmount(format!(
                "outstanding amount {} exceeds original {}",
                self.outstanding_amount, self.original_amount
            )));
        }
        if self.status == DebtStatus::Settled && !self.outstanding_amount.is_zero() {
            return Err(self.transition_error("keep settled"));
        }
        Ok(())
    }

    /// Settles part of the outstanding amount.
    ///
    /// Settling exactly the outstanding amount moves the debt to `Settled`.
    ///
    /// # Errors
    ///
    /// - `InvalidDebtTransition` in a terminal status
    /// - `InvalidAmount` for a non-positive amount
    /// - `CurrencyMismatch` for a foreign currency
    /// - `OverSettlement` if the amount exceeds the outstanding amount
    pub fn record_partial_settlement(
        &mut self,
        amount: Money,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        self.ensure_active("settle")?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "settlement amount must be positive, got {amount}"
            )));
        }
        self.outstanding_amount.ensure_same_currency(&amount)?;
        if amount.try_cmp(&self.outstanding_amount)? == Ordering::Greater {
            return Err(LedgerError::OverSettlement {
                debt_id: self.id,
                requested: amount,
                outstanding: self.outstanding_amount,
            });
        }

        let outstanding = self.outstanding_amount.checked_sub(amount)?;
        self.apply_outstanding(outstanding, now);
        Ok(())
    }

    /// Links a settlement transaction and applies its amount.
    ///
    /// The settled amount is the credited amount of the movement (the
    /// destination amount for exchanges). If it covers the outstanding amount
    /// the debt becomes `Settled` with zero outstanding.
    ///
    /// # Errors
    ///
    /// - `InvalidDebtTransition` in a terminal status
    /// - `NotFound` if the transaction belongs to another tenant
    /// - `SettlementAlreadyApplied` if the transaction is already linked
    /// - `CurrencyMismatch` if the settled amount is in a foreign currency
    pub fn settle_via_transaction(
        &mut self,
        transaction: &Transaction,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        self.ensure_active("settle")?;
        if transaction.tenant_id != self.tenant_id {
            return Err(LedgerError::not_found(EntityKind::Transaction, transaction.id));
        }
        if self.settlement_transaction_id == Some(transaction.id) {
            return Err(LedgerError::SettlementAlreadyApplied {
                transaction_id: transaction.id,
                debt_id: self.id,
            });
        }
        let settled = transaction.movement.credited_amount();
        self.outstanding_amount.ensure_same_currency(&settled)?;

        let outstanding = if settled.try_cmp(&self.outstanding_amount)? == Ordering::Less {
            self.outstanding_amount.checked_sub(settled)?
        } else {
            Money::zero(self.outstanding_amount.currency())
        };

        self.settlement_transaction_id = Some(transaction.id);
        self.apply_outstanding(outstanding, now);
        Ok(())
    }

    /// Cancels the debt.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDebtTransition` in a terminal status.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> LedgerResult<()> {
        self.ensure_active("cancel")?;
        self.status = DebtStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Moves the debt to `status` if the transition is allowed.
    ///
    /// Setting the current status again is a no-op. `Settled` requires a zero
    /// outstanding amount and `Open` requires nothing to have been settled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDebtTransition` for a disallowed transition.
    pub fn update_status(&mut self, status: DebtStatus, now: DateTime<Utc>) -> LedgerResult<()> {
        if status == self.status {
            return Ok(());
        }
        self.ensure_active("change status of")?;

        let allowed = match status {
            DebtStatus::Open => self.outstanding_amount == self.original_amount,
            DebtStatus::PartiallySettled => {
                !self.outstanding_amount.is_zero()
                    && self.outstanding_amount != self.original_amount
            }
            DebtStatus::Settled => self.outstanding_amount.is_zero(),
            DebtStatus::Cancelled => true,
        };
        if !allowed {
            return Err(self.transition_error("change status of"));
        }

        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Lowers the outstanding amount.
    ///
    /// # Errors
    ///
    /// - `InvalidDebtTransition` in a terminal status
    /// - `CurrencyMismatch` for a foreign currency
    /// - `InvalidAmount` if negative or greater than the current outstanding
    pub fn update_outstanding(
        &mut self,
        outstanding: Money,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        self.ensure_active("update outstanding of")?;
        self.check_outstanding(outstanding)?;
        if outstanding.try_cmp(&self.outstanding_amount)? == Ordering::Greater {
            return Err(LedgerError::InvalidAmount(format!(
                "outstanding amount cannot increase from {} to {outstanding}",
                self.outstanding_amount
            )));
        }
        self.apply_outstanding(outstanding, now);
        Ok(())
    }

    /// Corrects the outstanding amount, allowing increases up to the original.
    ///
    /// # Errors
    ///
    /// - `InvalidDebtTransition` in a terminal status
    /// - `CurrencyMismatch` for a foreign currency
    /// - `InvalidAmount` if negative or greater than the original amount
    pub fn correct_outstanding(
        &mut self,
        outstanding: Money,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        self.ensure_active("correct")?;
        self.check_outstanding(outstanding)?;
        if outstanding.try_cmp(&self.original_amount)? == Ordering::Greater {
            return Err(LedgerError::InvalidAmount(format!(
                "outstanding amount {outstanding} exceeds original {}",
                self.original_amount
            )));
        }
        self.apply_outstanding(outstanding, now);
        Ok(())
    }

    fn check_outstanding(&self, outstanding: Money) -> LedgerResult<()> {
        self.original_amount.ensure_same_currency(&outstanding)?;
        if outstanding.is_negative() {
            return Err(LedgerError::InvalidAmount(format!(
                "outstanding amount cannot be negative, got {outstanding}"
            )));
        }
        Ok(())
    }

    fn apply_outstanding(&mut self, outstanding: Money, now: DateTime<Utc>) {
        self.status = if outstanding.is_zero() {
            DebtStatus::Settled
        } else if outstanding == self.original_amount {
            DebtStatus::Open
        } else {
            DebtStatus::PartiallySettled
        };
        self.outstanding_amount = outstanding;
        self.updated_at = now;
    }

    fn ensure_active(&self, action: &'static str) -> LedgerResult<()> {
        if self.status.is_terminal() {
            Err(self.transition_error(action))
        } else {
            Ok(())
        }
    }

    fn transition_error(&self, action: &'static str) -> LedgerError {
        LedgerError::InvalidDebtTransition {
            debt_id: self.id,
            from: self.status,
            action,
        }
    }
}
