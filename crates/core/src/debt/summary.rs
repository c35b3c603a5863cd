//! Per-counterparty debt aggregation.

use std::collections::BTreeMap;

use moneta_shared::types::{CounterpartyId, Currency, Money};
use serde::{Deserialize, Serialize};

use super::types::{Debt, DebtStatus, DebtType};
use crate::ledger::LedgerResult;

/// Debt totals for one counterparty in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyDebtSummary {
    /// The counterparty.
    pub counterparty_id: CounterpartyId,
    /// Currency of every amount below.
    pub currency: Currency,
    /// Sum of original receivable amounts.
    pub total_receivable: Money,
    /// Sum of outstanding receivable amounts.
    pub outstanding_receivable: Money,
    /// Sum of original payable amounts.
    pub total_payable: Money,
    /// Sum of outstanding payable amounts.
    pub outstanding_payable: Money,
    /// Outstanding receivable minus outstanding payable.
    pub net_outstanding: Money,
    /// Number of debts aggregated.
    pub debt_count: u64,
}

impl CounterpartyDebtSummary {
    fn empty(counterparty_id: CounterpartyId, currency: Currency) -> Self {
        Self {
            counterparty_id,
            currency,
            total_receivable: Money::zero(currency),
            outstanding_receivable: Money::zero(currency),
            total_payable: Money::zero(currency),
            outstanding_payable: Money::zero(currency),
            net_outstanding: Money::zero(currency),
            debt_count: 0,
        }
    }

    fn include(&mut self, debt: &Debt) -> LedgerResult<()> {
        // Cancelled debts count towards totals but owe nothing.
        let outstanding = if debt.status == DebtStatus::Cancelled {
            Money::zero(self.currency)
        } else {
            debt.outstanding_amount
        };

        match debt.debt_type {
            DebtType::Receivable => {
                self.total_receivable = self.total_receivable.add(debt.original_amount)?;
                self.outstanding_receivable = self.outstanding_receivable.add(outstanding)?;
            }
            DebtType::Payable => {
                self.total_payable = self.total_payable.add(debt.original_amount)?;
                self.outstanding_payable = self.outstanding_payable.add(outstanding)?;
            }
        }
        self.net_outstanding = self
            .outstanding_receivable
            .checked_sub(self.outstanding_payable)?;
        self.debt_count += 1;
        Ok(())
    }
}

/// Aggregates debts per counterparty and currency.
///
/// Amounts in different currencies are never mixed: a counterparty with
/// debts in two currencies yields two summaries. Output is ordered by
/// counterparty, then currency.
///
/// # Errors
///
/// Returns `AmountOverflow` if a sum leaves the `i64` range.
pub fn summarize_by_counterparty<'a>(
    debts: impl IntoIterator<Item = &'a Debt>,
) -> LedgerResult<Vec<CounterpartyDebtSummary>> {
    let mut groups: BTreeMap<(CounterpartyId, Currency), CounterpartyDebtSummary> = BTreeMap::new();
    for debt in debts {
        let currency = debt.original_amount.currency();
        groups
            .entry((debt.counterparty_id, currency))
            .or_insert_with(|| CounterpartyDebtSummary::empty(debt.counterparty_id, currency))
            .include(debt)?;
    }
    Ok(groups.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debt::types::CreateDebtInput;
    use chrono::Utc;
    use moneta_shared::types::TenantId;

    fn debt(counterparty_id: CounterpartyId, debt_type: DebtType, amount: Money) -> Debt {
        Debt::open(
            TenantId::new(),
            CreateDebtInput {
                debt_type,
                counterparty_id,
                original_amount: amount,
                description: String::new(),
                due_date: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_summary_nets_receivables_against_payables() {
        let acme = CounterpartyId::new();
        let mut paid = debt(acme, DebtType::Receivable, Money::new(50_000, Currency::Usd));
        paid.record_partial_settlement(Money::new(20_000, Currency::Usd), Utc::now())
            .unwrap();
        let debts = [
            paid,
            debt(acme, DebtType::Payable, Money::new(10_000, Currency::Usd)),
        ];

        let summaries = summarize_by_counterparty(&debts).unwrap();
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.total_receivable, Money::new(50_000, Currency::Usd));
        assert_eq!(summary.outstanding_receivable, Money::new(30_000, Currency::Usd));
        assert_eq!(summary.total_payable, Money::new(10_000, Currency::Usd));
        assert_eq!(summary.net_outstanding, Money::new(20_000, Currency::Usd));
        assert_eq!(summary.debt_count, 2);
    }

    #[test]
    fn test_summary_never_mixes_currencies() {
        let acme = CounterpartyId::new();
        let debts = [
            debt(acme, DebtType::Receivable, Money::new(100, Currency::Usd)),
            debt(acme, DebtType::Receivable, Money::new(100, Currency::Eur)),
        ];
        let summaries = summarize_by_counterparty(&debts).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.debt_count == 1));
        assert!(summaries.iter().all(|s| s.total_receivable.currency() == s.currency));
    }

    #[test]
    fn test_cancelled_debt_owes_nothing() {
        let acme = CounterpartyId::new();
        let mut cancelled = debt(acme, DebtType::Payable, Money::new(700, Currency::Usd));
        cancelled.cancel(Utc::now()).unwrap();

        let summaries = summarize_by_counterparty([&cancelled]).unwrap();
        assert_eq!(summaries[0].total_payable, Money::new(700, Currency::Usd));
        assert!(summaries[0].outstanding_payable.is_zero());
        assert!(summaries[0].net_outstanding.is_zero());
    }
}
