//! Business rule validation for ledger movements.
//!
//! All checks here are pure and run before any durable write.

use moneta_shared::types::Currency;
use rust_decimal::Decimal;

use super::error::{LedgerError, LedgerResult};
use super::types::{Movement, TransactionKind};

/// Currencies of the accounts a movement references, as loaded from storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountCurrencies {
    /// Currency of the origin account, if any.
    pub origin: Option<Currency>,
    /// Currency of the destination account, if any.
    pub destination: Option<Currency>,
}

/// Validates the shape and amounts of a movement.
///
/// # Errors
///
/// - `InvalidTransactionShape` when account references or exchange data do
///   not fit the kind, or origin equals destination
/// - `InvalidAmount` when the amount, destination amount, or rate is not
///   strictly positive
pub fn validate_movement(movement: &Movement) -> LedgerResult<()> {
    let kind = movement.kind;

    match (kind.requires_origin(), movement.origin_account_id.is_some()) {
        (true, false) => return Err(LedgerError::shape(kind, "origin account is required")),
        (false, true) => return Err(LedgerError::shape(kind, "origin account must be empty")),
        _ => {}
    }
    match (
        kind.requires_destination(),
        movement.destination_account_id.is_some(),
    ) {
        (true, false) => {
            return Err(LedgerError::shape(kind, "destination account is required"));
        }
        (false, true) => {
            return Err(LedgerError::shape(kind, "destination account must be empty"));
        }
        _ => {}
    }

    if movement.origin_account_id.is_some()
        && movement.origin_account_id == movement.destination_account_id
    {
        return Err(LedgerError::shape(
            kind,
            "origin and destination accounts must differ",
        ));
    }

    match (kind, movement.exchange) {
        (TransactionKind::Exchange, None) => {
            return Err(LedgerError::shape(
                kind,
                "exchange rate and destination amount are required",
            ));
        }
        (TransactionKind::Exchange, Some(exchange)) => {
            if exchange.destination_amount.currency() == movement.amount.currency() {
                return Err(LedgerError::shape(
                    kind,
                    "destination amount must be in a different currency",
                ));
            }
            if exchange.rate <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount(format!(
                    "exchange rate must be positive, got {}",
                    exchange.rate
                )));
            }
            if !exchange.destination_amount.is_positive() {
                return Err(LedgerError::InvalidAmount(format!(
                    "destination amount must be positive, got {}",
                    exchange.destination_amount
                )));
            }
        }
        (_, Some(_)) => {
            return Err(LedgerError::shape(kind, "exchange data is only allowed on exchanges"));
        }
        (_, None) => {}
    }

    if !movement.amount.is_positive() {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be positive, got {}",
            movement.amount
        )));
    }

    Ok(())
}

/// Validates that the referenced accounts hold the currencies flowing through them.
///
/// The origin account must hold `amount.currency`; the destination account
/// must hold the credited currency (the destination amount's for exchanges).
///
/// # Errors
///
/// Returns `CurrencyMismatch` naming the account's currency as expected.
pub fn validate_account_currencies(
    movement: &Movement,
    accounts: AccountCurrencies,
) -> LedgerResult<()> {
    if let Some(expected) = accounts.origin {
        let found = movement.amount.currency();
        if expected != found {
            return Err(LedgerError::CurrencyMismatch { expected, found });
        }
    }
    if let Some(expected) = accounts.destination {
        let found = movement.destination_currency();
        if expected != found {
            return Err(LedgerError::CurrencyMismatch { expected, found });
        }
    }
    Ok(())
}
