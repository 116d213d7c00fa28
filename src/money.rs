//! Money

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::iso::{self, Currency};
use thiserror::Error;

/// Errors raised while interpreting monetary input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyInputError {
    /// The currency code is not one we accept payments in.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Round an amount to two decimal places, halves away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Resolve an ISO-4217 currency code.
///
/// # Errors
///
/// Returns [`MoneyInputError::UnknownCurrency`] for codes outside the supported set.
pub fn parse_currency(code: &str) -> Result<&'static Currency, MoneyInputError> {
    let currency = match code.trim().to_ascii_uppercase().as_str() {
        "RUB" => iso::RUB,
        "KZT" => iso::KZT,
        "USD" => iso::USD,
        "EUR" => iso::EUR,
        "GBP" => iso::GBP,
        other => return Err(MoneyInputError::UnknownCurrency(other.to_string())),
    };

    Ok(currency)
}
