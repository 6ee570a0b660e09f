//! Conversion engine
//!
//! Pure arithmetic between the home currency and a foreign currency.
//! Rates are quoted as units of foreign currency per one unit of home currency.
//! Rounding for display is left to the caller.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    #[error("rate is zero")]
    ZeroRate,

    #[error("amount is out of range")]
    Overflow,
}

/// Convert an amount of home currency into the foreign currency.
pub fn to_foreign(amount: Decimal, rate: Decimal) -> Result<Decimal, ConversionError> {
    amount.checked_mul(rate).ok_or(ConversionError::Overflow)
}

/// Convert an amount of foreign currency back into the home currency.
pub fn to_home(amount: Decimal, rate: Decimal) -> Result<Decimal, ConversionError> {
    if rate.is_zero() {
        return Err(ConversionError::ZeroRate);
    }

    let inverse = Decimal::ONE
        .checked_div(rate)
        .ok_or(ConversionError::Overflow)?;

    amount.checked_mul(inverse).ok_or(ConversionError::Overflow)
}
