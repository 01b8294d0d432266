//! Risk-based position sizing.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use thiserror::Error;

/// Largest position in units. With prices capped at `MAX_PRICE`, P&L and
/// notional stay inside the `Decimal` range.
pub const MAX_POSITION_SIZE: Decimal = dec!(1000000000000000);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    #[error("balance must be positive to size a position, got {0}")]
    NonPositiveBalance(Decimal),
    #[error("stop distance is zero (entry={entry}, stop={stop})")]
    ZeroStopDistance { entry: Decimal, stop: Decimal },
    #[error("position size truncates to {0}")]
    NonPositiveSize(Decimal),
    #[error("arithmetic overflow while sizing")]
    Overflow,
    #[error("position size {0} exceeds the supported maximum")]
    TooLarge(Decimal),
}

/// `balance × risk_pct / 100 / |entry − stop|`, truncated toward zero to
/// `decimals` places. A result that is not strictly positive is an error.
pub fn position_size(
    balance: Decimal,
    risk_pct: Decimal,
    entry: Decimal,
    stop: Decimal,
    decimals: u32,
) -> Result<Decimal, SizingError> {
    if balance <= Decimal::ZERO {
        return Err(SizingError::NonPositiveBalance(balance));
    }
    let distance = (entry - stop).abs();
    if distance.is_zero() {
        return Err(SizingError::ZeroStopDistance { entry, stop });
    }
    let risk_amount = balance
        .checked_mul(risk_pct)
        .and_then(|r| r.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(SizingError::Overflow)?;
    let size = risk_amount
        .checked_div(distance)
        .ok_or(SizingError::Overflow)?
        .round_dp_with_strategy(decimals, RoundingStrategy::ToZero);
    if size <= Decimal::ZERO {
        return Err(SizingError::NonPositiveSize(size));
    }
    if size > MAX_POSITION_SIZE {
        return Err(SizingError::TooLarge(size));
    }
    Ok(size)
}
