//! Indicator library — pure functions over bar history.
//!
//! Every indicator returns one `Option<Decimal>` per input bar. `None` means
//! "not yet available" (inside the lookback, or undefined for that bar) and is
//! never conflated with a computed zero. Values at bar `t` depend only on bars
//! `0..=t`, so computing on a prefix yields exactly the prefix of the full result.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod donchian;
pub mod ema;
pub mod keltner;
pub mod pivots;
pub mod rsi;
pub mod sma;
pub mod swing;
pub mod vwap;

pub use adx::{Adx, DirectionalIndex};
pub use atr::{true_range, wilder_smooth, Atr};
pub use bollinger::{BandValues, Bollinger, BollingerBand};
pub use donchian::{highest_high, lowest_low, Donchian, DonchianBand};
pub use ema::{ema_of_series, Ema};
pub use keltner::{Keltner, KeltnerBand};
pub use pivots::{daily_pivots, PivotLevels};
pub use rsi::Rsi;
pub use sma::{sma_of_series, Sma};
pub use swing::{classify_swing, swing_points, swings_of, SwingKind, SwingPoint, SwingStatus};
pub use vwap::{SessionReset, Vwap};

use crate::domain::Bar;
use rust_decimal::{Decimal, MathematicalOps};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: need {needed} bars, have {available}")]
    InsufficientData { needed: usize, available: usize },
    #[error("value undefined at bar {index}")]
    Undefined { index: usize },
    #[error("arithmetic overflow at bar {index}")]
    Overflow { index: usize },
}

/// Trait for single-series indicators.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Index of the first bar that can carry a value on clean data.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole slice; output length equals `bars.len()`.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>>;

    /// Value at the last bar, or an explicit reason it is not available.
    fn latest(&self, bars: &[Bar]) -> Result<Decimal, IndicatorError> {
        let needed = self.lookback() + 1;
        if bars.len() < needed {
            return Err(IndicatorError::InsufficientData {
                needed,
                available: bars.len(),
            });
        }
        self.compute(bars)
            .last()
            .copied()
            .flatten()
            .ok_or(IndicatorError::Undefined {
                index: bars.len() - 1,
            })
    }
}

/// Close prices of a slice.
pub fn closes(bars: &[Bar]) -> Vec<Decimal> {
    bars.iter().map(|b| b.close).collect()
}

/// `None` for an empty slice or a sum outside the `Decimal` range.
pub(crate) fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum = checked_sum(values.iter().copied())?;
    Some(sum / Decimal::from(values.len()))
}

/// Population standard deviation (divide by N).
pub(crate) fn population_std_dev(values: &[Decimal]) -> Option<Decimal> {
    let m = mean(values)?;
    let mut squares = values.iter().map(|v| (*v - m).checked_mul(*v - m));
    let variance = squares
        .try_fold(Decimal::ZERO, |acc, sq| acc.checked_add(sq?))?
        / Decimal::from(values.len());
    variance.sqrt()
}

pub(crate) fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open, close) + 1,
/// low = min(open, close) - 1, volume = 1000, one bar per hour.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::prelude::FromPrimitive;

    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + Duration::hours(i as i64),
                open: Decimal::from_f64(open).unwrap(),
                high: Decimal::from_f64(open.max(close) + 1.0).unwrap(),
                low: Decimal::from_f64(open.min(close) - 1.0).unwrap(),
                close: Decimal::from_f64(close).unwrap(),
                volume: Decimal::from(1000),
            }
        })
        .collect()
}

/// Build bars from explicit (open, high, low, close) tuples, one per hour.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::prelude::FromPrimitive;

    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + Duration::hours(i as i64),
            open: Decimal::from_f64(open).unwrap(),
            high: Decimal::from_f64(high).unwrap(),
            low: Decimal::from_f64(low).unwrap(),
            close: Decimal::from_f64(close).unwrap(),
            volume: Decimal::from(1000),
        })
        .collect()
}

/// Assert a decimal is within `epsilon` of an expected float.
#[cfg(test)]
pub fn assert_approx(actual: Decimal, expected: f64, epsilon: f64) {
    use rust_decimal::prelude::ToPrimitive;
    let a = actual.to_f64().unwrap();
    assert!(
        (a - expected).abs() < epsilon,
        "assert_approx failed: actual={a}, expected={expected}, epsilon={epsilon}"
    );
}
