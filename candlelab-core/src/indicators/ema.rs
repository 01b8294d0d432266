//! Exponential Moving Average (EMA).
//!
//! Seed: SMA of the first `period` values.
//! Then: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Lookback: period - 1.

use super::{closes, Indicator};
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// EMA over an arbitrary series, seeded with the SMA of the first `period` values.
pub fn ema_of_series(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    let seed: Decimal = values[..period].iter().copied().sum::<Decimal>() / Decimal::from(period);
    result[period - 1] = Some(seed);

    let alpha = Decimal::TWO / Decimal::from(period + 1);
    let mut prev = seed;
    for i in period..n {
        let value = alpha * values[i] + (Decimal::ONE - alpha) * prev;
        result[i] = Some(value);
        prev = value;
    }
    result
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        ema_of_series(&closes(bars), self.period)
    }
}
