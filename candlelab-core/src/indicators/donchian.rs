//! Donchian Channel — highest high and lowest low over a window.
//!
//! Window includes the current bar. Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    pub fn upper(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band: DonchianBand::Upper,
            name: format!("donchian_upper_{period}"),
        }
    }

    pub fn lower(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band: DonchianBand::Lower,
            name: format!("donchian_lower_{period}"),
        }
    }
}

/// Highest high of a slice, `None` when empty.
pub fn highest_high(bars: &[Bar]) -> Option<Decimal> {
    bars.iter().map(|b| b.high).max()
}

/// Lowest low of a slice, `None` when empty.
pub fn lowest_low(bars: &[Bar]) -> Option<Decimal> {
    bars.iter().map(|b| b.low).min()
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        let n = bars.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }
        for i in (self.period - 1)..n {
            let window = &bars[(i + 1 - self.period)..=i];
            result[i] = match self.band {
                DonchianBand::Upper => highest_high(window),
                DonchianBand::Lower => lowest_low(window),
            };
        }
        result
    }
}
