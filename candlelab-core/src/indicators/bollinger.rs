//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use super::{closes, population_std_dev, Indicator};
use crate::domain::Bar;
use rust_decimal::Decimal;

/// Which band of the Bollinger Bands the `Indicator` impl reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

/// All three bands at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandValues {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

impl BandValues {
    pub fn width(&self) -> Decimal {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: Decimal,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: Decimal, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn middle(period: usize, multiplier: Decimal) -> Self {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    /// Compute all three bands per bar.
    pub fn bands(&self, bars: &[Bar]) -> Vec<Option<BandValues>> {
        let values = closes(bars);
        let n = values.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }
        let divisor = Decimal::from(self.period);
        for i in (self.period - 1)..n {
            let window = &values[(i + 1 - self.period)..=i];
            let middle = window.iter().copied().sum::<Decimal>() / divisor;
            let Some(sd) = population_std_dev(window) else {
                continue;
            };
            result[i] = Some(BandValues {
                upper: middle + self.multiplier * sd,
                middle,
                lower: middle - self.multiplier * sd,
            });
        }
        result
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        self.bands(bars)
            .into_iter()
            .map(|v| {
                v.map(|b| match self.band {
                    BollingerBand::Upper => b.upper,
                    BollingerBand::Middle => b.middle,
                    BollingerBand::Lower => b.lower,
                })
            })
            .collect()
    }
}
