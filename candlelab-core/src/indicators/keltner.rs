//! Keltner Channel — EMA of close +/- ATR multiplier.
//!
//! Lookback: max(ema_period - 1, atr_period).

use super::bollinger::BandValues;
use super::{closes, ema_of_series, Atr, Indicator};
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeltnerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Keltner {
    ema_period: usize,
    atr_period: usize,
    multiplier: Decimal,
    band: KeltnerBand,
    name: String,
}

impl Keltner {
    pub fn new(
        ema_period: usize,
        atr_period: usize,
        multiplier: Decimal,
        band: KeltnerBand,
    ) -> Self {
        assert!(ema_period >= 1, "Keltner EMA period must be >= 1");
        assert!(atr_period >= 1, "Keltner ATR period must be >= 1");
        Self {
            ema_period,
            atr_period,
            multiplier,
            band,
            name: format!("keltner_{ema_period}_{atr_period}_{multiplier}"),
        }
    }

    pub fn middle(ema_period: usize, atr_period: usize, multiplier: Decimal) -> Self {
        Self::new(ema_period, atr_period, multiplier, KeltnerBand::Middle)
    }

    pub fn bands(&self, bars: &[Bar]) -> Vec<Option<BandValues>> {
        let ema = ema_of_series(&closes(bars), self.ema_period);
        let atr = Atr::new(self.atr_period).compute(bars);
        ema.into_iter()
            .zip(atr)
            .map(|(mid, atr)| {
                let (middle, atr) = (mid?, atr?);
                Some(BandValues {
                    upper: middle + self.multiplier * atr,
                    middle,
                    lower: middle - self.multiplier * atr,
                })
            })
            .collect()
    }
}

impl Indicator for Keltner {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.ema_period.saturating_sub(1).max(self.atr_period)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        self.bands(bars)
            .into_iter()
            .map(|v| {
                v.map(|b| match self.band {
                    KeltnerBand::Upper => b.upper,
                    KeltnerBand::Middle => b.middle,
                    KeltnerBand::Lower => b.lower,
                })
            })
            .collect()
    }
}
