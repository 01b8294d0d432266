//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (alpha = 1/period).
//! Lookback: period (TR needs a previous close, then `period` values to seed).

use super::Indicator;
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// True Range series. TR[0] is `None`: without a previous close it would only
/// be the bar range, which is not a true range.
pub fn true_range(bars: &[Bar]) -> Vec<Option<Decimal>> {
    let mut tr = vec![None; bars.len()];
    for i in 1..bars.len() {
        let bar = &bars[i];
        let pc = bars[i - 1].close;
        let range = bar.high - bar.low;
        tr[i] = Some(range.max((bar.high - pc).abs()).max((bar.low - pc).abs()));
    }
    tr
}

/// Wilder smoothing. Seed: mean of the first run of `period` consecutive
/// defined values. After the seed, undefined inputs carry the previous value
/// forward without updating it.
pub fn wilder_smooth(values: &[Option<Decimal>], period: usize) -> Vec<Option<Decimal>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    let mut run = 0usize;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_some() {
            run += 1;
            if run == period {
                seed_end = Some(i);
                break;
            }
        } else {
            run = 0;
        }
    }
    let Some(seed_end) = seed_end else {
        return result;
    };

    let divisor = Decimal::from(period);
    let seed: Decimal = values[(seed_end + 1 - period)..=seed_end]
        .iter()
        .flatten()
        .copied()
        .sum::<Decimal>()
        / divisor;
    result[seed_end] = Some(seed);

    let mut prev = seed;
    for i in (seed_end + 1)..n {
        if let Some(v) = values[i] {
            prev += (v - prev) / divisor;
        }
        result[i] = Some(prev);
    }
    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        wilder_smooth(&true_range(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, make_ohlc_bars};
    use rust_decimal_macros::dec;

    #[test]
    fn true_range_basic() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // max(8, 6, 2) = 8
            (106.0, 107.0, 98.0, 99.0),   // max(9, 1, 8) = 9
        ]);
        let tr = true_range(&bars);
        assert_eq!(tr[0], None);
        assert_eq!(tr[1], Some(dec!(8)));
        assert_eq!(tr[2], Some(dec!(9)));
    }

    #[test]
    fn true_range_gap_up() {
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // max(7, 15, 8) = 15
        ]);
        assert_eq!(true_range(&bars)[1], Some(dec!(15)));
    }

    #[test]
    fn atr_period_3() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // TR 8
            (106.0, 107.0, 98.0, 99.0),   // TR 9
            (99.0, 103.0, 97.0, 101.0),   // TR 6
            (101.0, 104.0, 100.0, 103.0), // TR 4
        ]);
        let atr = Atr::new(3).compute(&bars);
        assert_eq!(atr[2], None);
        assert_eq!(atr[3], Some(dec!(23) / dec!(3)));
        // (23/3) + (4 - 23/3) / 3
        assert_approx(atr[4].unwrap(), 23.0 / 3.0 + (4.0 - 23.0 / 3.0) / 3.0, 1e-12);
    }

    #[test]
    fn wilder_carries_through_gaps() {
        let values = vec![Some(dec!(2)), Some(dec!(4)), None, Some(dec!(8))];
        let out = wilder_smooth(&values, 2);
        assert_eq!(out[1], Some(dec!(3)));
        assert_eq!(out[2], Some(dec!(3)));
        assert_eq!(out[3], Some(dec!(5.5)));
    }

    #[test]
    fn atr_of_flat_series_is_zero() {
        let bars = make_ohlc_bars(&[(1.0, 1.0, 1.0, 1.0); 20]);
        let atr = Atr::new(14).compute(&bars);
        assert_eq!(atr[14], Some(Decimal::ZERO));
        assert_eq!(atr[19], Some(Decimal::ZERO));
    }

    #[test]
    fn atr_lookback_matches_first_value() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0, 12.0]);
        let atr = Atr::new(4);
        let out = atr.compute(&bars);
        assert!(out[atr.lookback() - 1].is_none());
        assert!(out[atr.lookback()].is_some());
    }
}
