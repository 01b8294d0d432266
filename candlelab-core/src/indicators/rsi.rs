//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge case: avg_loss == 0 → RSI = 100 (including a perfectly flat window).

use super::Indicator;
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        let n = bars.len();
        let mut result = vec![None; n];
        if n < self.period + 1 {
            return result;
        }

        let change = |i: usize| bars[i].close - bars[i - 1].close;
        let gain = |c: Decimal| c.max(Decimal::ZERO);
        let loss = |c: Decimal| (-c).max(Decimal::ZERO);

        let period = Decimal::from(self.period);
        let mut avg_gain = Decimal::ZERO;
        let mut avg_loss = Decimal::ZERO;
        for i in 1..=self.period {
            let c = change(i);
            avg_gain += gain(c);
            avg_loss += loss(c);
        }
        avg_gain /= period;
        avg_loss /= period;
        result[self.period] = Some(compute_rsi(avg_gain, avg_loss));

        for i in (self.period + 1)..n {
            let c = change(i);
            avg_gain += (gain(c) - avg_gain) / period;
            avg_loss += (loss(c) - avg_loss) / period;
            result[i] = Some(compute_rsi(avg_gain, avg_loss));
        }
        result
    }
}

fn compute_rsi(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    let hundred = Decimal::ONE_HUNDRED;
    if avg_loss.is_zero() {
        hundred
    } else if avg_gain.is_zero() {
        Decimal::ZERO
    } else {
        hundred * avg_gain / (avg_gain + avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};
    use rust_decimal_macros::dec;

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));
        assert_eq!(result[13], None);
        assert_eq!(result[14], Some(dec!(100)));
        assert_eq!(result[19], Some(dec!(100)));
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));
        assert_eq!(result[14], Some(Decimal::ZERO));
    }

    #[test]
    fn rsi_flat_is_100() {
        let result = Rsi::new(5).compute(&make_bars(&[10.0; 10]));
        assert_eq!(result[5], Some(dec!(100)));
    }

    #[test]
    fn rsi_alternating_is_balanced() {
        let closes: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));
        assert_approx(result[29].unwrap(), 50.0, 5.0);
    }

    #[test]
    fn rsi_bounded() {
        let closes = [44.0, 44.3, 44.1, 43.6, 44.3, 44.8, 45.1, 45.4, 45.8, 46.1, 45.9, 46.0];
        let result = Rsi::new(3).compute(&make_bars(&closes));
        for v in result.iter().flatten() {
            assert!(*v >= Decimal::ZERO && *v <= dec!(100));
        }
    }
}
