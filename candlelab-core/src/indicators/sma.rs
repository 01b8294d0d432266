//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::{closes, Indicator};
use crate::domain::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Rolling mean of an arbitrary series. The window is recomputed exactly at
/// every index, so there is no accumulated drift from add/remove updates.
pub fn sma_of_series(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }
    let divisor = Decimal::from(period);
    for i in (period - 1)..n {
        let sum: Decimal = values[(i + 1 - period)..=i].iter().copied().sum();
        result[i] = Some(sum / divisor);
    }
    result
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        sma_of_series(&closes(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use rust_decimal_macros::dec;

    #[test]
    fn sma_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Sma::new(3).compute(&bars);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(dec!(11)));
        assert_eq!(result[3], Some(dec!(12)));
        assert_eq!(result[4], Some(dec!(13)));
    }

    #[test]
    fn sma_period_1_is_close() {
        let bars = make_bars(&[5.0, 7.5, 9.0]);
        let result = Sma::new(1).compute(&bars);
        assert_eq!(result, vec![Some(dec!(5)), Some(dec!(7.5)), Some(dec!(9))]);
    }

    #[test]
    fn sma_shorter_than_period() {
        let bars = make_bars(&[1.0, 2.0]);
        assert!(Sma::new(5).compute(&bars).iter().all(Option::is_none));
    }

    #[test]
    fn sma_lookback_and_name() {
        let sma = Sma::new(20);
        assert_eq!(sma.lookback(), 19);
        assert_eq!(sma.name(), "sma_20");
    }

    #[test]
    #[should_panic(expected = "SMA period must be >= 1")]
    fn sma_rejects_zero_period() {
        Sma::new(0);
    }
}
