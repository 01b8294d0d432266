//! Classic floor-trader pivot levels.
//!
//! Levels for a session come from the previous session's high, low and close.

use crate::domain::Bar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub pivot: Decimal,
    pub r1: Decimal,
    pub r2: Decimal,
    pub r3: Decimal,
    pub s1: Decimal,
    pub s2: Decimal,
    pub s3: Decimal,
}

impl PivotLevels {
    pub fn from_hlc(high: Decimal, low: Decimal, close: Decimal) -> Self {
        let pivot = (high + low + close) / Decimal::from(3);
        let range = high - low;
        Self {
            pivot,
            r1: Decimal::TWO * pivot - low,
            r2: pivot + range,
            r3: high + Decimal::TWO * (pivot - low),
            s1: Decimal::TWO * pivot - high,
            s2: pivot - range,
            s3: low - Decimal::TWO * (high - pivot),
        }
    }

    /// Nearest resistance strictly above `price`.
    pub fn resistance_above(&self, price: Decimal) -> Option<Decimal> {
        [self.pivot, self.r1, self.r2, self.r3]
            .into_iter()
            .filter(|l| *l > price)
            .min()
    }

    /// Nearest support strictly below `price`.
    pub fn support_below(&self, price: Decimal) -> Option<Decimal> {
        [self.pivot, self.s1, self.s2, self.s3]
            .into_iter()
            .filter(|l| *l < price)
            .max()
    }
}

/// Pivot levels per bar, derived from the previous UTC calendar day.
/// Bars on the first day of the slice have no levels.
pub fn daily_pivots(bars: &[Bar]) -> Vec<Option<PivotLevels>> {
    let mut result = Vec::with_capacity(bars.len());
    let mut current_day: Option<NaiveDate> = None;
    let mut running: Option<(Decimal, Decimal, Decimal)> = None;
    let mut levels: Option<PivotLevels> = None;

    for bar in bars {
        let day = bar.timestamp.date_naive();
        if current_day != Some(day) {
            if let Some((h, l, c)) = running {
                levels = Some(PivotLevels::from_hlc(h, l, c));
            }
            current_day = Some(day);
            running = None;
        }
        running = Some(match running {
            Some((h, l, _)) => (h.max(bar.high), l.min(bar.low), bar.close),
            None => (bar.high, bar.low, bar.close),
        });
        result.push(levels);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn classic_levels() {
        let p = PivotLevels::from_hlc(dec!(110), dec!(90), dec!(100));
        assert_eq!(p.pivot, dec!(100));
        assert_eq!(p.r1, dec!(110));
        assert_eq!(p.s1, dec!(90));
        assert_eq!(p.r2, dec!(120));
        assert_eq!(p.s2, dec!(80));
        assert_eq!(p.r3, dec!(130));
        assert_eq!(p.s3, dec!(70));
        assert_eq!(p.resistance_above(dec!(105)), Some(dec!(110)));
        assert_eq!(p.support_below(dec!(105)), Some(dec!(100)));
    }

    #[test]
    fn daily_pivots_use_previous_day() {
        let mut bars = make_ohlc_bars(&[
            (100.0, 110.0, 95.0, 105.0),
            (105.0, 108.0, 90.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
        ]);
        bars[2].timestamp = bars[0].timestamp + Duration::days(1);
        let pivots = daily_pivots(&bars);
        assert!(pivots[0].is_none());
        assert!(pivots[1].is_none());
        // previous day: H 110, L 90, C 100
        assert_eq!(pivots[2].unwrap().pivot, dec!(100));
    }
}
