//! Fair-value gaps: three-bar imbalances.
//!
//! Bullish when bar 3's low is above bar 1's high; the gap is
//! `[bar1.high, bar3.low]`. Bearish when bar 3's high is below bar 1's low.
//! The zone is anchored to the middle bar.

use crate::domain::{Bar, Bias, PriceBand, Zone, ZoneKind};
use rust_decimal::Decimal;

/// Gaps whose third bar lies in the last `lookback` bars, with fill state
/// replayed from the bars after the gap.
pub fn find_fair_value_gaps(bars: &[Bar], lookback: usize) -> Vec<Zone> {
    let n = bars.len();
    let mut gaps = Vec::new();
    if n < 3 {
        return gaps;
    }
    let start = n.saturating_sub(lookback).max(2);

    for k in start..n {
        let first = &bars[k - 2];
        let middle = &bars[k - 1];
        let third = &bars[k];
        let (bias, band) = if third.low > first.high {
            (Bias::Bullish, PriceBand::new(first.high, third.low))
        } else if third.high < first.low {
            (Bias::Bearish, PriceBand::new(third.high, first.low))
        } else {
            continue;
        };

        let range = middle.range();
        let strength = if range.is_zero() {
            Decimal::ZERO
        } else {
            band.height()
                .checked_div(range)
                .map_or(Decimal::ONE_HUNDRED, |r| r.saturating_mul(Decimal::ONE_HUNDRED))
        };
        let mut zone = Zone::new(ZoneKind::FairValueGap, bias, band, k - 1, strength);
        for later in &bars[k + 1..] {
            zone.interact(later);
        }
        gaps.push(zone);
    }
    gaps
}

/// Most recent unfilled gap with the given bias.
pub fn latest_unfilled(gaps: &[Zone], bias: Bias) -> Option<&Zone> {
    gaps.iter().rev().find(|g| g.bias == bias && !g.filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;
    use rust_decimal_macros::dec;

    #[test]
    fn bullish_gap_detected() {
        let bars = make_ohlc_bars(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 104.0, 100.5, 103.8),
            (103.8, 105.0, 102.0, 104.5),
        ]);
        let gaps = find_fair_value_gaps(&bars, 20);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].bias, Bias::Bullish);
        assert_eq!(gaps[0].band, PriceBand::new(dec!(101), dec!(102)));
        assert_eq!(gaps[0].anchor_index, 1);
        assert!(latest_unfilled(&gaps, Bias::Bullish).is_some());
        assert!(latest_unfilled(&gaps, Bias::Bearish).is_none());
    }

    #[test]
    fn overlapping_bars_have_no_gap() {
        let bars = make_ohlc_bars(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 102.0, 100.0, 101.5),
            (101.5, 102.5, 100.8, 102.0),
        ]);
        assert!(find_fair_value_gaps(&bars, 20).is_empty());
    }

    #[test]
    fn bearish_gap_fills_when_price_returns() {
        let bars = make_ohlc_bars(&[
            (105.0, 106.0, 104.0, 104.5),
            (104.5, 104.6, 100.5, 101.0),
            (101.0, 102.0, 100.0, 100.5),
            (100.5, 106.5, 100.4, 105.0),
        ]);
        let gaps = find_fair_value_gaps(&bars, 20);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].bias, Bias::Bearish);
        assert!(gaps[0].filled);
        assert!(latest_unfilled(&gaps, Bias::Bearish).is_none());
    }
}
