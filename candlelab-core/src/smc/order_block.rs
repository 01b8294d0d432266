//! Order blocks: the last opposite-coloured candle before an impulsive move.
//!
//! A bullish order block is a bearish candle followed immediately by a bullish
//! candle whose body is at least `body_ratio` times larger and whose close
//! clears the block's high. Bearish blocks mirror this. Candles without a body
//! cannot anchor a block.

use crate::domain::{Bar, Bias, PriceBand, Zone, ZoneKind};
use rust_decimal::Decimal;

/// Order blocks anchored in the last `lookback` bars, in anchor order, with
/// touch/fill/broken state replayed from the bars after the impulse.
pub fn find_order_blocks(bars: &[Bar], body_ratio: Decimal, lookback: usize) -> Vec<Zone> {
    let n = bars.len();
    if n < 2 {
        return Vec::new();
    }
    let start = n.saturating_sub(lookback);
    let mut blocks = Vec::new();

    for j in start..n - 1 {
        let candle = &bars[j];
        let impulse = &bars[j + 1];
        let body = candle.body();
        if body.is_zero() {
            continue;
        }
        // A quotient past the representable range is still a qualifying impulse.
        let ratio = impulse.body().checked_div(body).unwrap_or(Decimal::MAX);
        if ratio < body_ratio {
            continue;
        }
        let bias = if candle.is_bearish() && impulse.is_bullish() && impulse.close > candle.high {
            Bias::Bullish
        } else if candle.is_bullish() && impulse.is_bearish() && impulse.close < candle.low {
            Bias::Bearish
        } else {
            continue;
        };

        let strength = ratio.saturating_mul(Decimal::from(25)).min(Decimal::ONE_HUNDRED);
        let mut zone = Zone::new(
            ZoneKind::OrderBlock,
            bias,
            PriceBand::new(candle.low, candle.high),
            j,
            strength,
        );
        for later in &bars[j + 2..] {
            zone.interact(later);
        }
        blocks.push(zone);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;
    use rust_decimal_macros::dec;

    #[test]
    fn bearish_candle_before_impulse_is_bullish_block() {
        let bars = make_ohlc_bars(&[
            (100.0, 100.5, 98.5, 99.0),   // bearish, body 1
            (99.0, 103.5, 98.8, 103.0),   // bullish impulse, body 4
            (103.0, 104.0, 102.0, 103.5),
        ]);
        let blocks = find_order_blocks(&bars, dec!(2), 50);
        assert_eq!(blocks.len(), 1);
        let ob = &blocks[0];
        assert_eq!(ob.bias, Bias::Bullish);
        assert_eq!(ob.band, PriceBand::new(dec!(98.5), dec!(100.5)));
        assert_eq!(ob.anchor_index, 0);
        assert_eq!(ob.strength, dec!(100));
        assert!(ob.is_active());
    }

    #[test]
    fn weak_follow_through_is_not_a_block() {
        let bars = make_ohlc_bars(&[
            (100.0, 100.5, 98.5, 99.0),
            (99.0, 101.0, 98.8, 100.6), // body 1.6 < 2x
        ]);
        assert!(find_order_blocks(&bars, dec!(2), 50).is_empty());
    }

    #[test]
    fn close_through_block_breaks_it() {
        let bars = make_ohlc_bars(&[
            (100.0, 100.5, 98.5, 99.0),
            (99.0, 103.5, 98.8, 103.0),
            (103.0, 103.2, 97.0, 97.5),
        ]);
        let blocks = find_order_blocks(&bars, dec!(2), 50);
        assert!(blocks[0].broken);
        assert!(blocks[0].filled);
    }

    #[test]
    fn impulse_beyond_representable_ratio_is_a_block() {
        use crate::detectors::test_support::flat_bars;
        let mut bars = flat_bars(2, dec!(1));
        bars[0].open = dec!(1.00000000000000000000000001);
        bars[0].high = bars[0].open;
        bars[1].close = dec!(1000000000000);
        bars[1].high = bars[1].close;
        let blocks = find_order_blocks(&bars, dec!(2), 50);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].bias, Bias::Bullish);
        assert_eq!(blocks[0].strength, dec!(100));
    }

    #[test]
    fn doji_cannot_anchor() {
        let bars = make_ohlc_bars(&[(100.0, 101.0, 99.0, 100.0), (100.0, 104.0, 99.5, 103.5)]);
        assert!(find_order_blocks(&bars, dec!(2), 50).is_empty());
    }
}
