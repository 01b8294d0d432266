//! Break of structure (BOS) and change of character (CHoCH).
//!
//! A swing becomes usable as a structure level only once it is confirmed,
//! i.e. `swing_window` bars after it. A close beyond the latest usable swing
//! high (low) is a bullish (bearish) break; it is a CHoCH when it flips the
//! direction of the previous break, a BOS otherwise.

use crate::domain::{Bar, Bias, MarketStructure, PriceBand, TrendDirection};
use crate::indicators::{swing_points, swings_of, SwingKind, SwingPoint};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    BreakOfStructure,
    ChangeOfCharacter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureBreak {
    /// Bar whose close broke the level.
    pub index: usize,
    pub kind: BreakKind,
    pub bias: Bias,
    pub level: Decimal,
    pub swing_index: usize,
}

/// All structure breaks in the slice, in bar order.
pub fn structure_breaks(bars: &[Bar], swing_window: usize) -> Vec<StructureBreak> {
    let points = swing_points(bars, swing_window, swing_window);
    let mut breaks = Vec::new();
    let mut next = 0;
    let mut active_high: Option<SwingPoint> = None;
    let mut active_low: Option<SwingPoint> = None;
    let mut last_bias: Option<Bias> = None;

    for (i, bar) in bars.iter().enumerate() {
        while next < points.len() && points[next].index + swing_window <= i {
            let p = points[next];
            match p.kind {
                SwingKind::High => active_high = Some(p),
                SwingKind::Low => active_low = Some(p),
            }
            next += 1;
        }

        let mut record = |swing: SwingPoint, bias: Bias| {
            let kind = match last_bias {
                Some(prev) if prev != bias => BreakKind::ChangeOfCharacter,
                _ => BreakKind::BreakOfStructure,
            };
            breaks.push(StructureBreak {
                index: i,
                kind,
                bias,
                level: swing.price,
                swing_index: swing.index,
            });
            last_bias = Some(bias);
        };

        if let Some(high) = active_high {
            if bar.close > high.price {
                record(high, Bias::Bullish);
                active_high = None;
            }
        }
        if let Some(low) = active_low {
            if bar.close < low.price {
                record(low, Bias::Bearish);
                active_low = None;
            }
        }
    }
    breaks
}

/// Direction of the most recent structure break; `Ranging` when there is none.
pub fn market_structure(bars: &[Bar], swing_window: usize) -> MarketStructure {
    match structure_breaks(bars, swing_window).last().map(|b| b.bias) {
        Some(Bias::Bullish) => MarketStructure::Bullish,
        Some(Bias::Bearish) => MarketStructure::Bearish,
        None => MarketStructure::Ranging,
    }
}

/// Trend from the last two swing highs and last two swing lows: both rising
/// is an uptrend, both falling a downtrend, anything else ranging.
pub fn trend_from_swings(points: &[SwingPoint]) -> TrendDirection {
    let last_two = |kind| {
        let v: Vec<Decimal> = swings_of(points, kind).map(|p| p.price).collect();
        match v.as_slice() {
            [.., a, b] => Some((*a, *b)),
            _ => None,
        }
    };
    let (Some((h1, h2)), Some((l1, l2))) = (last_two(SwingKind::High), last_two(SwingKind::Low))
    else {
        return TrendDirection::Ranging;
    };
    if h2 > h1 && l2 > l1 {
        TrendDirection::Uptrend
    } else if h2 < h1 && l2 < l1 {
        TrendDirection::Downtrend
    } else {
        TrendDirection::Ranging
    }
}

/// Band between the most recent swing high and swing low.
pub fn last_swing_range(points: &[SwingPoint]) -> Option<PriceBand> {
    let high = swings_of(points, SwingKind::High).last()?;
    let low = swings_of(points, SwingKind::Low).last()?;
    Some(PriceBand::new(high.price, low.price))
}
