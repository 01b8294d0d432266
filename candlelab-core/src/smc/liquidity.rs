//! Liquidity sweeps: a wick through a confirmed swing level that closes back
//! on the original side.

use crate::domain::{Bar, Bias};
use crate::indicators::{SwingKind, SwingPoint};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquiditySweep {
    pub index: usize,
    /// Bullish when sell-side liquidity below a swing low was taken.
    pub bias: Bias,
    pub level: Decimal,
    pub swing_index: usize,
}

/// Sweeps of the latest confirmed swing high/low at each bar. `points` must
/// come from `swing_points(bars, swing_window, swing_window)`.
pub fn find_liquidity_sweeps(
    bars: &[Bar],
    points: &[SwingPoint],
    swing_window: usize,
) -> Vec<LiquiditySweep> {
    let mut sweeps = Vec::new();
    let mut next = 0;
    let mut high: Option<SwingPoint> = None;
    let mut low: Option<SwingPoint> = None;

    for (i, bar) in bars.iter().enumerate() {
        while next < points.len() && points[next].index + swing_window <= i {
            match points[next].kind {
                SwingKind::High => high = Some(points[next]),
                SwingKind::Low => low = Some(points[next]),
            }
            next += 1;
        }
        if let Some(l) = low {
            if bar.low < l.price && bar.close > l.price {
                sweeps.push(LiquiditySweep {
                    index: i,
                    bias: Bias::Bullish,
                    level: l.price,
                    swing_index: l.index,
                });
            }
        }
        if let Some(h) = high {
            if bar.high > h.price && bar.close < h.price {
                sweeps.push(LiquiditySweep {
                    index: i,
                    bias: Bias::Bearish,
                    level: h.price,
                    swing_index: h.index,
                });
            }
        }
    }
    sweeps
}
