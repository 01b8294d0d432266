//! Trend-following: EMA crossover gated by ADX and swing structure.

use super::{
    crossover, positive_at, target_from_rr, DetectionContext, Detector, DetectorError,
    SignalDraft, TrendParams,
};
use crate::domain::{
    Bar, CandidateSignal, Side, SignalDetails, StrategyId, StructureTag, TrendDirection,
};
use crate::indicators::{
    closes, ema_of_series, swing_points, swings_of, Adx, Atr, Indicator, SwingKind,
};
use crate::smc::trend_from_swings;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct TrendDetector {
    params: TrendParams,
    swing_window: usize,
}

impl TrendDetector {
    pub fn new(params: TrendParams, swing_window: usize) -> Self {
        Self {
            params,
            swing_window,
        }
    }
}

impl Detector for TrendDetector {
    fn id(&self) -> StrategyId {
        StrategyId::Trend
    }

    fn min_window(&self) -> usize {
        let p = &self.params;
        p.slow
            .max(2 * p.adx_period)
            .max(p.atr_period + 1)
            .max(4 * self.swing_window + 2)
            + 1
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let i = window.len() - 1;
        let close = closes(window);
        let fast = ema_of_series(&close, p.fast);
        let slow = ema_of_series(&close, p.slow);

        let Some(side) = crossover(&fast, &slow, i) else {
            return Ok(Vec::new());
        };
        let Some(adx) = Adx::new(p.adx_period).compute(window)[i] else {
            return Ok(Vec::new());
        };
        if adx <= p.adx_threshold {
            return Ok(Vec::new());
        }

        let points = swing_points(window, self.swing_window, self.swing_window);
        let expected = match side {
            Side::Long => TrendDirection::Uptrend,
            Side::Short => TrendDirection::Downtrend,
        };
        if trend_from_swings(&points) != expected {
            return Ok(Vec::new());
        }

        let Some(atr) = positive_at(&Atr::new(p.atr_period).compute(window), i) else {
            return Ok(Vec::new());
        };
        // Stop sits beyond the opposing swing.
        let opposing = match side {
            Side::Long => SwingKind::Low,
            Side::Short => SwingKind::High,
        };
        let Some(swing) = swings_of(&points, opposing).last() else {
            return Ok(Vec::new());
        };
        let price = close[i];
        let stop = swing.price - side.sign() * p.atr_multiplier * atr;
        let target = target_from_rr(side, price, stop, p.rr);
        let confidence = (dec!(50) + Decimal::TWO * (adx - p.adx_threshold)).min(dec!(95));

        let (Some(fast_ema), Some(slow_ema)) = (fast[i], slow[i]) else {
            return Ok(Vec::new());
        };
        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: target,
            confidence,
            reason: format!(
                "EMA{}/{} {} cross with ADX {:.1}",
                p.fast,
                p.slow,
                if side == Side::Long { "bullish" } else { "bearish" },
                adx
            ),
            tags: vec![StructureTag::Crossover],
            details: SignalDetails::Trend {
                fast_ema,
                slow_ema,
                adx,
                atr,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}
