//! Multi-timeframe alignment: a pullback entry allowed only when the
//! higher-timeframe trend (long swing window) agrees with the lower one.

use super::{
    positive_at, target_from_rr, DetectionContext, Detector, DetectorError,
    MultiTimeframeParams, SignalDraft,
};
use crate::domain::{
    Bar, CandidateSignal, Side, SignalDetails, StrategyId, StructureTag, TrendDirection,
};
use crate::indicators::{
    closes, ema_of_series, swing_points, swings_of, Atr, Indicator, SwingKind,
};
use crate::smc::trend_from_swings;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct MultiTimeframeDetector {
    params: MultiTimeframeParams,
    swing_window: usize,
}

impl MultiTimeframeDetector {
    pub fn new(params: MultiTimeframeParams, swing_window: usize) -> Self {
        Self {
            params,
            swing_window,
        }
    }
}

impl Detector for MultiTimeframeDetector {
    fn id(&self) -> StrategyId {
        StrategyId::MultiTimeframe
    }

    fn min_window(&self) -> usize {
        let p = &self.params;
        (4 * p.htf_swing_window + 2)
            .max(p.ema_period + 1)
            .max(p.atr_period + 1)
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let i = window.len() - 1;
        let htf = p.htf_swing_window;
        let higher_trend = trend_from_swings(&swing_points(window, htf, htf));
        let ltf_points = swing_points(window, self.swing_window, self.swing_window);
        let lower_trend = trend_from_swings(&ltf_points);
        if higher_trend != lower_trend {
            return Ok(Vec::new());
        }

        let ema = ema_of_series(&closes(window), p.ema_period);
        let (Some(prev_ema), Some(ema_now)) = (ema[i - 1], ema[i]) else {
            return Ok(Vec::new());
        };
        let (prev, bar) = (&window[i - 1], &window[i]);

        let (side, opposing) = match higher_trend {
            TrendDirection::Uptrend
                if prev.low <= prev_ema && bar.is_bullish() && bar.close > ema_now =>
            {
                (Side::Long, SwingKind::Low)
            }
            TrendDirection::Downtrend
                if prev.high >= prev_ema && bar.is_bearish() && bar.close < ema_now =>
            {
                (Side::Short, SwingKind::High)
            }
            _ => return Ok(Vec::new()),
        };

        let Some(atr) = positive_at(&Atr::new(p.atr_period).compute(window), i) else {
            return Ok(Vec::new());
        };
        let Some(swing) = swings_of(&ltf_points, opposing).last() else {
            return Ok(Vec::new());
        };
        let stop = swing.price - side.sign() * p.buffer_atr * atr;

        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: target_from_rr(side, bar.close, stop, p.rr),
            confidence: dec!(70),
            reason: format!(
                "pullback to EMA{} with aligned {:?} trend",
                p.ema_period, higher_trend
            ),
            tags: vec![StructureTag::Pullback],
            details: SignalDetails::MultiTimeframe {
                higher_trend,
                lower_trend,
                ema: ema_now,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}
