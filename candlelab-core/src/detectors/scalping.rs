//! Scalping: fast EMA cross after a short-RSI extreme, sub-5-minute charts only.

use super::{
    crossover, positive_at, target_from_rr, DetectionContext, Detector, DetectorError,
    ScalpingParams, SignalDraft,
};
use crate::domain::{Bar, CandidateSignal, Side, SignalDetails, StrategyId, StructureTag};
use crate::indicators::{closes, ema_of_series, Atr, Indicator, Rsi};
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct ScalpingDetector {
    params: ScalpingParams,
}

impl ScalpingDetector {
    pub fn new(params: ScalpingParams) -> Self {
        Self { params }
    }
}

impl Detector for ScalpingDetector {
    fn id(&self) -> StrategyId {
        StrategyId::Scalping
    }

    fn min_window(&self) -> usize {
        let p = &self.params;
        p.slow
            .max(p.rsi_period + p.extreme_lookback)
            .max(p.atr_period + 1)
            + 1
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        if ctx.timeframe.minutes() > p.max_timeframe_minutes {
            return Ok(Vec::new());
        }
        let i = window.len() - 1;
        let close = closes(window);
        let fast = ema_of_series(&close, p.fast);
        let slow = ema_of_series(&close, p.slow);
        let Some(side) = crossover(&fast, &slow, i) else {
            return Ok(Vec::new());
        };

        let rsi = Rsi::new(p.rsi_period).compute(window);
        let recent = rsi[i + 1 - p.extreme_lookback..=i].iter().flatten().copied();
        let extreme = match side {
            Side::Long => recent.min().filter(|v| *v < p.oversold),
            Side::Short => recent.max().filter(|v| *v > p.overbought),
        };
        let Some(rsi_extreme) = extreme else {
            return Ok(Vec::new());
        };

        let Some(atr) = positive_at(&Atr::new(p.atr_period).compute(window), i) else {
            return Ok(Vec::new());
        };
        let (Some(fast_ema), Some(slow_ema)) = (fast[i], slow[i]) else {
            return Ok(Vec::new());
        };
        let price = close[i];
        let stop = price - side.sign() * p.atr_multiplier * atr;

        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: target_from_rr(side, price, stop, p.rr),
            confidence: dec!(55),
            reason: format!(
                "EMA{}/{} cross after RSI{} {:.1}",
                p.fast, p.slow, p.rsi_period, rsi_extreme
            ),
            tags: vec![StructureTag::Crossover],
            details: SignalDetails::Scalping {
                rsi_extreme,
                fast_ema,
                slow_ema,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::DetectionContext;
    use crate::domain::Timeframe;
    use crate::indicators::make_bars;

    fn dip_and_recover() -> Vec<Bar> {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 - 0.3 * i as f64).collect();
        closes.extend([93.0, 99.0, 101.0]);
        make_bars(&closes)
    }

    fn first_signal(tf: Timeframe) -> Option<CandidateSignal> {
        let bars = dip_and_recover();
        let det = ScalpingDetector::new(ScalpingParams::default());
        let ctx = DetectionContext {
            symbol: "EURUSD",
            timeframe: tf,
            offset: 0,
        };
        (det.min_window()..=bars.len()).find_map(|end| {
            det.detect(&bars[..end], &ctx)
                .unwrap()
                .into_signals()
                .into_iter()
                .next()
        })
    }

    #[test]
    fn one_minute_reversal_fires_long() {
        let s = first_signal(Timeframe::M1).expect("expected a scalping signal");
        assert_eq!(s.side, Side::Long);
        assert_eq!(s.confidence, dec!(55));
    }

    #[test]
    fn five_minute_chart_is_ignored() {
        assert!(first_signal(Timeframe::M5).is_none());
        assert!(first_signal(Timeframe::H1).is_none());
    }
}
