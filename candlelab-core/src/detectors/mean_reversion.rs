//! Mean reversion: RSI extreme plus a close outside the Bollinger band,
//! targeting the band midline.

use super::{
    positive_at, DetectionContext, Detector, DetectorError, MeanReversionParams, SignalDraft,
};
use crate::domain::{Bar, CandidateSignal, Side, SignalDetails, StrategyId, StructureTag};
use crate::indicators::{Atr, Bollinger, Indicator, Rsi};
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct MeanReversionDetector {
    params: MeanReversionParams,
}

impl MeanReversionDetector {
    pub fn new(params: MeanReversionParams) -> Self {
        Self { params }
    }
}

impl Detector for MeanReversionDetector {
    fn id(&self) -> StrategyId {
        StrategyId::MeanReversion
    }

    fn min_window(&self) -> usize {
        let p = &self.params;
        (p.rsi_period + 1).max(p.bb_period).max(p.atr_period + 1)
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let i = window.len() - 1;
        let close = window[i].close;
        let (Some(rsi), Some(bands)) = (
            Rsi::new(p.rsi_period).compute(window)[i],
            Bollinger::middle(p.bb_period, p.bb_multiplier).bands(window)[i],
        ) else {
            return Ok(Vec::new());
        };

        let (side, confidence) = if rsi < p.oversold && close < bands.lower {
            (Side::Long, dec!(50) + (p.oversold - rsi))
        } else if rsi > p.overbought && close > bands.upper {
            (Side::Short, dec!(50) + (rsi - p.overbought))
        } else {
            return Ok(Vec::new());
        };

        let Some(atr) = positive_at(&Atr::new(p.atr_period).compute(window), i) else {
            return Ok(Vec::new());
        };
        let stop = close - side.sign() * p.stop_atr_multiplier * atr;

        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: bands.middle,
            confidence: confidence.min(dec!(90)),
            reason: format!("RSI {:.1} with close outside Bollinger band", rsi),
            tags: vec![StructureTag::BandExcursion],
            details: SignalDetails::MeanReversion {
                rsi,
                upper_band: bands.upper,
                middle_band: bands.middle,
                lower_band: bands.lower,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{ctx, flat_bars};
    use crate::indicators::make_bars;

    #[test]
    fn capitulation_bar_fires_long_to_midline() {
        let mut closes: Vec<f64> = (0..25).map(|i| 100.0 + (i % 2) as f64 * 0.5).collect();
        closes.extend([98.0, 96.0, 93.0, 89.0]);
        let bars = make_bars(&closes);
        let det = MeanReversionDetector::new(MeanReversionParams::default());
        let signals = det.detect(&bars, &ctx()).unwrap().into_signals();
        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert_eq!(s.side, Side::Long);
        let SignalDetails::MeanReversion { middle_band, rsi, .. } = s.details else {
            panic!("wrong details variant");
        };
        assert_eq!(s.take_profit, middle_band);
        assert!(rsi < dec!(30));
    }

    #[test]
    fn flat_series_emits_nothing() {
        let det = MeanReversionDetector::new(MeanReversionParams::default());
        assert!(det
            .detect(&flat_bars(50, dec!(100)), &ctx())
            .unwrap()
            .signals()
            .is_empty());
    }
}
