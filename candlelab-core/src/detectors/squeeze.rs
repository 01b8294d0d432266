//! Volatility squeeze release: Bollinger bands leave the Keltner channel.

use super::{
    positive_at, target_from_rr, DetectionContext, Detector, DetectorError, SignalDraft,
    SqueezeParams,
};
use crate::domain::{Bar, CandidateSignal, PriceBand, Side, SignalDetails, StrategyId, StructureTag};
use crate::indicators::{Atr, BandValues, Bollinger, Indicator, Keltner};
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct SqueezeDetector {
    params: SqueezeParams,
}

impl SqueezeDetector {
    pub fn new(params: SqueezeParams) -> Self {
        Self { params }
    }
}

fn compressed(bb: &BandValues, kc: &BandValues) -> bool {
    bb.upper < kc.upper && bb.lower > kc.lower
}

impl Detector for SqueezeDetector {
    fn id(&self) -> StrategyId {
        StrategyId::Squeeze
    }

    fn min_window(&self) -> usize {
        let p = &self.params;
        p.bb_period.max(p.kc_period).max(p.atr_period + 1) + 1
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let i = window.len() - 1;
        let bb = Bollinger::middle(p.bb_period, p.bb_multiplier).bands(window);
        let kc = Keltner::middle(p.kc_period, p.atr_period, p.kc_multiplier).bands(window);
        let (Some(bb_prev), Some(kc_prev), Some(bb_now), Some(kc_now)) =
            (bb[i - 1], kc[i - 1], bb[i], kc[i])
        else {
            return Ok(Vec::new());
        };
        if !compressed(&bb_prev, &kc_prev) || compressed(&bb_now, &kc_now) {
            return Ok(Vec::new());
        }
        if positive_at(&Atr::new(p.atr_period).compute(window), i).is_none() {
            return Ok(Vec::new());
        }

        let close = window[i].close;
        let basis = bb_now.middle;
        let (side, stop) = if close > basis {
            (Side::Long, kc_now.lower)
        } else if close < basis {
            (Side::Short, kc_now.upper)
        } else {
            return Ok(Vec::new());
        };

        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: target_from_rr(side, close, stop, p.rr),
            confidence: dec!(65),
            reason: "Bollinger bands released from Keltner squeeze".to_string(),
            tags: vec![StructureTag::SqueezeRelease],
            details: SignalDetails::Squeeze {
                bollinger: PriceBand::new(bb_now.lower, bb_now.upper),
                keltner: PriceBand::new(kc_now.lower, kc_now.upper),
                basis,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}
