//! VWAP cross: close moves from one side of the session VWAP to the other.

use super::{
    positive_at, target_from_rr, DetectionContext, Detector, DetectorError, SignalDraft,
    VwapParams,
};
use crate::domain::{Bar, CandidateSignal, Side, SignalDetails, StrategyId, StructureTag};
use crate::indicators::{Atr, Indicator, Vwap};
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct VwapDetector {
    params: VwapParams,
    vwap: Vwap,
}

impl VwapDetector {
    pub fn new(params: VwapParams) -> Self {
        Self {
            params,
            vwap: Vwap::default(),
        }
    }
}

impl Detector for VwapDetector {
    fn id(&self) -> StrategyId {
        StrategyId::Vwap
    }

    fn min_window(&self) -> usize {
        2.max(self.params.atr_period + 1)
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let i = window.len() - 1;
        let vwap = self.vwap.try_compute(window)?;
        let (Some(previous_vwap), Some(current_vwap)) = (vwap[i - 1], vwap[i]) else {
            return Ok(Vec::new());
        };
        let (prev_close, close) = (window[i - 1].close, window[i].close);

        let side = if prev_close <= previous_vwap && close > current_vwap {
            Side::Long
        } else if prev_close >= previous_vwap && close < current_vwap {
            Side::Short
        } else {
            return Ok(Vec::new());
        };

        let Some(atr) = positive_at(&Atr::new(p.atr_period).compute(window), i) else {
            return Ok(Vec::new());
        };
        let stop = current_vwap - side.sign() * p.atr_multiplier * atr;

        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: target_from_rr(side, close, stop, p.rr),
            confidence: dec!(55),
            reason: format!("close crossed VWAP {current_vwap:.5}"),
            tags: vec![StructureTag::VwapCross],
            details: SignalDetails::Vwap {
                vwap: current_vwap,
                previous_vwap,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}
