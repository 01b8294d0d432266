//! Killzone: wick rejection inside a configured UTC session, backed by an
//! unfilled fair-value gap in the same direction.

use super::{
    positive_at, target_from_rr, DetectionContext, Detector, DetectorError, KillzoneParams,
    SignalDraft,
};
use crate::domain::{Bar, Bias, CandidateSignal, SignalDetails, StrategyId, StructureTag};
use crate::indicators::{Atr, Indicator};
use crate::smc::{find_fair_value_gaps, latest_unfilled};
use chrono::Timelike;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct KillzoneDetector {
    params: KillzoneParams,
}

impl KillzoneDetector {
    pub fn new(params: KillzoneParams) -> Self {
        Self { params }
    }
}

impl Detector for KillzoneDetector {
    fn id(&self) -> StrategyId {
        StrategyId::Killzone
    }

    fn min_window(&self) -> usize {
        3.max(self.params.atr_period + 1)
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let i = window.len() - 1;
        let bar = &window[i];
        let hour = bar.timestamp.hour();
        let Some(session) = p.sessions.iter().find(|s| s.contains_hour(hour)) else {
            return Ok(Vec::new());
        };
        if bar.range().is_zero() {
            return Err(DetectorError::ZeroRange {
                index: ctx.absolute(i),
            });
        }

        let body = bar.body();
        let (lower, upper) = (bar.lower_wick(), bar.upper_wick());
        let (bias, wick) = if lower >= p.wick_ratio * body && lower > upper {
            (Bias::Bullish, lower)
        } else if upper >= p.wick_ratio * body && upper > lower {
            (Bias::Bearish, upper)
        } else {
            return Ok(Vec::new());
        };

        let gaps = find_fair_value_gaps(window, p.fvg_lookback);
        let Some(gap) = latest_unfilled(&gaps, bias) else {
            return Ok(Vec::new());
        };
        let Some(atr) = positive_at(&Atr::new(p.atr_period).compute(window), i) else {
            return Ok(Vec::new());
        };

        let side = bias.side();
        let buffer = p.buffer_atr * atr;
        let stop = match bias {
            Bias::Bullish => bar.low - buffer,
            Bias::Bearish => bar.high + buffer,
        };
        let wick_ratio = wick.checked_div(body);

        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: target_from_rr(side, bar.close, stop, p.rr),
            confidence: dec!(70),
            reason: format!(
                "{} wick rejection in {} session with open FVG",
                if bias == Bias::Bullish { "lower" } else { "upper" },
                session.name
            ),
            tags: vec![
                StructureTag::Killzone,
                StructureTag::WickRejection,
                StructureTag::FairValueGap,
            ],
            details: SignalDetails::Killzone {
                session: session.name.clone(),
                wick_ratio,
                fair_value_gap: gap.band,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}
