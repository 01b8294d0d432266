//! Donchian channel breakout with volume confirmation.

use super::{
    positive_at, target_from_rr, BreakoutParams, DetectionContext, Detector, DetectorError,
    SignalDraft,
};
use crate::domain::{Bar, CandidateSignal, PriceBand, Side, SignalDetails, StrategyId, StructureTag};
use crate::indicators::{checked_sum, highest_high, lowest_low, Atr, Indicator};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct BreakoutDetector {
    params: BreakoutParams,
}

impl BreakoutDetector {
    pub fn new(params: BreakoutParams) -> Self {
        Self { params }
    }
}

impl Detector for BreakoutDetector {
    fn id(&self) -> StrategyId {
        StrategyId::Breakout
    }

    fn min_window(&self) -> usize {
        (self.params.period + 1).max(self.params.atr_period + 1)
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let i = window.len() - 1;
        let bar = &window[i];
        let prior = &window[i - p.period..i];
        let (Some(high), Some(low)) = (highest_high(prior), lowest_low(prior)) else {
            return Ok(Vec::new());
        };

        let side = if bar.close > high {
            Side::Long
        } else if bar.close < low {
            Side::Short
        } else {
            return Ok(Vec::new());
        };

        if positive_at(&Atr::new(p.atr_period).compute(window), i).is_none() {
            return Ok(Vec::new());
        }

        let overflow = || DetectorError::Overflow {
            index: ctx.absolute(i),
        };
        let avg_volume = checked_sum(prior.iter().map(|b| b.volume)).ok_or_else(overflow)?
            / Decimal::from(p.period);
        // A zero average means the instrument reports no volume; the gate passes.
        let volume_ratio = if avg_volume.is_zero() {
            None
        } else {
            let ratio = bar.volume.checked_div(avg_volume).ok_or_else(overflow)?;
            if ratio < p.volume_multiplier {
                return Ok(Vec::new());
            }
            Some(ratio)
        };

        let channel = PriceBand::new(low, high);
        let stop = channel.midpoint();
        let target = target_from_rr(side, bar.close, stop, p.rr);
        let confidence = match volume_ratio {
            Some(r) => dec!(20)
                .checked_mul(r - p.volume_multiplier)
                .map_or(dec!(90), |excess| (dec!(60) + excess).min(dec!(90))),
            None => dec!(60),
        };

        let mut tags = vec![StructureTag::BreakOfStructure];
        if volume_ratio.is_some() {
            tags.push(StructureTag::VolumeConfirmed);
        }
        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: target,
            confidence,
            reason: format!(
                "close {} beyond {}-bar channel [{}, {}]",
                bar.close, p.period, low, high
            ),
            tags,
            details: SignalDetails::Breakout {
                channel,
                volume_ratio,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}
