//! Supply/demand: the base before a displacement candle becomes a zone; the
//! first return of price into that zone is the entry.

use super::{
    positive_at, target_from_rr, DetectionContext, Detector, DetectorError, SignalDraft,
    SupplyDemandParams,
};
use crate::domain::{
    Bar, Bias, CandidateSignal, PriceBand, SignalDetails, StrategyId, StructureTag, Zone, ZoneKind,
};
use crate::indicators::{checked_sum, Atr, Indicator};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct SupplyDemandDetector {
    params: SupplyDemandParams,
}

impl SupplyDemandDetector {
    pub fn new(params: SupplyDemandParams) -> Self {
        Self { params }
    }

    /// Most recent displacement before the last bar: `(index, body_ratio)`.
    /// Errors with the window index of a bar whose ratio is unrepresentable.
    fn last_displacement(&self, window: &[Bar]) -> Result<Option<(usize, Decimal)>, usize> {
        let p = &self.params;
        let i = window.len() - 1;
        let earliest = i.saturating_sub(p.lookback).max(p.body_period.max(1));
        for d in (earliest..i).rev() {
            let prior = &window[d - p.body_period..d];
            let sum = checked_sum(prior.iter().map(Bar::body)).ok_or(d)?;
            let avg = sum / Decimal::from(p.body_period);
            if avg.is_zero() {
                continue;
            }
            let ratio = window[d].body().checked_div(avg).ok_or(d)?;
            if ratio >= p.displacement_ratio {
                return Ok(Some((d, ratio)));
            }
        }
        Ok(None)
    }
}

impl Detector for SupplyDemandDetector {
    fn id(&self) -> StrategyId {
        StrategyId::SupplyDemand
    }

    fn min_window(&self) -> usize {
        (self.params.body_period + 2).max(self.params.atr_period + 1)
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let i = window.len() - 1;
        let displacement = self.last_displacement(window).map_err(|d| DetectorError::Overflow {
            index: ctx.absolute(d),
        })?;
        let Some((d, body_ratio)) = displacement else {
            return Ok(Vec::new());
        };
        let displacement = &window[d];
        let bias = if displacement.is_bullish() {
            Bias::Bullish
        } else if displacement.is_bearish() {
            Bias::Bearish
        } else {
            return Ok(Vec::new());
        };
        let base = &window[d - 1];
        let band = PriceBand::new(base.low, base.high);

        // First return: nothing between the displacement and now touched the zone.
        if window[d + 1..i].iter().any(|b| band.touched_by(b)) {
            return Ok(Vec::new());
        }
        let bar = &window[i];
        if !band.touched_by(bar) {
            return Ok(Vec::new());
        }
        let holds = match bias {
            Bias::Bullish => bar.close >= band.low,
            Bias::Bearish => bar.close <= band.high,
        };
        if !holds {
            return Ok(Vec::new());
        }

        let Some(atr) = positive_at(&Atr::new(p.atr_period).compute(window), i) else {
            return Ok(Vec::new());
        };
        let side = bias.side();
        let buffer = p.buffer_atr * atr;
        let stop = match bias {
            Bias::Bullish => band.low - buffer,
            Bias::Bearish => band.high + buffer,
        };

        let strength = dec!(25)
            .checked_mul(body_ratio)
            .map_or(Decimal::ONE_HUNDRED, |s| s.min(Decimal::ONE_HUNDRED));
        let mut zone = Zone::new(ZoneKind::SupplyDemand, bias, band, ctx.absolute(d - 1), strength);
        for later in &window[d + 1..=i] {
            zone.interact(later);
        }
        let zone_tag = match bias {
            Bias::Bullish => StructureTag::DemandZone,
            Bias::Bearish => StructureTag::SupplyZone,
        };

        let draft = SignalDraft {
            side,
            stop_loss: stop,
            take_profit: target_from_rr(side, bar.close, stop, p.rr),
            confidence: (dec!(40) + zone.strength / Decimal::TWO).min(dec!(90)),
            reason: format!(
                "first return into {} zone [{}, {}] after {:.1}x displacement",
                if bias == Bias::Bullish { "demand" } else { "supply" },
                band.low,
                band.high,
                body_ratio
            ),
            tags: vec![zone_tag, StructureTag::Displacement],
            details: SignalDetails::SupplyDemand {
                zone,
                displacement_index: ctx.absolute(d),
                body_ratio,
            },
        };
        Ok(draft.finish(window, ctx).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{ctx, flat_bars};
    use crate::domain::Side;
    use crate::indicators::make_ohlc_bars;

    fn demand_setup() -> Vec<(f64, f64, f64, f64)> {
        let mut data = vec![(100.0, 100.5, 99.5, 100.2); 22];
        data.push((100.2, 103.2, 100.1, 103.0)); // displacement
        data.push((103.0, 104.0, 102.5, 103.5));
        data.push((103.5, 104.0, 102.8, 103.2));
        data
    }

    #[test]
    fn first_return_to_demand_fires_long() {
        let mut data = demand_setup();
        data.push((103.2, 103.3, 100.3, 100.8));
        let bars = make_ohlc_bars(&data);
        let det = SupplyDemandDetector::new(SupplyDemandParams::default());
        let signals = det.detect(&bars, &ctx()).unwrap().into_signals();
        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert_eq!(s.side, Side::Long);
        assert!(s.stop_loss < dec!(99.5));
        assert_eq!(s.confidence, dec!(90));
        let SignalDetails::SupplyDemand { zone, displacement_index, .. } = &s.details else {
            panic!("wrong details variant");
        };
        assert_eq!(*displacement_index, 22);
        assert_eq!(zone.band, PriceBand::new(dec!(99.5), dec!(100.5)));
        assert_eq!(zone.touches, 1);
    }

    #[test]
    fn unrepresentable_body_ratio_is_an_error() {
        use crate::domain::MAX_PRICE;
        let mut bars = flat_bars(25, dec!(1));
        for b in &mut bars[..22] {
            b.close = dec!(1.000000000000000000000000001);
            b.high = b.close;
        }
        for b in &mut bars[22..] {
            b.close = MAX_PRICE;
            b.high = MAX_PRICE;
        }
        for b in &mut bars[23..] {
            b.open = MAX_PRICE;
            b.low = MAX_PRICE;
        }
        let det = SupplyDemandDetector::new(SupplyDemandParams::default());
        assert_eq!(
            det.detect(&bars, &ctx()),
            Err(DetectorError::Overflow { index: 22 })
        );
    }

    #[test]
    fn second_return_is_ignored() {
        let mut data = demand_setup();
        data.push((101.2, 101.3, 100.3, 100.8));
        data.push((100.8, 101.0, 100.2, 100.6));
        let bars = make_ohlc_bars(&data);
        let det = SupplyDemandDetector::new(SupplyDemandParams::default());
        assert!(det.detect(&bars, &ctx()).unwrap().signals().is_empty());
    }

    #[test]
    fn flat_series_has_no_displacement() {
        let det = SupplyDemandDetector::new(SupplyDemandParams::default());
        assert!(det
            .detect(&flat_bars(50, dec!(100)), &ctx())
            .unwrap()
            .signals()
            .is_empty());
    }
}
