//! Smart-money concepts: an order block in the zone that matches the trade
//! direction (bullish in discount, bearish in premium), with price back
//! inside the block.
//!
//! The decision itself is `decide_smart_money`, a pure function of already
//! extracted structure, so it can be exercised without bars.

use super::{
    positive_at, target_from_rr, DetectionContext, Detector, DetectorError, SignalDraft,
    SmartMoneyParams,
};
use crate::domain::{
    Bar, Bias, CandidateSignal, MarketStructure, PriceZone, Side, SignalDetails, StrategyId,
    StructureTag, Zone,
};
use crate::indicators::{swing_points, Atr, Indicator};
use crate::smc::{
    classify_price_zone, find_fair_value_gaps, find_liquidity_sweeps, find_order_blocks,
    last_swing_range, latest_unfilled, market_structure,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Structure extracted from a window, as seen from its last bar.
#[derive(Debug, Clone)]
pub struct SmartMoneyInputs<'a> {
    pub price: Decimal,
    pub zone: PriceZone,
    pub structure: MarketStructure,
    /// Order blocks in anchor order.
    pub order_blocks: &'a [Zone],
    pub atr: Option<Decimal>,
    /// Bias of recent liquidity sweeps.
    pub sweeps: &'a [Bias],
    /// Bias of unfilled fair-value gaps.
    pub open_gaps: &'a [Bias],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartMoneyDecision {
    pub side: Side,
    pub order_block: Zone,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub confidence: Decimal,
    pub liquidity_sweep: bool,
    pub fair_value_gap: bool,
}

/// At most one trade for the inputs.
pub fn decide_smart_money(
    inputs: &SmartMoneyInputs<'_>,
    params: &SmartMoneyParams,
) -> Option<SmartMoneyDecision> {
    let (side, bias) = match (inputs.zone, inputs.structure) {
        (PriceZone::Discount, s) if s != MarketStructure::Bearish => (Side::Long, Bias::Bullish),
        (PriceZone::Premium, s) if s != MarketStructure::Bullish => (Side::Short, Bias::Bearish),
        _ => return None,
    };

    let block = inputs.order_blocks.iter().rev().find(|ob| {
        ob.bias == bias
            && ob.is_active()
            && ob.band.contains_with_tolerance(inputs.price, params.ob_tolerance_pct)
    })?;

    let buffer = match inputs.atr.filter(|a| *a > Decimal::ZERO) {
        Some(atr) => params.buffer_atr * atr,
        None => block.band.height() / Decimal::TWO,
    };
    let stop = match side {
        Side::Long => block.band.low - buffer,
        Side::Short => block.band.high + buffer,
    };
    let target = target_from_rr(side, inputs.price, stop, params.rr);
    if !super::geometry_ok(side, inputs.price, stop, target) {
        return None;
    }

    let liquidity_sweep = inputs.sweeps.contains(&bias);
    let fair_value_gap = inputs.open_gaps.contains(&bias);
    let structure_agrees = matches!(
        (side, inputs.structure),
        (Side::Long, MarketStructure::Bullish) | (Side::Short, MarketStructure::Bearish)
    );
    let mut confidence = dec!(60);
    if liquidity_sweep {
        confidence += dec!(10);
    }
    if fair_value_gap {
        confidence += dec!(10);
    }
    if structure_agrees {
        confidence += dec!(5);
    }

    Some(SmartMoneyDecision {
        side,
        order_block: block.clone(),
        stop_loss: stop,
        take_profit: target,
        confidence: confidence.min(dec!(95)),
        liquidity_sweep,
        fair_value_gap,
    })
}

#[derive(Debug, Clone)]
pub struct SmartMoneyDetector {
    params: SmartMoneyParams,
    swing_window: usize,
}

impl SmartMoneyDetector {
    pub fn new(params: SmartMoneyParams, swing_window: usize) -> Self {
        Self {
            params,
            swing_window,
        }
    }
}

impl Detector for SmartMoneyDetector {
    fn id(&self) -> StrategyId {
        StrategyId::SmartMoney
    }

    fn min_window(&self) -> usize {
        (4 * self.swing_window + 2).max(self.params.atr_period + 1)
    }

    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError> {
        let p = &self.params;
        let w = self.swing_window;
        let i = window.len() - 1;
        let price = window[i].close;

        let points = swing_points(window, w, w);
        let Some(range) = last_swing_range(&points) else {
            return Ok(Vec::new());
        };
        let zone = classify_price_zone(price, range, p.premium_threshold, p.discount_threshold);
        let Some(zone) = zone else {
            return Ok(Vec::new());
        };
        let structure = market_structure(window, w);
        let order_blocks = find_order_blocks(window, p.ob_body_ratio, p.ob_lookback);
        let recent = i.saturating_sub(p.ob_lookback);
        let sweeps: Vec<Bias> = find_liquidity_sweeps(window, &points, w)
            .into_iter()
            .filter(|s| s.index >= recent)
            .map(|s| s.bias)
            .collect();
        let gaps = find_fair_value_gaps(window, p.ob_lookback);
        let open_gaps: Vec<Bias> = [Bias::Bullish, Bias::Bearish]
            .into_iter()
            .filter(|b| latest_unfilled(&gaps, *b).is_some())
            .collect();
        let atr = positive_at(&Atr::new(p.atr_period).compute(window), i);

        let inputs = SmartMoneyInputs {
            price,
            zone,
            structure,
            order_blocks: &order_blocks,
            atr,
            sweeps: &sweeps,
            open_gaps: &open_gaps,
        };
        let Some(decision) = decide_smart_money(&inputs, p) else {
            return Ok(Vec::new());
        };
        Ok(to_draft(decision, zone, structure)
            .finish(window, ctx)
            .into_iter()
            .collect())
    }
}

fn to_draft(d: SmartMoneyDecision, zone: PriceZone, structure: MarketStructure) -> SignalDraft {
    let mut tags = vec![StructureTag::OrderBlock];
    tags.push(match zone {
        PriceZone::Premium => StructureTag::Premium,
        PriceZone::Discount => StructureTag::Discount,
        PriceZone::Equilibrium => StructureTag::Equilibrium,
    });
    if d.liquidity_sweep {
        tags.push(StructureTag::LiquiditySweep);
    }
    if d.fair_value_gap {
        tags.push(StructureTag::FairValueGap);
    }
    let band = d.order_block.band;
    SignalDraft {
        side: d.side,
        stop_loss: d.stop_loss,
        take_profit: d.take_profit,
        confidence: d.confidence,
        reason: format!(
            "{} order block [{}, {}] in {:?} with {:?} structure",
            if d.side == Side::Long { "bullish" } else { "bearish" },
            band.low,
            band.high,
            zone,
            structure
        ),
        tags,
        details: SignalDetails::SmartMoney {
            order_block: band,
            zone,
            structure,
            liquidity_sweep: d.liquidity_sweep,
            fair_value_gap: d.fair_value_gap,
        },
    }
}
