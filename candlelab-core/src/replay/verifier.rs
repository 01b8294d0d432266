//! Pattern re-verification over an outcome window.
//!
//! Each structural check runs from scratch on the bars that followed the
//! signal. A check whose window is too short is reported as unchecked and
//! left out of the confidence denominator.

use crate::domain::{Bar, Bias, CandidateSignal, ExitReason, Position, PriceBand, Side};
use crate::engine::{check_exit, IntrabarPolicy};
use crate::smc::{find_fair_value_gaps, find_order_blocks, structure_breaks};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyParams {
    pub swing_window: usize,
    pub ob_body_ratio: Decimal,
    pub intrabar_policy: IntrabarPolicy,
}

impl Default for VerifyParams {
    fn default() -> Self {
        Self {
            swing_window: 3,
            ob_body_ratio: dec!(2.0),
            intrabar_policy: IntrabarPolicy::StopFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    BreakOfStructure,
    FairValueGap,
    OrderBlock,
    Breakout,
}

impl PatternKind {
    pub const ALL: [PatternKind; 4] = [
        PatternKind::BreakOfStructure,
        PatternKind::FairValueGap,
        PatternKind::OrderBlock,
        PatternKind::Breakout,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCheck {
    pub pattern: PatternKind,
    /// `None` when the window was too short to check.
    pub matched: Option<bool>,
}

/// How the recorded trade would have resolved along the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TradeOutcome {
    TargetHit { index: usize },
    StopHit { index: usize },
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub checks: Vec<PatternCheck>,
    pub matched: usize,
    pub checked: usize,
    /// `matched / checked × 100`; 0 when nothing could be checked.
    pub confidence: Decimal,
    pub outcome: TradeOutcome,
}

/// Re-verify `signal` against `outcome`, the bars after the signal bar.
pub fn verify(
    signal: &CandidateSignal,
    outcome: &[Bar],
    params: &VerifyParams,
) -> VerificationResult {
    let bias = Bias::from_side(signal.side);
    let checks: Vec<PatternCheck> = PatternKind::ALL
        .into_iter()
        .map(|pattern| PatternCheck {
            pattern,
            matched: match pattern {
                PatternKind::BreakOfStructure => check_bos(outcome, bias, params.swing_window),
                PatternKind::FairValueGap => check_fvg(outcome, bias),
                PatternKind::OrderBlock => {
                    check_order_block(signal, outcome, bias, params.ob_body_ratio)
                }
                PatternKind::Breakout => check_breakout(signal, outcome),
            },
        })
        .collect();

    let checked = checks.iter().filter(|c| c.matched.is_some()).count();
    let matched = checks.iter().filter(|c| c.matched == Some(true)).count();
    let confidence = if checked == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(matched) / Decimal::from(checked) * Decimal::ONE_HUNDRED
    };

    VerificationResult {
        checks,
        matched,
        checked,
        confidence,
        outcome: trade_outcome(signal, outcome, params.intrabar_policy),
    }
}

fn check_bos(bars: &[Bar], bias: Bias, swing_window: usize) -> Option<bool> {
    if bars.len() < 2 * swing_window + 2 {
        return None;
    }
    Some(structure_breaks(bars, swing_window).iter().any(|b| b.bias == bias))
}

fn check_fvg(bars: &[Bar], bias: Bias) -> Option<bool> {
    if bars.len() < 3 {
        return None;
    }
    Some(find_fair_value_gaps(bars, bars.len()).iter().any(|g| g.bias == bias))
}

fn check_order_block(
    signal: &CandidateSignal,
    bars: &[Bar],
    bias: Bias,
    body_ratio: Decimal,
) -> Option<bool> {
    if bars.len() < 2 {
        return None;
    }
    if let Some(band) = signal.details.order_block() {
        return Some(band_held(band, bars, bias));
    }
    let found = find_order_blocks(bars, body_ratio, bars.len());
    let Some(block) = found.iter().rev().find(|z| z.bias == bias) else {
        return Some(false);
    };
    Some(!block.broken && band_held(block.band, &bars[block.anchor_index + 1..], bias))
}

/// No close through the far side, and at least one close beyond the near side.
fn band_held(band: PriceBand, bars: &[Bar], bias: Bias) -> bool {
    match bias {
        Bias::Bullish => {
            bars.iter().all(|b| b.close >= band.low) && bars.iter().any(|b| b.close > band.high)
        }
        Bias::Bearish => {
            bars.iter().all(|b| b.close <= band.high) && bars.iter().any(|b| b.close < band.low)
        }
    }
}

fn check_breakout(signal: &CandidateSignal, bars: &[Bar]) -> Option<bool> {
    if bars.is_empty() {
        return None;
    }
    for bar in bars {
        let (beyond_price, beyond_stop) = match signal.side {
            Side::Long => (bar.close > signal.price, bar.close < signal.stop_loss),
            Side::Short => (bar.close < signal.price, bar.close > signal.stop_loss),
        };
        if beyond_stop {
            return Some(false);
        }
        if beyond_price {
            return Some(true);
        }
    }
    Some(false)
}

fn trade_outcome(signal: &CandidateSignal, bars: &[Bar], policy: IntrabarPolicy) -> TradeOutcome {
    let Ok(position) = Position::open(signal.clone(), Decimal::ONE, Decimal::ZERO) else {
        return TradeOutcome::Unresolved;
    };
    for (index, bar) in bars.iter().enumerate() {
        if let Some(exit) = check_exit(&position, bar, policy, Decimal::ZERO) {
            return match exit.reason {
                ExitReason::TakeProfit => TradeOutcome::TargetHit { index },
                _ => TradeOutcome::StopHit { index },
            };
        }
    }
    TradeOutcome::Unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SignalDetails, Timeframe};
    use crate::indicators::{make_bars, make_ohlc_bars};
    use chrono::{TimeZone, Utc};

    fn long_signal(
        price: Decimal,
        stop: Decimal,
        target: Decimal,
        details: SignalDetails,
    ) -> CandidateSignal {
        CandidateSignal {
            symbol: "EURUSD".into(),
            timeframe: Timeframe::H1,
            bar_index: 100,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap(),
            side: Side::Long,
            price,
            stop_loss: stop,
            take_profit: target,
            confidence: dec!(70),
            reason: String::new(),
            tags: Default::default(),
            details,
        }
    }

    fn vwap_details() -> SignalDetails {
        SignalDetails::Vwap {
            vwap: dec!(100),
            previous_vwap: dec!(100),
        }
    }

    #[test]
    fn empty_window_checks_nothing() {
        let s = long_signal(dec!(100), dec!(95), dec!(110), vwap_details());
        let r = verify(&s, &[], &VerifyParams::default());
        assert_eq!(r.checked, 0);
        assert_eq!(r.confidence, dec!(0));
        assert_eq!(r.outcome, TradeOutcome::Unresolved);
        assert!(r.checks.iter().all(|c| c.matched.is_none()));
    }

    #[test]
    fn short_window_excludes_unchecked_patterns() {
        let s = long_signal(dec!(100), dec!(95), dec!(110), vwap_details());
        let bars = make_bars(&[101.0, 102.0]);
        let r = verify(&s, &bars, &VerifyParams::default());
        // Breakout and order block are checkable; BOS and FVG are not.
        assert_eq!(r.checked, 2);
        let breakout = r.checks.iter().find(|c| c.pattern == PatternKind::Breakout).unwrap();
        assert_eq!(breakout.matched, Some(true));
        assert_eq!(r.confidence, dec!(50));
    }

    #[test]
    fn breakout_fails_when_stop_closes_first() {
        let s = long_signal(dec!(100), dec!(95), dec!(110), vwap_details());
        let bars = make_bars(&[99.0, 94.0, 101.0]);
        assert_eq!(check_breakout(&s, &bars), Some(false));
    }

    #[test]
    fn signal_order_block_held_and_left() {
        let band = PriceBand::new(dec!(1.0960), dec!(1.0980));
        let details = SignalDetails::SmartMoney {
            order_block: band,
            zone: crate::domain::PriceZone::Discount,
            structure: crate::domain::MarketStructure::Ranging,
            liquidity_sweep: false,
            fair_value_gap: false,
        };
        let s = long_signal(dec!(1.0975), dec!(1.0950), dec!(1.1025), details);
        let held = make_ohlc_bars(&[
            (1.0975, 1.0985, 1.0965, 1.0978),
            (1.0978, 1.1000, 1.0970, 1.0995),
        ]);
        assert_eq!(check_order_block(&s, &held, Bias::Bullish, dec!(2)), Some(true));
        let broken = make_ohlc_bars(&[
            (1.0975, 1.0985, 1.0940, 1.0945),
            (1.0945, 1.1000, 1.0940, 1.0995),
        ]);
        assert_eq!(check_order_block(&s, &broken, Bias::Bullish, dec!(2)), Some(false));
    }

    #[test]
    fn outcome_uses_stop_first() {
        let s = long_signal(dec!(100), dec!(95), dec!(103), vwap_details());
        // Second bar spans both levels.
        let bars = make_ohlc_bars(&[(100.0, 101.0, 99.0, 100.5), (100.5, 104.0, 94.0, 100.0)]);
        assert_eq!(
            verify(&s, &bars, &VerifyParams::default()).outcome,
            TradeOutcome::StopHit { index: 1 }
        );
        let target_first = VerifyParams {
            intrabar_policy: IntrabarPolicy::TargetFirst,
            ..VerifyParams::default()
        };
        assert_eq!(
            verify(&s, &bars, &target_first).outcome,
            TradeOutcome::TargetHit { index: 1 }
        );
    }

    #[test]
    fn fair_value_gap_in_trade_direction() {
        let bars = make_ohlc_bars(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 104.0, 100.5, 103.8),
            (103.8, 105.0, 102.0, 104.5),
        ]);
        assert_eq!(check_fvg(&bars, Bias::Bullish), Some(true));
        assert_eq!(check_fvg(&bars, Bias::Bearish), Some(false));
    }

    #[test]
    fn verification_is_idempotent() {
        let s = long_signal(dec!(100), dec!(95), dec!(110), vwap_details());
        let bars = make_bars(&[100.0, 102.0, 101.0, 104.0, 103.0, 106.0, 105.0, 109.0, 111.0]);
        let a = verify(&s, &bars, &VerifyParams::default());
        let b = verify(&s, &bars, &VerifyParams::default());
        assert_eq!(a, b);
    }
}
