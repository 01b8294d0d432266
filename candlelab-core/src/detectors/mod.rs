//! Strategy detectors — ten independent algorithms over a bar window.
//!
//! A detector is a pure function of its window: no state survives between
//! calls, so the same window always yields the same signals. The window ends
//! at the bar being evaluated; `DetectionContext::offset` maps window indices
//! back to series indices.

pub mod breakout;
pub mod factory;
pub mod killzone;
pub mod mean_reversion;
pub mod multi_timeframe;
pub mod params;
pub mod scalping;
pub mod smart_money;
pub mod squeeze;
pub mod supply_demand;
pub mod trend;
pub mod vwap;

pub use breakout::BreakoutDetector;
pub use factory::{create_detector, create_detectors, create_detectors_by_name, FactoryError};
pub use killzone::KillzoneDetector;
pub use mean_reversion::MeanReversionDetector;
pub use multi_timeframe::MultiTimeframeDetector;
pub use params::{
    BreakoutParams, DetectorParams, KillzoneParams, MeanReversionParams, MultiTimeframeParams,
    ScalpingParams, SessionWindow, SmartMoneyParams, SqueezeParams, SupplyDemandParams,
    TrendParams, VwapParams, MAX_MULTIPLIER,
};
pub use scalping::ScalpingDetector;
pub use smart_money::{
    decide_smart_money, SmartMoneyDecision, SmartMoneyDetector, SmartMoneyInputs,
};
pub use squeeze::SqueezeDetector;
pub use supply_demand::SupplyDemandDetector;
pub use trend::TrendDetector;
pub use vwap::VwapDetector;

use crate::domain::{
    Bar, CandidateSignal, Side, SignalDetails, SignalError, StrategyId, StructureTag, Timeframe,
};
use crate::indicators::IndicatorError;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;

// ─── Contract ────────────────────────────────────────────────────────

/// Where a detection window sits.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub symbol: &'a str,
    pub timeframe: Timeframe,
    /// Series index of the window's first bar.
    pub offset: usize,
}

impl DetectionContext<'_> {
    /// Series index of window position `i`.
    pub fn absolute(&self, i: usize) -> usize {
        self.offset + i
    }
}

/// Outcome of one detector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Signals(Vec<CandidateSignal>),
    /// Window shorter than the detector's minimum; not an error.
    InsufficientData { needed: usize, available: usize },
}

impl Detection {
    pub fn none() -> Self {
        Detection::Signals(Vec::new())
    }

    pub fn signals(&self) -> &[CandidateSignal] {
        match self {
            Detection::Signals(s) => s,
            Detection::InsufficientData { .. } => &[],
        }
    }

    pub fn into_signals(self) -> Vec<CandidateSignal> {
        match self {
            Detection::Signals(s) => s,
            Detection::InsufficientData { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorError {
    #[error("bar {index} has zero range where a positive range is required")]
    ZeroRange { index: usize },
    #[error("indicator failure: {0}")]
    Indicator(#[from] IndicatorError),
    #[error("detector produced an invalid signal: {0}")]
    InvalidSignal(#[from] SignalError),
    #[error("arithmetic overflow at bar {index}")]
    Overflow { index: usize },
}

/// Trait for strategy detectors.
///
/// Implementations only read `window`; they must not look past its last bar.
pub trait Detector: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Smallest window the detector can evaluate.
    fn min_window(&self) -> usize;

    /// Evaluate the last bar of `window`. Called only when the window is long enough.
    fn evaluate(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Vec<CandidateSignal>, DetectorError>;

    /// Run the detector: short windows report insufficient data, and every
    /// emitted signal is checked for consistent geometry.
    fn detect(
        &self,
        window: &[Bar],
        ctx: &DetectionContext<'_>,
    ) -> Result<Detection, DetectorError> {
        let needed = self.min_window();
        if window.len() < needed {
            return Ok(Detection::InsufficientData {
                needed,
                available: window.len(),
            });
        }
        let signals = self.evaluate(window, ctx)?;
        for signal in &signals {
            signal.validate()?;
        }
        Ok(Detection::Signals(signals))
    }
}

// ─── Shared helpers ──────────────────────────────────────────────────

/// Cross direction between two series at `i` (vs `i - 1`): `Some(Long)` when
/// `fast` moved from at-or-below `slow` to above it.
pub(crate) fn crossover(
    fast: &[Option<Decimal>],
    slow: &[Option<Decimal>],
    i: usize,
) -> Option<Side> {
    if i == 0 {
        return None;
    }
    let (f0, s0, f1, s1) = (fast[i - 1]?, slow[i - 1]?, fast[i]?, slow[i]?);
    if f0 <= s0 && f1 > s1 {
        Some(Side::Long)
    } else if f0 >= s0 && f1 < s1 {
        Some(Side::Short)
    } else {
        None
    }
}

/// Target at `rr` times the stop distance on the profit side.
pub(crate) fn target_from_rr(side: Side, price: Decimal, stop: Decimal, rr: Decimal) -> Decimal {
    price + side.sign() * rr * (price - stop).abs()
}

/// Value at `i` when it is defined and strictly positive.
pub(crate) fn positive_at(values: &[Option<Decimal>], i: usize) -> Option<Decimal> {
    values.get(i).copied().flatten().filter(|v| *v > Decimal::ZERO)
}

/// True when stop and target sit strictly on the correct sides of price.
pub(crate) fn geometry_ok(side: Side, price: Decimal, stop: Decimal, target: Decimal) -> bool {
    match side {
        Side::Long => stop < price && price < target,
        Side::Short => target < price && price < stop,
    }
}

/// Everything except the window/context fields of a signal.
pub(crate) struct SignalDraft {
    pub side: Side,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub confidence: Decimal,
    pub reason: String,
    pub tags: Vec<StructureTag>,
    pub details: SignalDetails,
}

impl SignalDraft {
    /// Attach the draft to the last bar of the window. Degenerate geometry
    /// yields `None`; the bar simply produces no signal.
    pub fn finish(self, window: &[Bar], ctx: &DetectionContext<'_>) -> Option<CandidateSignal> {
        let last = window.len().checked_sub(1)?;
        let bar = &window[last];
        if !geometry_ok(self.side, bar.close, self.stop_loss, self.take_profit) {
            return None;
        }
        Some(CandidateSignal {
            symbol: ctx.symbol.to_string(),
            timeframe: ctx.timeframe,
            bar_index: ctx.absolute(last),
            timestamp: bar.timestamp,
            side: self.side,
            price: bar.close,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            confidence: self.confidence.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            reason: self.reason,
            tags: self.tags.into_iter().collect::<BTreeSet<_>>(),
            details: self.details,
        })
    }
}
