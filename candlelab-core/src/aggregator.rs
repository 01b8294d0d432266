//! Signal aggregation: run every detector on one window and forward at most
//! one signal.
//!
//! Selection is highest confidence first; ties go to the detector listed
//! earliest in the [`PriorityOrder`]. A failing detector only loses its own
//! contribution for the bar.

use crate::detectors::{DetectionContext, Detection, Detector};
use crate::domain::{Bar, CandidateSignal, StrategyId};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

// ─── Priority ────────────────────────────────────────────────────────

/// Tie-break order between detectors, highest priority first.
///
/// Detectors missing from a configured order rank after every listed one,
/// in their default order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityOrder(Vec<StrategyId>);

impl Default for PriorityOrder {
    /// Structural detectors first, trend-following last.
    fn default() -> Self {
        Self(StrategyId::ALL.to_vec())
    }
}

impl PriorityOrder {
    pub fn new(order: Vec<StrategyId>) -> Self {
        Self(order)
    }

    pub fn as_slice(&self) -> &[StrategyId] {
        &self.0
    }

    /// Lower is higher priority.
    pub fn rank(&self, id: StrategyId) -> usize {
        if let Some(pos) = self.0.iter().position(|x| *x == id) {
            return pos;
        }
        let default_pos = StrategyId::ALL.iter().position(|x| *x == id).unwrap_or(0);
        self.0.len() + default_pos
    }

    /// Best candidate: highest confidence, then highest priority.
    pub fn select<'a>(&self, candidates: &'a [CandidateSignal]) -> Option<&'a CandidateSignal> {
        candidates.iter().min_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| self.rank(a.strategy()).cmp(&self.rank(b.strategy())))
        })
    }
}

// ─── Per-bar aggregation ─────────────────────────────────────────────

/// Everything the detectors produced for one bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarDetections {
    pub selected: Option<CandidateSignal>,
    pub candidates: usize,
    /// Detectors that returned an error, with its message.
    pub failures: Vec<(StrategyId, String)>,
}

/// Runs a fixed detector set and applies the priority order.
pub struct Aggregator {
    detectors: Vec<Box<dyn Detector>>,
    priority: PriorityOrder,
}

impl Aggregator {
    pub fn new(detectors: Vec<Box<dyn Detector>>, priority: PriorityOrder) -> Self {
        Self {
            detectors,
            priority,
        }
    }

    pub fn detectors(&self) -> &[Box<dyn Detector>] {
        &self.detectors
    }

    /// Largest minimum window over all detectors (0 when empty).
    pub fn min_window(&self) -> usize {
        self.detectors.iter().map(|d| d.min_window()).max().unwrap_or(0)
    }

    /// Evaluate `window` with every detector and pick at most one signal.
    pub fn evaluate(&self, window: &[Bar], ctx: &DetectionContext<'_>) -> BarDetections {
        let mut candidates = Vec::new();
        let mut failures = Vec::new();
        let bar_index = ctx.absolute(window.len().saturating_sub(1));

        for detector in &self.detectors {
            let id = detector.id();
            match detector.detect(window, ctx) {
                Ok(Detection::Signals(signals)) => candidates.extend(signals),
                Ok(Detection::InsufficientData { needed, available }) => {
                    trace!(detector = %id, bar_index, needed, available, "insufficient data");
                }
                Err(e) => {
                    warn!(detector = %id, bar_index, error = %e, "detector failed");
                    failures.push((id, e.to_string()));
                }
            }
        }

        BarDetections {
            selected: self.priority.select(&candidates).cloned(),
            candidates: candidates.len(),
            failures,
        }
    }
}
