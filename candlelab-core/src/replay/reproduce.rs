//! Re-run detection at a historical bar.

use crate::aggregator::{Aggregator, BarDetections};
use crate::detectors::DetectionContext;
use crate::domain::{CandidateSignal, Series};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("bar {index} is outside the series (len {len})")]
    BarOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayOutcome {
    pub bar_index: usize,
    /// The signal the aggregator selects now.
    pub selected: Option<CandidateSignal>,
    pub candidates: usize,
    pub failures: Vec<(String, String)>,
    /// The recorded signal equals the selected one in every field.
    pub reproduced: bool,
}

/// Detect at `bar_index` using the simulator's window rule (the last
/// `max_window` bars ending at `bar_index`) and compare with `recorded`.
pub fn replay_detection(
    series: &Series,
    bar_index: usize,
    aggregator: &Aggregator,
    max_window: usize,
    recorded: Option<&CandidateSignal>,
) -> Result<ReplayOutcome, ReplayError> {
    if bar_index >= series.len() {
        return Err(ReplayError::BarOutOfRange {
            index: bar_index,
            len: series.len(),
        });
    }
    let (window, offset) = series.window_ending_at(bar_index, max_window);
    let ctx = DetectionContext {
        symbol: series.symbol(),
        timeframe: series.timeframe(),
        offset,
    };
    let BarDetections {
        selected,
        candidates,
        failures,
    } = aggregator.evaluate(window, &ctx);
    let reproduced = selected.as_ref() == recorded;

    Ok(ReplayOutcome {
        bar_index,
        selected,
        candidates,
        failures: failures
            .into_iter()
            .map(|(id, msg)| (id.to_string(), msg))
            .collect(),
        reproduced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::PriorityOrder;
    use crate::detectors::{create_detectors, DetectorParams};
    use crate::domain::{StrategyId, Timeframe};
    use crate::engine::{run_backtest, SimulationConfig};
    use crate::indicators::make_bars;

    fn vwap_aggregator() -> Aggregator {
        let dets = create_detectors(&[StrategyId::Vwap], &DetectorParams::default()).unwrap();
        Aggregator::new(dets, PriorityOrder::default())
    }

    #[test]
    fn out_of_range_bar_is_an_error() {
        let s = Series::new("T", Timeframe::H1, make_bars(&[1.0, 2.0])).unwrap();
        assert_eq!(
            replay_detection(&s, 5, &vwap_aggregator(), 250, None),
            Err(ReplayError::BarOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn reproduces_backtest_entries() {
        // Saw-tooth closes cross the session VWAP repeatedly.
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + if (i / 6) % 2 == 0 { (i % 6) as f64 } else { 6.0 - (i % 6) as f64 })
            .collect();
        let s = Series::new("T", Timeframe::H1, make_bars(&closes)).unwrap();
        let agg = vwap_aggregator();
        let cfg = SimulationConfig::default();
        let result = run_backtest(&s, &agg, &cfg).unwrap();
        for trade in &result.trades {
            let replay =
                replay_detection(&s, trade.entry_index, &agg, cfg.max_window, None).unwrap();
            let selected = replay.selected.expect("entry bar must reproduce a signal");
            assert_eq!(selected.price, trade.entry_price);
            let again = replay_detection(
                &s,
                trade.entry_index,
                &agg,
                cfg.max_window,
                Some(&selected),
            )
            .unwrap();
            assert!(again.reproduced);
        }
    }

    #[test]
    fn quiet_bar_reproduces_absence() {
        let s = Series::new("T", Timeframe::H1, make_bars(&[100.0; 30])).unwrap();
        let r = replay_detection(&s, 29, &vwap_aggregator(), 250, None).unwrap();
        assert!(r.selected.is_none());
        assert!(r.reproduced);
    }
}
