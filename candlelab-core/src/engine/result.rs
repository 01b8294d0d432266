//! Terminal output of one simulation run.

use super::config::SimulationConfig;
use crate::domain::{Position, Timeframe, TradeRecord};
use crate::metrics::Metrics;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One equity-curve point, recorded after each processed bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquitySample {
    pub timestamp: DateTime<Utc>,
    /// Realized balance.
    pub balance: Decimal,
    /// Balance plus unrealized P&L at the bar's close.
    pub equity: Decimal,
    /// Decline of `balance` from its running peak, in percent.
    pub drawdown_pct: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarRef {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
}

/// How the run ended. `last_bar` is the last fully processed bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled { last_bar: Option<BarRef> },
    Aborted { last_bar: Option<BarRef>, reason: String },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

/// Bookkeeping counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Candidates produced by all detectors, before aggregation.
    pub signals_generated: usize,
    /// Selected signals that could not be sized.
    pub signals_rejected: usize,
    pub detector_failures: usize,
    pub warmup_bars: usize,
    pub bars_processed: usize,
}

/// Immutable result of one backtest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub config: SimulationConfig,
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquitySample>,
    pub metrics: Metrics,
    pub status: RunStatus,
    pub counters: RunCounters,
    /// Position left open when the run was cancelled or aborted.
    pub open_position: Option<Position>,
}
