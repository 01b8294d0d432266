//! Single-run entry points: configuration + series in, fingerprinted result out.
//!
//! Two entry points:
//! - `run_single()`: runs to completion.
//! - `run_single_with_cancel()`: polls a `CancelFlag` once per bar.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use candlelab_core::domain::{Series, Timeframe};
use candlelab_core::engine::{self, run_backtest_with_cancel, BacktestResult, CancelFlag};
use candlelab_core::fingerprint::RunFingerprint;

use crate::config::{ConfigError, RunConfig};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("simulation rejected the configuration: {0}")]
    Simulation(#[from] engine::ConfigError),
    #[error("config expects symbol '{expected}', series is '{found}'")]
    SymbolMismatch { expected: String, found: String },
    #[error("config expects timeframe {expected}, series is {found}")]
    TimeframeMismatch { expected: Timeframe, found: Timeframe },
    #[error("fingerprint failed: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// A finished run with the digests that identify its inputs and output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub fingerprint: RunFingerprint,
    pub result: BacktestResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run one configuration over one series.
pub fn run_single(config: &RunConfig, series: &Series) -> Result<RunReport, RunError> {
    run_single_with_cancel(config, series, &CancelFlag::new())
}

/// Like `run_single`, stopping early once `cancel` is raised.
pub fn run_single_with_cancel(
    config: &RunConfig,
    series: &Series,
    cancel: &CancelFlag,
) -> Result<RunReport, RunError> {
    config.validate()?;
    check_series(config, series)?;

    let aggregator = config.build_aggregator()?;
    let result = run_backtest_with_cancel(series, &aggregator, &config.run.simulation, cancel)?;
    let fingerprint = RunFingerprint::new(series, config, &result)?;

    info!(
        symbol = series.symbol(),
        trades = result.trades.len(),
        result = fingerprint.result.short(),
        "run complete"
    );

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        fingerprint,
        result,
    })
}

fn check_series(config: &RunConfig, series: &Series) -> Result<(), RunError> {
    if let Some(expected) = &config.run.symbol {
        if expected != series.symbol() {
            return Err(RunError::SymbolMismatch {
                expected: expected.clone(),
                found: series.symbol().to_string(),
            });
        }
    }
    if let Some(expected) = config.run.timeframe {
        if expected != series.timeframe() {
            return Err(RunError::TimeframeMismatch {
                expected,
                found: series.timeframe(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{generate, SyntheticKind, SyntheticSpec};
    use candlelab_core::engine::RunStatus;

    fn series(kind: SyntheticKind, count: usize) -> Series {
        generate(&SyntheticSpec {
            count,
            ..SyntheticSpec::new(kind)
        })
        .unwrap()
    }

    #[test]
    fn flat_series_runs_clean() {
        let report = run_single(&RunConfig::default(), &series(SyntheticKind::Flat, 300)).unwrap();
        assert!(report.result.trades.is_empty());
        assert!(report.result.status.is_completed());
        assert_eq!(report.result.final_balance, report.result.initial_balance);
        assert_eq!(report.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn reruns_share_every_digest() {
        let s = series(SyntheticKind::RandomWalk, 400);
        let config = RunConfig::default();
        let a = run_single(&config, &s).unwrap();
        let b = run_single(&config, &s).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn config_change_changes_config_digest() {
        let s = series(SyntheticKind::Uptrend, 300);
        let a = run_single(&RunConfig::default(), &s).unwrap();
        let mut config = RunConfig::default();
        config.run.simulation.risk_per_trade_pct = rust_decimal_macros::dec!(2);
        let b = run_single(&config, &s).unwrap();
        assert_eq!(a.fingerprint.dataset, b.fingerprint.dataset);
        assert_ne!(a.fingerprint.config, b.fingerprint.config);
    }

    #[test]
    fn symbol_mismatch_is_rejected() {
        let mut config = RunConfig::default();
        config.run.symbol = Some("GBPUSD".into());
        let err = run_single(&config, &series(SyntheticKind::Flat, 50)).unwrap_err();
        assert!(matches!(err, RunError::SymbolMismatch { .. }));
    }

    #[test]
    fn timeframe_mismatch_is_rejected() {
        let mut config = RunConfig::default();
        config.run.timeframe = Some(Timeframe::D1);
        let err = run_single(&config, &series(SyntheticKind::Flat, 50)).unwrap_err();
        assert!(matches!(err, RunError::TimeframeMismatch { .. }));
    }

    #[test]
    fn window_shorter_than_detectors_is_rejected() {
        let mut config = RunConfig::default();
        config.run.simulation.max_window = 5;
        let err = run_single(&config, &series(SyntheticKind::Flat, 50)).unwrap_err();
        assert!(matches!(err, RunError::Simulation(_)));
    }

    #[test]
    fn pre_cancelled_run_reports_cancelled() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let report = run_single_with_cancel(
            &RunConfig::default(),
            &series(SyntheticKind::Flat, 300),
            &cancel,
        )
        .unwrap();
        assert!(matches!(report.result.status, RunStatus::Cancelled { last_bar: None }));
        assert!(report.result.equity_curve.is_empty());
    }
}
