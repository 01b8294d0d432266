//! The bar-by-bar simulation loop.
//!
//! Each processed bar takes exactly one action: an open position is checked
//! for exit, otherwise the aggregator runs on the window ending at the bar.
//! A position opened on bar `i` is first checked on bar `i + 1`.

use super::cancel::CancelFlag;
use super::config::{ConfigError, SimulationConfig};
use super::exits::check_exit;
use super::result::{BacktestResult, BarRef, RunCounters, RunStatus};
use super::sizing::position_size;
use super::state::{AccountState, StateError};
use crate::aggregator::Aggregator;
use crate::detectors::DetectionContext;
use crate::domain::{Bar, Position, Series};
use crate::metrics::compute_metrics;
use tracing::{debug, info, warn};

/// Run one backtest to completion.
pub fn run_backtest(
    series: &Series,
    aggregator: &Aggregator,
    config: &SimulationConfig,
) -> Result<BacktestResult, ConfigError> {
    run_backtest_with_cancel(series, aggregator, config, &CancelFlag::new())
}

/// Run one backtest, polling `cancel` once per bar.
pub fn run_backtest_with_cancel(
    series: &Series,
    aggregator: &Aggregator,
    config: &SimulationConfig,
    cancel: &CancelFlag,
) -> Result<BacktestResult, ConfigError> {
    config.validate()?;
    let min_window = aggregator.min_window().max(1);
    if config.max_window < min_window {
        return Err(ConfigError::invalid(
            "max_window",
            format!(
                "{} is shorter than the detectors' minimum window {min_window}",
                config.max_window
            ),
        ));
    }
    let warmup = min_window - 1 + config.warmup_bars;
    let bars = series.bars();

    info!(
        symbol = series.symbol(),
        timeframe = %series.timeframe(),
        bars = bars.len(),
        detectors = aggregator.detectors().len(),
        warmup,
        "backtest started"
    );

    let mut state = AccountState::new(config.initial_balance);
    let mut counters = RunCounters {
        warmup_bars: warmup.min(bars.len()),
        ..RunCounters::default()
    };
    let mut last_bar: Option<BarRef> = None;
    let mut status = RunStatus::Completed;

    for (i, bar) in bars.iter().enumerate().skip(warmup) {
        if cancel.is_cancelled() {
            info!(last_bar = ?last_bar.map(|b| b.index), "backtest cancelled");
            status = RunStatus::Cancelled { last_bar };
            break;
        }
        if let Err(e) = step(series, aggregator, config, &mut state, &mut counters, i, bar) {
            let reason = e.to_string();
            warn!(bar_index = i, %reason, "backtest aborted");
            // The bar's account changes are kept; it counts as processed.
            state.sample(bar);
            counters.bars_processed += 1;
            status = RunStatus::Aborted {
                last_bar: Some(BarRef {
                    index: i,
                    timestamp: bar.timestamp,
                }),
                reason,
            };
            break;
        }
        state.sample(bar);
        counters.bars_processed += 1;
        last_bar = Some(BarRef {
            index: i,
            timestamp: bar.timestamp,
        });
    }

    if status.is_completed() {
        if let (Some(position), Some(bar)) = (state.position.as_ref(), bars.last()) {
            let last = bars.len() - 1;
            let commission = config.commission(bar.close, position.size);
            match state.close_at_end(last, bar, commission) {
                Ok(trade) => {
                    if let Some(t) = trade {
                        debug!(
                            bar_index = last,
                            net_pnl = %t.net_pnl,
                            "position closed at end of data"
                        );
                    }
                }
                Err(e) => {
                    status = RunStatus::Aborted {
                        last_bar,
                        reason: e.to_string(),
                    };
                }
            }
            state.restate_last_sample();
        }
    }

    let metrics = compute_metrics(&state.trades, &state.equity_curve, config.initial_balance);
    info!(
        trades = state.trades.len(),
        final_balance = %state.balance,
        status = ?status,
        "backtest finished"
    );

    Ok(BacktestResult {
        symbol: series.symbol().to_string(),
        timeframe: series.timeframe(),
        config: config.clone(),
        initial_balance: config.initial_balance,
        final_balance: state.balance,
        trades: state.trades,
        equity_curve: state.equity_curve,
        metrics,
        status,
        counters,
        open_position: state.position,
    })
}

/// One bar: exit check when open, detection and entry when flat.
fn step(
    series: &Series,
    aggregator: &Aggregator,
    config: &SimulationConfig,
    state: &mut AccountState,
    counters: &mut RunCounters,
    i: usize,
    bar: &Bar,
) -> Result<(), StateError> {
    if let Some(position) = state.position.as_mut() {
        position.update_excursions(bar);
        let Some(exit) = check_exit(position, bar, config.intrabar_policy, config.slippage())
        else {
            return Ok(());
        };
        let commission = config.commission(exit.price, position.size);
        if let Some(trade) = state.close(i, bar, exit, commission)? {
            debug!(
                bar_index = i,
                reason = %trade.exit_reason,
                exit_price = %trade.exit_price,
                net_pnl = %trade.net_pnl,
                "position closed"
            );
        }
        return Ok(());
    }

    let (window, offset) = series.window_ending_at(i, config.max_window);
    let ctx = DetectionContext {
        symbol: series.symbol(),
        timeframe: series.timeframe(),
        offset,
    };
    let detections = aggregator.evaluate(window, &ctx);
    counters.signals_generated += detections.candidates;
    counters.detector_failures += detections.failures.len();
    let Some(signal) = detections.selected else {
        return Ok(());
    };

    let size = match position_size(
        state.balance,
        config.risk_per_trade_pct,
        signal.price,
        signal.stop_loss,
        config.size_decimals,
    ) {
        Ok(size) => size,
        Err(e) => {
            debug!(bar_index = i, strategy = %signal.strategy(), error = %e, "signal rejected");
            counters.signals_rejected += 1;
            return Ok(());
        }
    };
    let commission = config.commission(signal.price, size);
    let position = match Position::open(signal, size, commission) {
        Ok(p) => p,
        Err(e) => {
            debug!(bar_index = i, error = %e, "signal rejected");
            counters.signals_rejected += 1;
            return Ok(());
        }
    };
    debug!(
        bar_index = i,
        side = %position.side,
        entry = %position.entry_price,
        size = %position.size,
        strategy = %position.signal.strategy(),
        "position opened"
    );
    state.open(position)
}
