//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: the full `RunReport`, schema-versioned
//! - **CSV**: trade ledger and equity curve for external analysis tools
//! - **Markdown**: a single-run summary and a multi-run comparison table
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;

use candlelab_core::domain::TradeRecord;
use candlelab_core::engine::{EquitySample, RunStatus};

use crate::runner::{RunReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade ledger as CSV, one row per closed trade.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "strategy",
        "side",
        "entry_index",
        "entry_time",
        "entry_price",
        "exit_index",
        "exit_time",
        "exit_price",
        "exit_reason",
        "size",
        "stop_loss",
        "take_profit",
        "gross_pnl",
        "commission",
        "slippage",
        "net_pnl",
        "r_multiple",
        "bars_held",
        "mae",
        "mfe",
        "confidence",
        "signal_reason",
    ])?;

    for t in trades {
        wtr.write_record([
            t.symbol.as_str(),
            t.strategy.as_str(),
            &t.side.to_string(),
            &t.entry_index.to_string(),
            &t.entry_time.to_rfc3339(),
            &t.entry_price.to_string(),
            &t.exit_index.to_string(),
            &t.exit_time.to_rfc3339(),
            &t.exit_price.to_string(),
            &t.exit_reason.to_string(),
            &t.size.to_string(),
            &t.stop_loss.to_string(),
            &t.take_profit.to_string(),
            &t.gross_pnl.to_string(),
            &t.commission.to_string(),
            &t.slippage_cost.to_string(),
            &t.net_pnl.to_string(),
            &t.r_multiple().round_dp(4).to_string(),
            &t.bars_held.to_string(),
            &t.mae.to_string(),
            &t.mfe.to_string(),
            &t.confidence.to_string(),
            t.signal_reason.as_str(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the equity curve as CSV, one row per processed bar.
pub fn export_equity_csv(equity_curve: &[EquitySample]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "balance", "equity", "drawdown_pct"])?;
    for s in equity_curve {
        wtr.write_record([
            &s.timestamp.to_rfc3339(),
            &s.balance.to_string(),
            &s.equity.to_string(),
            &s.drawdown_pct.round_dp(4).to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{symbol}_{result digest prefix}/` under `output_dir` containing
/// `report.json`, `trades.csv`, `equity.csv` and `summary.md`. The name is
/// derived from the result, so re-saving an identical run overwrites it.
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.result.symbol,
        report.fingerprint.result.short()
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("report.json"), &export_json(report)?)?;
    write(
        &run_dir.join("trades.csv"),
        &export_trades_csv(&report.result.trades)?,
    )?;
    write(
        &run_dir.join("equity.csv"),
        &export_equity_csv(&report.result.equity_curve)?,
    )?;
    write(&run_dir.join("summary.md"), &generate_report(report))?;

    Ok(run_dir)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a `RunReport` from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<RunReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

fn status_line(status: &RunStatus) -> String {
    match status {
        RunStatus::Completed => "completed".to_string(),
        RunStatus::Cancelled { last_bar } => match last_bar {
            Some(b) => format!("cancelled after bar {}", b.index),
            None => "cancelled before the first bar".to_string(),
        },
        RunStatus::Aborted { last_bar, reason } => match last_bar {
            Some(b) => format!("aborted at bar {}: {reason}", b.index),
            None => format!("aborted: {reason}"),
        },
    }
}

fn money(v: Decimal) -> String {
    format!("{:.2}", v)
}

/// Markdown summary of a single run.
pub fn generate_report(report: &RunReport) -> String {
    let r = &report.result;
    let m = &r.metrics;
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} ({}) |\n", r.symbol, r.timeframe));
    md.push_str(&format!("| Status | {} |\n", status_line(&r.status)));
    md.push_str(&format!(
        "| Bars | {} processed ({} warmup) |\n",
        r.counters.bars_processed, r.counters.warmup_bars
    ));
    md.push_str(&format!(
        "| Signals | {} generated, {} rejected |\n",
        r.counters.signals_generated, r.counters.signals_rejected
    ));
    md.push_str(&format!(
        "| Detector Failures | {} |\n",
        r.counters.detector_failures
    ));
    md.push_str(&format!("| Dataset | {} |\n", report.fingerprint.dataset.short()));
    md.push_str(&format!("| Config | {} |\n", report.fingerprint.config.short()));
    md.push_str(&format!("| Result | {} |\n", report.fingerprint.result.short()));
    md.push('\n');

    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Balance | {} |\n", money(r.initial_balance)));
    md.push_str(&format!("| Final Balance | {} |\n", money(r.final_balance)));
    md.push_str(&format!("| Net Profit | {} |\n", money(m.net_profit)));
    md.push_str(&format!("| Total Return | {:.2}% |\n", m.total_return_pct));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown_pct));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe_ratio));
    md.push_str(&format!(
        "| Trades | {} ({} long, {} short) |\n",
        m.total_trades, m.long_trades, m.short_trades
    ));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", m.win_rate));
    md.push_str(&format!("| Profit Factor | {} |\n", m.profit_factor));
    md.push_str(&format!("| Expectancy | {} |\n", money(m.expectancy)));
    md.push_str(&format!(
        "| Avg Win / Avg Loss | {} / {} |\n",
        money(m.average_win),
        money(m.average_loss)
    ));
    md.push_str(&format!(
        "| Largest Win / Loss | {} / {} |\n",
        money(m.largest_win),
        money(m.largest_loss)
    ));
    md.push_str(&format!(
        "| Max Consecutive Wins / Losses | {} / {} |\n",
        m.max_consecutive_wins, m.max_consecutive_losses
    ));
    md.push_str(&format!("| Avg Bars Held | {:.1} |\n", m.average_bars_held));
    md.push_str(&format!(
        "| Costs | {} commission, {} slippage |\n",
        money(m.total_commission),
        money(m.total_slippage)
    ));
    md.push('\n');

    if !r.trades.is_empty() {
        md.push_str("## Trades\n\n");
        md.push_str("| # | Strategy | Side | Entry | Exit | Reason | Net P&L | R |\n");
        md.push_str("| ---: | --- | --- | ---: | ---: | --- | ---: | ---: |\n");
        for (i, t) in r.trades.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {:.2} |\n",
                i + 1,
                t.strategy,
                t.side,
                t.entry_price,
                t.exit_price,
                t.exit_reason,
                money(t.net_pnl),
                t.r_multiple()
            ));
        }
        md.push('\n');
    }

    if let Some(p) = &r.open_position {
        md.push_str(&format!(
            "Open position left by an interrupted run: {} {} @ {}.\n",
            p.side, p.size, p.entry_price
        ));
    }

    md
}

/// Markdown table comparing labelled runs side by side.
pub fn generate_comparison(runs: &[(&str, &RunReport)]) -> String {
    let mut md = String::with_capacity(1024);
    md.push_str("# Run Comparison\n\n");
    md.push_str("| Run | Symbol | Trades | Win Rate | Net Profit | Return | Max DD ");
    md.push_str("| Profit Factor | Sharpe |\n");
    md.push_str("| --- | --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for (label, report) in runs {
        let m = &report.result.metrics;
        md.push_str(&format!(
            "| {} | {} | {} | {:.1}% | {} | {:.2}% | {:.2}% | {} | {:.3} |\n",
            label,
            report.result.symbol,
            m.total_trades,
            m.win_rate,
            money(m.net_profit),
            m.total_return_pct,
            m.max_drawdown_pct,
            m.profit_factor,
            m.sharpe_ratio
        ));
    }
    md
}
