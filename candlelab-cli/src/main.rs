//! CandleLab CLI — backtest, batch, verify and replay commands.
//!
//! Commands:
//! - `backtest` — run one TOML config over a bars file or a synthetic series
//! - `batch` — run several configs over the same series in parallel
//! - `verify` — re-verify a recorded signal against the bars that followed it
//! - `replay` — re-run the detectors at one historical bar

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use candlelab_core::domain::{Bar, CandidateSignal, Series};
use candlelab_core::replay::{replay_detection, verify, VerifyParams};
use candlelab_runner::{
    generate, generate_comparison, run_batch, run_single, save_artifacts,
    BatchJob, Parallelism, RunConfig, RunReport, SyntheticKind, SyntheticSpec,
};

#[derive(Parser)]
#[command(
    name = "candlelab",
    about = "CandleLab CLI — deterministic OHLCV signal detection and backtesting"
)]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the bars come from.
#[derive(Args)]
struct SeriesSource {
    /// JSON file with `{symbol, timeframe, bars}`.
    #[arg(long, conflicts_with = "synthetic")]
    bars: Option<PathBuf>,

    /// Synthetic series kind: uptrend, flat, random_walk.
    #[arg(long)]
    synthetic: Option<SyntheticKind>,

    /// Number of synthetic bars.
    #[arg(long, default_value_t = 500)]
    count: usize,

    /// Seed for the random-walk series.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest from a TOML config file.
    Backtest {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        source: SeriesSource,

        /// Write report.json, trades.csv, equity.csv and summary.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run several configs over one series; results keep the order of --config.
    Batch {
        /// TOML config files (repeatable).
        #[arg(long = "config", required = true)]
        configs: Vec<PathBuf>,

        #[command(flatten)]
        source: SeriesSource,

        /// Worker threads. Defaults to one per core.
        #[arg(long)]
        threads: Option<usize>,

        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Re-verify a signal's patterns against the bars after it.
    Verify {
        /// JSON file with one recorded signal.
        #[arg(long)]
        signal: PathBuf,

        /// JSON file with the bars following the signal bar (array of bars).
        #[arg(long)]
        outcome: PathBuf,

        /// Optional JSON file with verification parameters.
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Re-run the configured detectors at one bar of a series.
    Replay {
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        source: SeriesSource,

        /// Absolute index of the bar to replay.
        #[arg(long)]
        bar_index: usize,

        /// JSON file with the signal recorded at that bar, to check reproduction.
        #[arg(long)]
        recorded: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Commands::Backtest {
            config,
            source,
            output_dir,
        } => run_backtest_cmd(&config, &source, output_dir.as_deref()),
        Commands::Batch {
            configs,
            source,
            threads,
            output_dir,
        } => run_batch_cmd(&configs, &source, threads, output_dir.as_deref()),
        Commands::Verify {
            signal,
            outcome,
            params,
        } => run_verify_cmd(&signal, &outcome, params.as_deref()),
        Commands::Replay {
            config,
            source,
            bar_index,
            recorded,
        } => run_replay_cmd(&config, &source, bar_index, recorded.as_deref()),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {what} file {}", path.display()))
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::from_file(path).with_context(|| format!("invalid config {}", path.display()))
}

fn load_series(source: &SeriesSource, config: &RunConfig) -> Result<Series> {
    match (&source.bars, source.synthetic) {
        (Some(path), _) => read_json(path, "bars"),
        (None, Some(kind)) => {
            let defaults = SyntheticSpec::new(kind);
            let spec = SyntheticSpec {
                symbol: config.run.symbol.clone().unwrap_or_else(|| defaults.symbol.clone()),
                timeframe: config.run.timeframe.unwrap_or(defaults.timeframe),
                count: source.count,
                seed: source.seed,
                ..defaults
            };
            info!(kind = %kind, count = spec.count, "using synthetic series");
            Ok(generate(&spec)?)
        }
        (None, None) => bail!("one of --bars or --synthetic is required"),
    }
}

fn run_backtest_cmd(
    config_path: &Path,
    source: &SeriesSource,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let series = load_series(source, &config)?;
    let report = run_single(&config, &series)?;

    print_summary(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_batch_cmd(
    config_paths: &[PathBuf],
    source: &SeriesSource,
    threads: Option<usize>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let configs = config_paths
        .iter()
        .map(|p| load_config(p))
        .collect::<Result<Vec<_>>>()?;
    // Synthetic symbol/timeframe come from the first config.
    let series = Arc::new(load_series(source, &configs[0])?);

    let jobs: Vec<BatchJob> = config_paths
        .iter()
        .zip(configs)
        .map(|(path, config)| BatchJob {
            label: path.display().to_string(),
            config,
            series: series.clone(),
        })
        .collect();

    let parallelism = threads.map_or(Parallelism::Global, Parallelism::Threads);
    let outcomes = run_batch(&jobs, parallelism);

    let mut succeeded: Vec<(&str, &RunReport)> = Vec::new();
    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.report {
            Ok(report) => {
                succeeded.push((outcome.label.as_str(), report));
                if let Some(dir) = output_dir {
                    let run_dir = save_artifacts(report, dir)?;
                    println!("{}: artifacts saved to {}", outcome.label, run_dir.display());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {e}", outcome.label);
            }
        }
    }

    println!("{}", generate_comparison(&succeeded));
    if failed > 0 {
        bail!("{failed} of {} runs failed", outcomes.len());
    }
    Ok(())
}

fn run_verify_cmd(
    signal_path: &Path,
    outcome_path: &Path,
    params_path: Option<&Path>,
) -> Result<()> {
    let signal: CandidateSignal = read_json(signal_path, "signal")?;
    let outcome: Vec<Bar> = read_json(outcome_path, "outcome")?;
    let params: VerifyParams = match params_path {
        Some(p) => read_json(p, "params")?,
        None => VerifyParams::default(),
    };

    let result = verify(&signal, &outcome, &params);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_replay_cmd(
    config_path: &Path,
    source: &SeriesSource,
    bar_index: usize,
    recorded_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let series = load_series(source, &config)?;
    let recorded: Option<CandidateSignal> = recorded_path
        .map(|p| read_json(p, "recorded signal"))
        .transpose()?;
    let aggregator = config.build_aggregator()?;

    let outcome = replay_detection(
        &series,
        bar_index,
        &aggregator,
        config.run.simulation.max_window,
        recorded.as_ref(),
    )?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let r = &report.result;
    let m = &r.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {} ({})", r.symbol, r.timeframe);
    println!("Status:         {:?}", r.status);
    println!(
        "Bars:           {} processed ({} warmup)",
        r.counters.bars_processed, r.counters.warmup_bars
    );
    println!(
        "Signals:        {} generated, {} rejected",
        r.counters.signals_generated, r.counters.signals_rejected
    );
    println!("Trades:         {}", m.total_trades);
    println!();
    println!("--- Performance ---");
    println!("Final Balance:  {:.2}", r.final_balance);
    println!("Total Return:   {:.2}%", m.total_return_pct);
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown_pct);
    println!("Win Rate:       {:.1}%", m.win_rate);
    println!("Profit Factor:  {}", m.profit_factor);
    println!("Max Consec Win: {}", m.max_consecutive_wins);
    println!("Max Consec Loss:{}", m.max_consecutive_losses);
    println!();
    println!("Result digest:  {}", report.fingerprint.result);
    if r.counters.detector_failures > 0 {
        println!("WARNING: {} detector failures", r.counters.detector_failures);
    }
}
