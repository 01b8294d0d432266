//! End-to-end runner pipeline: TOML on disk → series → run → artifacts on disk.

use std::sync::Arc;

use candlelab_core::domain::{Series, StrategyId};
use candlelab_runner::{
    generate, load_artifacts, run_batch, run_single, save_artifacts, BatchJob, Parallelism,
    RunConfig, SyntheticKind, SyntheticSpec,
};

const TREND_TOML: &str = r#"
[run]
symbol = "SYNTH"
timeframe = "1h"
initial_balance = 10000
risk_per_trade_pct = 1.0

[strategies]
enabled = ["trend"]

[detectors.trend]
adx_threshold = 20
"#;

fn uptrend() -> Series {
    generate(&SyntheticSpec {
        count: 300,
        ..SyntheticSpec::new(SyntheticKind::Uptrend)
    })
    .unwrap()
}

#[test]
fn toml_file_to_artifacts_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("run.toml");
    std::fs::write(&config_path, TREND_TOML).unwrap();

    let config = RunConfig::from_file(&config_path).unwrap();
    assert_eq!(config.enabled_strategies(), vec![StrategyId::Trend]);

    let report = run_single(&config, &uptrend()).unwrap();
    assert!(!report.result.trades.is_empty());
    assert!(report.result.final_balance > report.result.initial_balance);

    let out = save_artifacts(&report, dir.path()).unwrap();
    for name in ["report.json", "trades.csv", "equity.csv", "summary.md"] {
        assert!(out.join(name).exists(), "missing {name}");
    }
    let loaded = load_artifacts(&out).unwrap();
    assert_eq!(loaded.fingerprint, report.fingerprint);
    assert_eq!(loaded.result.trades, report.result.trades);

    let trades_csv = std::fs::read_to_string(out.join("trades.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), report.result.trades.len() + 1);
}

#[test]
fn series_json_file_reloads_to_the_same_dataset_digest() {
    let dir = tempfile::tempdir().unwrap();
    let series = uptrend();
    let path = dir.path().join("bars.json");
    std::fs::write(&path, serde_json::to_string(&series).unwrap()).unwrap();

    let reloaded: Series =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let config = RunConfig::from_toml(TREND_TOML).unwrap();
    let a = run_single(&config, &series).unwrap();
    let b = run_single(&config, &reloaded).unwrap();
    assert_eq!(a.fingerprint, b.fingerprint);
}

#[test]
fn unordered_bars_json_is_rejected() {
    let series = uptrend();
    let mut value = serde_json::to_value(&series).unwrap();
    let bars = value["bars"].as_array_mut().unwrap();
    bars.swap(3, 4);
    assert!(serde_json::from_value::<Series>(value).is_err());
}

#[test]
fn batch_over_configs_matches_single_runs() {
    let series = Arc::new(uptrend());
    let trend = RunConfig::from_toml(TREND_TOML).unwrap();
    let all = RunConfig::default();
    let jobs = vec![
        BatchJob {
            label: "trend".into(),
            config: trend.clone(),
            series: series.clone(),
        },
        BatchJob {
            label: "all".into(),
            config: all.clone(),
            series: series.clone(),
        },
    ];

    let outcomes = run_batch(&jobs, Parallelism::Global);
    let single_trend = run_single(&trend, &series).unwrap();
    let single_all = run_single(&all, &series).unwrap();
    assert_eq!(
        outcomes[0].report.as_ref().unwrap().fingerprint,
        single_trend.fingerprint
    );
    assert_eq!(
        outcomes[1].report.as_ref().unwrap().fingerprint,
        single_all.fingerprint
    );
}
