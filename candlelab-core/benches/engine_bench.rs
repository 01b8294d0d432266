//! Criterion benchmarks for CandleLab hot paths.
//!
//! Benchmarks:
//! 1. Simulation loop (full backtest, all detectors)
//! 2. Single-detector evaluation on a fixed window
//! 3. Indicator batch (SMA, EMA, ATR, RSI, ADX, Donchian, Bollinger, Keltner, VWAP)
//! 4. Metrics over a long trade list

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use candlelab_core::aggregator::{Aggregator, PriorityOrder};
use candlelab_core::detectors::{
    create_detector, create_detectors, DetectionContext, Detector, DetectorParams,
};
use candlelab_core::domain::{Bar, Series, StrategyId, Timeframe};
use candlelab_core::engine::{run_backtest, SimulationConfig};
use candlelab_core::indicators::{
    Adx, Atr, Bollinger, BollingerBand, Donchian, Ema, Indicator, Keltner, KeltnerBand, Rsi,
    SessionReset, Sma, Vwap,
};
use candlelab_core::metrics::compute_metrics;

// ── Helpers ──────────────────────────────────────────────────────────

fn cents(x: f64) -> Decimal {
    Decimal::new((x * 100.0).round() as i64, 2)
}

fn make_bars(n: usize) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.02;
            let open = close - 0.3;
            Bar::new(
                base + Duration::minutes(15 * i as i64),
                cents(open),
                cents(close + 1.5),
                cents(open - 1.5),
                cents(close),
                Decimal::from(1_000 + (i % 500) as i64),
            )
            .unwrap()
        })
        .collect()
}

fn all_detectors() -> Aggregator {
    Aggregator::new(
        create_detectors(&StrategyId::ALL, &DetectorParams::default()).unwrap(),
        PriorityOrder::default(),
    )
}

// ── 1. Simulation Loop ───────────────────────────────────────────────

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    group.sample_size(10);
    let aggregator = all_detectors();
    let config = SimulationConfig::default();

    for &bar_count in &[500, 2000] {
        let series = Series::new("BENCH", Timeframe::M15, make_bars(bar_count)).unwrap();
        group.bench_with_input(
            BenchmarkId::new("all_detectors", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| run_backtest(black_box(&series), &aggregator, black_box(&config)));
            },
        );
    }

    group.finish();
}

// ── 2. Detector Evaluation ───────────────────────────────────────────

fn bench_detectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("detector_window_250");
    let bars = make_bars(250);
    let ctx = DetectionContext {
        symbol: "BENCH",
        timeframe: Timeframe::M15,
        offset: 0,
    };
    let params = DetectorParams::default();

    for id in StrategyId::ALL {
        let detector = create_detector(id, &params);
        group.bench_function(id.as_str(), |b| {
            b.iter(|| detector.detect(black_box(&bars), &ctx));
        });
    }

    group.finish();
}

// ── 3. Indicator Batch ───────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_batch");

    let stack: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(20)),
        Box::new(Ema::new(50)),
        Box::new(Atr::new(14)),
        Box::new(Rsi::new(14)),
        Box::new(Adx::new(14)),
        Box::new(Donchian::upper(20)),
        Box::new(Bollinger::new(20, dec!(2), BollingerBand::Upper)),
        Box::new(Keltner::new(20, 10, dec!(1.5), KeltnerBand::Lower)),
        Box::new(Vwap::new(SessionReset::Daily)),
    ];

    for &bar_count in &[250, 2000] {
        let bars = make_bars(bar_count);
        group.bench_with_input(
            BenchmarkId::new("full_stack_9", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    for ind in &stack {
                        black_box(ind.compute(black_box(&bars)));
                    }
                });
            },
        );
    }

    group.finish();
}

// ── 4. Metrics ───────────────────────────────────────────────────────

fn bench_metrics(c: &mut Criterion) {
    let series = Series::new("BENCH", Timeframe::M15, make_bars(2000)).unwrap();
    let config = SimulationConfig::default();
    let result = run_backtest(&series, &all_detectors(), &config).unwrap();

    c.bench_function("metrics_from_backtest", |b| {
        b.iter(|| {
            compute_metrics(
                black_box(&result.trades),
                black_box(&result.equity_curve),
                config.initial_balance,
            )
        });
    });
}

criterion_group!(
    benches,
    bench_simulation,
    bench_detectors,
    bench_indicators,
    bench_metrics
);
criterion_main!(benches);
