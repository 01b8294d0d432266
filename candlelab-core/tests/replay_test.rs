//! Replay determinism: verification and detection reproduction agree with
//! the simulator and with themselves.

use candlelab_core::aggregator::{Aggregator, PriorityOrder};
use candlelab_core::detectors::{create_detectors, DetectorParams};
use candlelab_core::domain::{
    Bar, CandidateSignal, ExitReason, Series, Side, SignalDetails, StrategyId, Timeframe,
};
use candlelab_core::engine::{run_backtest, SimulationConfig};
use candlelab_core::replay::{replay_detection, verify, TradeOutcome, VerifyParams};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Up legs of 20 bars (+1.0), down legs of 10 bars (-1.2).
fn wave_uptrend(n: usize) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut close = dec!(100);
    (0..n)
        .map(|i| {
            let dir: i64 = if i == 0 {
                0
            } else if (i - 1) % 30 < 20 {
                1
            } else {
                -1
            };
            close += match dir {
                1 => dec!(1.0),
                -1 => dec!(-1.2),
                _ => Decimal::ZERO,
            };
            let open = close - dec!(0.3) * Decimal::from(dir);
            Bar::new(
                base + Duration::hours(i as i64),
                open,
                open.max(close) + dec!(0.1),
                open.min(close) - dec!(0.1),
                close,
                dec!(1000),
            )
            .unwrap()
        })
        .collect()
}

#[test]
fn every_entry_is_reproduced_and_verified_consistently() {
    let series = Series::new("SYN", Timeframe::H1, wave_uptrend(300)).unwrap();
    let mut params = DetectorParams::default();
    params.trend.adx_threshold = dec!(20);
    let agg = Aggregator::new(
        create_detectors(&[StrategyId::Trend], &params).unwrap(),
        PriorityOrder::default(),
    );
    let cfg = SimulationConfig::default();
    let result = run_backtest(&series, &agg, &cfg).unwrap();
    assert!(!result.trades.is_empty());

    for trade in &result.trades {
        let replay =
            replay_detection(&series, trade.entry_index, &agg, cfg.max_window, None).unwrap();
        let signal = replay.selected.expect("entry must be reproducible");
        assert_eq!(signal.price, trade.entry_price);
        assert_eq!(signal.stop_loss, trade.stop_loss);
        assert_eq!(signal.take_profit, trade.take_profit);

        let outcome = &series.bars()[trade.entry_index + 1..];
        let v1 = verify(&signal, outcome, &VerifyParams::default());
        let v2 = verify(&signal, outcome, &VerifyParams::default());
        assert_eq!(v1, v2);
        match (v1.outcome, trade.exit_reason) {
            (TradeOutcome::TargetHit { index }, ExitReason::TakeProfit)
            | (TradeOutcome::StopHit { index }, ExitReason::StopLoss) => {
                assert_eq!(trade.entry_index + 1 + index, trade.exit_index);
            }
            (TradeOutcome::Unresolved, ExitReason::EndOfData) => {}
            (o, r) => panic!("replay outcome {o:?} disagrees with exit {r:?}"),
        }
    }
}

fn arb_outcome() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((-100i64..100, 0i64..80, 0i64..80), 0..40).prop_map(|steps| {
        let base = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let mut close = dec!(100);
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (step, up, down))| {
                let open = close;
                close += Decimal::new(step, 2);
                Bar::new(
                    base + Duration::hours(i as i64),
                    open,
                    open.max(close) + Decimal::new(up, 2),
                    open.min(close) - Decimal::new(down, 2),
                    close,
                    dec!(100),
                )
                .unwrap()
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn verification_is_idempotent_and_bounded(outcome in arb_outcome(), short in any::<bool>()) {
        let side = if short { Side::Short } else { Side::Long };
        let signal = CandidateSignal {
            symbol: "SYN".into(),
            timeframe: Timeframe::H1,
            bar_index: 0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 23, 0, 0).unwrap(),
            side,
            price: dec!(100),
            stop_loss: dec!(100) - side.sign() * dec!(3),
            take_profit: dec!(100) + side.sign() * dec!(6),
            confidence: dec!(60),
            reason: String::new(),
            tags: Default::default(),
            details: SignalDetails::Vwap { vwap: dec!(100), previous_vwap: dec!(100) },
        };
        let a = verify(&signal, &outcome, &VerifyParams::default());
        let b = verify(&signal, &outcome, &VerifyParams::default());
        prop_assert_eq!(&a, &b);
        prop_assert!(a.matched <= a.checked);
        prop_assert!(a.confidence >= Decimal::ZERO && a.confidence <= Decimal::ONE_HUNDRED);
        prop_assert_eq!(a.checks.iter().filter(|c| c.matched.is_some()).count(), a.checked);
    }
}
