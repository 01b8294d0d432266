//! Synthetic series are always valid input for the engine.

use candlelab_runner::{generate, run_single, RunConfig, SyntheticKind, SyntheticSpec};
use proptest::prelude::*;

proptest! {
    #[test]
    fn random_walk_is_valid_and_reproducible(seed in any::<u64>(), count in 0usize..400) {
        let spec = SyntheticSpec {
            seed,
            count,
            ..SyntheticSpec::new(SyntheticKind::RandomWalk)
        };
        let a = generate(&spec).unwrap();
        let b = generate(&spec).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), count);
        for bar in a.bars() {
            prop_assert!(bar.low <= bar.open.min(bar.close));
            prop_assert!(bar.high >= bar.open.max(bar.close));
            prop_assert!(bar.low > rust_decimal::Decimal::ZERO);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_random_walk_runs_to_completion(seed in any::<u64>()) {
        let series = generate(&SyntheticSpec {
            seed,
            count: 300,
            ..SyntheticSpec::new(SyntheticKind::RandomWalk)
        })
        .unwrap();
        let report = run_single(&RunConfig::default(), &series).unwrap();
        prop_assert!(report.result.status.is_completed());
        prop_assert!(report.result.final_balance > rust_decimal::Decimal::ZERO);
    }
}
