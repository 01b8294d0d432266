//! Parallel batches of independent runs.
//!
//! Jobs share nothing mutable, so running them on a rayon pool gives the same
//! reports as running them one by one. Outputs come back in job order.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use candlelab_core::domain::Series;

use crate::config::RunConfig;
use crate::runner::{run_single, RunError, RunReport};

/// One unit of batch work.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub label: String,
    pub config: RunConfig,
    pub series: Arc<Series>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub label: String,
    pub report: Result<RunReport, RunError>,
}

/// How a batch is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// The global rayon pool.
    #[default]
    Global,
    /// A dedicated pool of this many threads.
    Threads(usize),
    Sequential,
}

/// Run every job; one job's failure does not affect the others.
pub fn run_batch(jobs: &[BatchJob], parallelism: Parallelism) -> Vec<BatchOutcome> {
    info!(jobs = jobs.len(), ?parallelism, "batch started");
    let run = |job: &BatchJob| BatchOutcome {
        label: job.label.clone(),
        report: run_single(&job.config, &job.series),
    };

    let outcomes: Vec<BatchOutcome> = match parallelism {
        Parallelism::Sequential => jobs.iter().map(run).collect(),
        Parallelism::Global => jobs.par_iter().map(run).collect(),
        Parallelism::Threads(n) => {
            match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(|| jobs.par_iter().map(run).collect()),
                Err(e) => {
                    warn!(error = %e, threads = n, "thread pool unavailable, using global pool");
                    jobs.par_iter().map(run).collect()
                }
            }
        }
    };

    let failed = outcomes.iter().filter(|o| o.report.is_err()).count();
    info!(jobs = outcomes.len(), failed, "batch finished");
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Enabled;
    use crate::synthetic::{generate, SyntheticKind, SyntheticSpec};
    use candlelab_core::domain::StrategyId;

    fn jobs() -> Vec<BatchJob> {
        let walk = Arc::new(
            generate(&SyntheticSpec {
                count: 400,
                ..SyntheticSpec::new(SyntheticKind::RandomWalk)
            })
            .unwrap(),
        );
        let trend = Arc::new(
            generate(&SyntheticSpec {
                count: 300,
                ..SyntheticSpec::new(SyntheticKind::Uptrend)
            })
            .unwrap(),
        );
        let mut trend_only = RunConfig::default();
        trend_only.strategies.enabled = Enabled::Only(vec![StrategyId::Trend]);
        let mut broken = RunConfig::default();
        broken.run.symbol = Some("NOPE".into());

        vec![
            BatchJob {
                label: "walk-all".into(),
                config: RunConfig::default(),
                series: walk.clone(),
            },
            BatchJob {
                label: "trend-only".into(),
                config: trend_only,
                series: trend,
            },
            BatchJob {
                label: "mismatch".into(),
                config: broken,
                series: walk,
            },
        ]
    }

    #[test]
    fn parallel_matches_sequential_in_order() {
        let jobs = jobs();
        let seq = run_batch(&jobs, Parallelism::Sequential);
        let par = run_batch(&jobs, Parallelism::Threads(3));

        assert_eq!(seq.len(), 3);
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!(a.label, b.label);
            match (&a.report, &b.report) {
                (Ok(x), Ok(y)) => assert_eq!(x.fingerprint, y.fingerprint),
                (Err(_), Err(_)) => {}
                _ => panic!("{}: outcomes differ", a.label),
            }
        }
        let labels: Vec<&str> = par.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["walk-all", "trend-only", "mismatch"]);
    }

    #[test]
    fn failure_is_isolated() {
        let out = run_batch(&jobs(), Parallelism::Global);
        assert!(out[0].report.is_ok());
        assert!(out[1].report.is_ok());
        assert!(matches!(out[2].report, Err(RunError::SymbolMismatch { .. })));
    }

    #[test]
    fn empty_batch() {
        assert!(run_batch(&[], Parallelism::Global).is_empty());
    }
}
