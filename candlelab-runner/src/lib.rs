//! CandleLab Runner — run orchestration on top of `candlelab-core`.
//!
//! - TOML run configuration (`RunConfig`)
//! - Single runs with fingerprints (`run_single`)
//! - Parallel batches that preserve job order (`run_batch`)
//! - Deterministic synthetic series
//! - JSON / CSV / Markdown export

pub mod batch;
pub mod config;
pub mod export;
pub mod runner;
pub mod synthetic;

pub use batch::{run_batch, BatchJob, BatchOutcome, Parallelism};
pub use config::{ConfigError, Enabled, RunConfig, RunSection, StrategySelection};
pub use export::{
    export_equity_csv, export_json, export_trades_csv, generate_comparison, generate_report,
    import_json, load_artifacts, save_artifacts,
};
pub use runner::{run_single, run_single_with_cancel, RunError, RunReport, SCHEMA_VERSION};
pub use synthetic::{generate, SyntheticKind, SyntheticSpec};
