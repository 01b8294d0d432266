//! Backtest simulator: the bar-by-bar state machine and its supporting pieces.
//!
//! Per processed bar:
//!
//! 1. Open: fold the bar into MAE/MFE, then resolve stop/target against its range
//! 2. Flat: aggregate detector output for the window ending at the bar, size, enter
//! 3. Record one equity sample
//!
//! The run ends `Completed` (with a forced end-of-data close), `Cancelled`,
//! or `Aborted` on an account invariant failure.

pub mod cancel;
pub mod config;
pub mod exits;
pub mod result;
pub mod simulator;
pub mod sizing;
pub mod state;

pub use cancel::CancelFlag;
pub use config::{ConfigError, IntrabarPolicy, SimulationConfig, MAX_BALANCE, MAX_WINDOW};
pub use exits::{check_exit, ExitDecision};
pub use result::{BacktestResult, BarRef, EquitySample, RunCounters, RunStatus};
pub use simulator::{run_backtest, run_backtest_with_cancel};
pub use sizing::{position_size, SizingError, MAX_POSITION_SIZE};
pub use state::{AccountState, StateError};
