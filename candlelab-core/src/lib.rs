//! CandleLab Core — deterministic OHLCV signal detection and backtesting.
//!
//! This crate contains the pure engine; it performs no I/O:
//! - Domain types (bars, series, signals, zones, positions, trades)
//! - Indicator library and structural (smart-money) primitives
//! - Ten stateless strategy detectors behind one `Detector` trait
//! - Signal aggregation with an explicit priority order
//! - Bar-by-bar backtest simulator and metrics
//! - Replay: pattern re-verification and detection reproduction
//! - BLAKE3 run fingerprints

pub mod aggregator;
pub mod detectors;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod metrics;
pub mod replay;
pub mod smc;
