//! Replay: re-check a recorded signal against what price did afterwards, and
//! re-run detection at a historical bar.
//!
//! Both are pure functions of stored data, so repeated runs always agree.

pub mod reproduce;
pub mod verifier;

pub use reproduce::{replay_detection, ReplayError, ReplayOutcome};
pub use verifier::{
    verify, PatternCheck, PatternKind, TradeOutcome, VerificationResult, VerifyParams,
};
