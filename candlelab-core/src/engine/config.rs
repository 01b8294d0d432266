//! Simulation configuration, threaded explicitly into every run.

use crate::domain::MAX_PRICE;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted starting balance. A run whose balance grows past it aborts.
pub const MAX_BALANCE: Decimal = dec!(1000000000000000000);

/// Longest detector window, and the longest indicator period.
pub const MAX_WINDOW: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Resolution of a bar where both the stop and the target are inside its range.
///
/// OHLC data cannot tell which was reached first, so this is a policy choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrabarPolicy {
    /// Assume the stop was hit first (conservative).
    #[default]
    StopFirst,
    TargetFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub initial_balance: Decimal,
    /// Percent of current balance risked per trade.
    pub risk_per_trade_pct: Decimal,
    /// Percent of notional charged at entry and again at exit.
    pub commission_pct: Decimal,
    pub slippage_pips: Decimal,
    pub pip_size: Decimal,
    /// Bars handed to detectors; the window ends at the current bar.
    pub max_window: usize,
    /// Extra warm-up on top of the detectors' own minimum window.
    pub warmup_bars: usize,
    pub intrabar_policy: IntrabarPolicy,
    /// Position size is truncated toward zero to this many decimal places.
    pub size_decimals: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            risk_per_trade_pct: dec!(1.0),
            commission_pct: Decimal::ZERO,
            slippage_pips: Decimal::ZERO,
            pip_size: dec!(0.0001),
            max_window: 250,
            warmup_bars: 0,
            intrabar_policy: IntrabarPolicy::StopFirst,
            size_decimals: 8,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_balance <= Decimal::ZERO || self.initial_balance > MAX_BALANCE {
            return Err(ConfigError::invalid(
                "initial_balance",
                format!("must be in (0, {MAX_BALANCE}], got {}", self.initial_balance),
            ));
        }
        if self.risk_per_trade_pct <= Decimal::ZERO
            || self.risk_per_trade_pct > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::invalid(
                "risk_per_trade_pct",
                format!("must be in (0, 100], got {}", self.risk_per_trade_pct),
            ));
        }
        if self.commission_pct < Decimal::ZERO || self.commission_pct > Decimal::ONE_HUNDRED {
            return Err(ConfigError::invalid("commission_pct", "must be in [0, 100]"));
        }
        if self.slippage_pips < Decimal::ZERO {
            return Err(ConfigError::invalid("slippage_pips", "must not be negative"));
        }
        if self.pip_size <= Decimal::ZERO {
            return Err(ConfigError::invalid("pip_size", "must be positive"));
        }
        match self.slippage_pips.checked_mul(self.pip_size) {
            Some(slippage) if slippage <= MAX_PRICE => {}
            _ => {
                return Err(ConfigError::invalid(
                    "slippage_pips",
                    format!("slippage_pips × pip_size must not exceed {MAX_PRICE}"),
                ))
            }
        }
        if !(3..=MAX_WINDOW).contains(&self.max_window) {
            return Err(ConfigError::invalid(
                "max_window",
                format!("must be in [3, {MAX_WINDOW}], got {}", self.max_window),
            ));
        }
        if self.size_decimals > 18 {
            return Err(ConfigError::invalid("size_decimals", "must be at most 18"));
        }
        Ok(())
    }

    /// Price distance of the configured slippage.
    pub fn slippage(&self) -> Decimal {
        self.slippage_pips * self.pip_size
    }

    /// Commission on a fill of `size` units at `price`.
    pub fn commission(&self, price: Decimal, size: Decimal) -> Decimal {
        price * size * (self.commission_pct / Decimal::ONE_HUNDRED)
    }
}
