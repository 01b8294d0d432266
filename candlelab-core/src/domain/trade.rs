//! TradeRecord — a completed round-trip trade with full traceability.

use super::position::ExitReason;
use super::signal::{Side, StrategyId};
use super::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A closed position: entry → exit. Appended to the trade ledger and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub symbol: String,
    pub timeframe: Timeframe,
    pub strategy: StrategyId,
    pub side: Side,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: Decimal,

    // ── Size and levels ──
    pub size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,

    // ── PnL ──
    pub gross_pnl: Decimal,
    /// Entry plus exit commission.
    pub commission: Decimal,
    /// Cost of adverse exit slippage (already inside `gross_pnl`).
    pub slippage_cost: Decimal,
    pub net_pnl: Decimal,

    // ── Duration ──
    pub bars_held: usize,

    // ── Excursion ──
    pub mae: Decimal,
    pub mfe: Decimal,

    pub exit_reason: ExitReason,
    pub confidence: Decimal,
    pub signal_reason: String,
}

impl TradeRecord {
    /// Net return as a percentage of entry notional.
    pub fn return_pct(&self) -> Decimal {
        let notional = self.entry_price.saturating_mul(self.size);
        if notional.is_zero() {
            return Decimal::ZERO;
        }
        saturating_div(self.net_pnl, notional).saturating_mul(Decimal::ONE_HUNDRED)
    }

    /// Net P&L in units of initial risk.
    pub fn r_multiple(&self) -> Decimal {
        let risk = (self.entry_price - self.stop_loss).abs().saturating_mul(self.size);
        if risk.is_zero() {
            return Decimal::ZERO;
        }
        saturating_div(self.net_pnl, risk)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > Decimal::ZERO
    }
}

/// `a / b`, pinned to `Decimal::MAX` or `Decimal::MIN` when the quotient is
/// unrepresentable. `b` must be nonzero.
pub(crate) fn saturating_div(a: Decimal, b: Decimal) -> Decimal {
    a.checked_div(b).unwrap_or(if a.is_sign_negative() == b.is_sign_negative() {
        Decimal::MAX
    } else {
        Decimal::MIN
    })
}

pub(crate) fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}
