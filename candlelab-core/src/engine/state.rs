//! Account state that evolves bar by bar during one run.

use super::config::MAX_BALANCE;
use super::exits::ExitDecision;
use super::result::EquitySample;
use crate::domain::{Bar, ExitFill, ExitReason, Position, TradeRecord};
use rust_decimal::Decimal;
use thiserror::Error;

/// Run-level invariant failures. These end the run as aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("a position is already open")]
    AlreadyOpen,
    #[error("balance left the supported range")]
    Overflow,
    #[error("balance exhausted ({0})")]
    BalanceExhausted(Decimal),
}

/// Realized balance, the one open position, the ledger and the equity curve.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub balance: Decimal,
    pub peak: Decimal,
    pub position: Option<Position>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquitySample>,
}

impl AccountState {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: initial_balance,
            peak: initial_balance,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Enter `position`, charging its entry commission.
    pub fn open(&mut self, position: Position) -> Result<(), StateError> {
        if self.position.is_some() {
            return Err(StateError::AlreadyOpen);
        }
        self.apply(-position.entry_commission)?;
        self.position = Some(position);
        Ok(())
    }

    /// Close the open position (if any) with a triggered exit on `bar`.
    pub fn close(
        &mut self,
        index: usize,
        bar: &Bar,
        exit: ExitDecision,
        commission: Decimal,
    ) -> Result<Option<&TradeRecord>, StateError> {
        let Some(position) = self.position.take() else {
            return Ok(None);
        };
        let trade = position.close(ExitFill {
            index,
            time: bar.timestamp,
            price: exit.price,
            reason: exit.reason,
            commission,
            slippage_cost: exit.slippage_cost,
        });
        // Entry commission was charged when the position opened.
        let balance = self.balance.checked_add(trade.gross_pnl - commission);
        self.trades.push(trade);
        self.balance = balance.ok_or(StateError::Overflow)?;
        if self.balance > MAX_BALANCE {
            return Err(StateError::Overflow);
        }
        if self.balance <= Decimal::ZERO {
            return Err(StateError::BalanceExhausted(self.balance));
        }
        Ok(self.trades.last())
    }

    /// Force-close at the bar's close with no slippage.
    pub fn close_at_end(
        &mut self,
        index: usize,
        bar: &Bar,
        commission: Decimal,
    ) -> Result<Option<&TradeRecord>, StateError> {
        let exit = ExitDecision {
            reason: ExitReason::EndOfData,
            price: bar.close,
            slippage_cost: Decimal::ZERO,
        };
        self.close(index, bar, exit, commission)
    }

    /// Append one equity sample for `bar`.
    pub fn sample(&mut self, bar: &Bar) {
        let unrealized = self
            .position
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.unrealized_pnl(bar.close));
        let drawdown_pct = self.drawdown_pct();
        self.equity_curve.push(EquitySample {
            timestamp: bar.timestamp,
            balance: self.balance,
            equity: self.balance + unrealized,
            drawdown_pct,
        });
    }

    /// Rewrite the last sample after a flat close on its bar.
    pub fn restate_last_sample(&mut self) {
        let drawdown_pct = self.drawdown_pct();
        let balance = self.balance;
        if let Some(sample) = self.equity_curve.last_mut() {
            sample.balance = balance;
            sample.equity = balance;
            sample.drawdown_pct = drawdown_pct;
        }
    }

    /// Raise the peak to the current balance and return the decline from it.
    fn drawdown_pct(&mut self) -> Decimal {
        self.peak = self.peak.max(self.balance);
        if self.peak > Decimal::ZERO {
            (self.peak - self.balance) / self.peak * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }

    fn apply(&mut self, delta: Decimal) -> Result<(), StateError> {
        self.balance = self.balance.checked_add(delta).ok_or(StateError::Overflow)?;
        Ok(())
    }
}
