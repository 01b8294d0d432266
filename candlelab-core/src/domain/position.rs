//! Open position state for the simulator.
//!
//! A `Position` only exists while open. Closing consumes it and yields an
//! immutable [`TradeRecord`], so a closed trade cannot be mutated again.

use super::bar::Bar;
use super::signal::{CandidateSignal, Side};
use super::trade::TradeRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("position size must be positive, got {0}")]
    NonPositiveSize(Decimal),
    #[error("stop distance must be positive (entry={entry}, stop={stop})")]
    ZeroStopDistance { entry: Decimal, stop: Decimal },
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => f.write_str("stop loss"),
            ExitReason::TakeProfit => f.write_str("take profit"),
            ExitReason::EndOfData => f.write_str("end of data"),
        }
    }
}

/// An open position. Invariant: `size > 0` and `|entry - stop| > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub entry_commission: Decimal,
    /// Maximum adverse excursion in account currency (>= 0, never decreases).
    pub mae: Decimal,
    /// Maximum favorable excursion in account currency (>= 0, never decreases).
    pub mfe: Decimal,
    pub signal: CandidateSignal,
}

impl Position {
    /// Open a position from an accepted signal.
    pub fn open(
        signal: CandidateSignal,
        size: Decimal,
        entry_commission: Decimal,
    ) -> Result<Self, PositionError> {
        if size <= Decimal::ZERO {
            return Err(PositionError::NonPositiveSize(size));
        }
        if signal.risk() <= Decimal::ZERO {
            return Err(PositionError::ZeroStopDistance {
                entry: signal.price,
                stop: signal.stop_loss,
            });
        }
        Ok(Self {
            side: signal.side,
            entry_index: signal.bar_index,
            entry_time: signal.timestamp,
            entry_price: signal.price,
            size,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            entry_commission,
            mae: Decimal::ZERO,
            mfe: Decimal::ZERO,
            signal,
        })
    }

    /// Unrealized P&L at `price`.
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        (price - self.entry_price) * self.side.sign() * self.size
    }

    /// Fold one bar's extremes into MAE/MFE.
    pub fn update_excursions(&mut self, bar: &Bar) {
        let (worst, best) = match self.side {
            Side::Long => (bar.low, bar.high),
            Side::Short => (bar.high, bar.low),
        };
        let adverse = (-self.unrealized_pnl(worst)).max(Decimal::ZERO);
        let favorable = self.unrealized_pnl(best).max(Decimal::ZERO);
        self.mae = self.mae.max(adverse);
        self.mfe = self.mfe.max(favorable);
    }

    /// Initial risk in account currency.
    pub fn initial_risk(&self) -> Decimal {
        (self.entry_price - self.stop_loss).abs() * self.size
    }

    /// Close the position, consuming it.
    pub fn close(self, exit: ExitFill) -> TradeRecord {
        let gross_pnl = self.unrealized_pnl(exit.price);
        let commission = self.entry_commission + exit.commission;
        let net_pnl = gross_pnl - commission;
        TradeRecord {
            symbol: self.signal.symbol.clone(),
            timeframe: self.signal.timeframe,
            strategy: self.signal.strategy(),
            side: self.side,
            entry_index: self.entry_index,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            exit_index: exit.index,
            exit_time: exit.time,
            exit_price: exit.price,
            size: self.size,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            gross_pnl,
            commission,
            slippage_cost: exit.slippage_cost,
            net_pnl,
            bars_held: exit.index.saturating_sub(self.entry_index),
            mae: self.mae,
            mfe: self.mfe,
            exit_reason: exit.reason,
            confidence: self.signal.confidence,
            signal_reason: self.signal.reason,
        }
    }
}

/// Everything known about an exit at the moment it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitFill {
    pub index: usize,
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub reason: ExitReason,
    pub commission: Decimal,
    pub slippage_cost: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{SignalDetails, StructureTag};
    use crate::domain::timeframe::Timeframe;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn signal(side: Side, price: Decimal, stop: Decimal, target: Decimal) -> CandidateSignal {
        CandidateSignal {
            symbol: "EURUSD".into(),
            timeframe: Timeframe::H1,
            bar_index: 10,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
            side,
            price,
            stop_loss: stop,
            take_profit: target,
            confidence: dec!(60),
            reason: "test".into(),
            tags: [StructureTag::Crossover].into_iter().collect(),
            details: SignalDetails::Vwap {
                vwap: price,
                previous_vwap: price,
            },
        }
    }

    fn bar(high: Decimal, low: Decimal) -> Bar {
        Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 11, 0, 0).unwrap(),
            low,
            high,
            low,
            high,
            dec!(0),
        )
        .unwrap()
    }

    #[test]
    fn open_rejects_non_positive_size() {
        let s = signal(Side::Long, dec!(100), dec!(95), dec!(110));
        assert_eq!(
            Position::open(s, dec!(0), dec!(0)),
            Err(PositionError::NonPositiveSize(dec!(0)))
        );
    }

    #[test]
    fn open_rejects_zero_stop_distance() {
        let s = signal(Side::Long, dec!(100), dec!(100), dec!(110));
        assert!(matches!(
            Position::open(s, dec!(1), dec!(0)),
            Err(PositionError::ZeroStopDistance { .. })
        ));
    }

    #[test]
    fn excursions_are_monotonic_for_long() {
        let s = signal(Side::Long, dec!(100), dec!(95), dec!(110));
        let mut pos = Position::open(s, dec!(2), dec!(0)).unwrap();
        pos.update_excursions(&bar(dec!(104), dec!(98)));
        assert_eq!(pos.mae, dec!(4));
        assert_eq!(pos.mfe, dec!(8));
        pos.update_excursions(&bar(dec!(101), dec!(99)));
        assert_eq!(pos.mae, dec!(4));
        assert_eq!(pos.mfe, dec!(8));
        pos.update_excursions(&bar(dec!(107), dec!(96)));
        assert_eq!(pos.mae, dec!(8));
        assert_eq!(pos.mfe, dec!(14));
    }

    #[test]
    fn excursions_for_short_use_mirrored_extremes() {
        let s = signal(Side::Short, dec!(100), dec!(105), dec!(90));
        let mut pos = Position::open(s, dec!(1), dec!(0)).unwrap();
        pos.update_excursions(&bar(dec!(103), dec!(97)));
        assert_eq!(pos.mae, dec!(3));
        assert_eq!(pos.mfe, dec!(3));
    }

    #[test]
    fn close_computes_net_pnl() {
        let s = signal(Side::Short, dec!(100), dec!(105), dec!(90));
        let pos = Position::open(s, dec!(10), dec!(1.5)).unwrap();
        let trade = pos.close(ExitFill {
            index: 14,
            time: Utc.with_ymd_and_hms(2024, 1, 2, 14, 0, 0).unwrap(),
            price: dec!(90),
            reason: ExitReason::TakeProfit,
            commission: dec!(1.5),
            slippage_cost: dec!(0),
        });
        assert_eq!(trade.gross_pnl, dec!(100));
        assert_eq!(trade.commission, dec!(3));
        assert_eq!(trade.net_pnl, dec!(97));
        assert_eq!(trade.bars_held, 4);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::EndOfData.to_string(), "end of data");
    }
}
