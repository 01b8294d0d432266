//! Performance metrics derived from a trade ledger and its equity curve.
//!
//! A pure function of its inputs: the same ledger always yields the same
//! numbers, and drawdown is recomputed from the curve rather than carried
//! over from the simulator's running value. Sums and ratios saturate at the
//! `Decimal` limits rather than failing, so a degenerate ledger still reports.

use crate::domain::{saturating_div, saturating_sum, Side, TradeRecord};
use crate::engine::EquitySample;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

/// Gross profit over gross loss. `Infinite` when there are profits but no losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProfitFactor {
    Finite(Decimal),
    Infinite,
}

impl ProfitFactor {
    pub fn from_totals(gross_profit: Decimal, gross_loss: Decimal) -> Self {
        if gross_loss.is_zero() {
            if gross_profit > Decimal::ZERO {
                ProfitFactor::Infinite
            } else {
                ProfitFactor::Finite(Decimal::ZERO)
            }
        } else {
            ProfitFactor::Finite(saturating_div(gross_profit, gross_loss))
        }
    }
}

impl std::fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfitFactor::Finite(v) => write!(f, "{}", v.round_dp(2)),
            ProfitFactor::Infinite => f.write_str("inf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    /// Percent, 0 with no trades.
    pub win_rate: Decimal,
    pub net_profit: Decimal,
    pub total_return_pct: Decimal,
    pub gross_profit: Decimal,
    /// Positive magnitude.
    pub gross_loss: Decimal,
    pub profit_factor: ProfitFactor,
    pub average_win: Decimal,
    /// Positive magnitude.
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    /// Positive magnitude.
    pub largest_loss: Decimal,
    pub expectancy: Decimal,
    pub sharpe_ratio: Decimal,
    pub max_drawdown_pct: Decimal,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub average_bars_held: Decimal,
    pub total_commission: Decimal,
    pub total_slippage: Decimal,
}

const TRADING_DAYS: u32 = 252;

/// Compute the full metrics bundle.
pub fn compute_metrics(
    trades: &[TradeRecord],
    equity_curve: &[EquitySample],
    initial_balance: Decimal,
) -> Metrics {
    let total = trades.len();
    let winners: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.is_winner())
        .map(|t| t.net_pnl)
        .collect();
    let losers: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.net_pnl < Decimal::ZERO)
        .map(|t| -t.net_pnl)
        .collect();

    let gross_profit = saturating_sum(winners.iter().copied());
    let gross_loss = saturating_sum(losers.iter().copied());
    let net_profit = saturating_sum(trades.iter().map(|t| t.net_pnl));
    let average_win = average(&winners);
    let average_loss = average(&losers);

    let win_rate = if total == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(winners.len()) / Decimal::from(total) * Decimal::ONE_HUNDRED
    };
    let win_fraction = win_rate / Decimal::ONE_HUNDRED;
    let expectancy = if total == 0 {
        Decimal::ZERO
    } else {
        win_fraction * average_win - (Decimal::ONE - win_fraction) * average_loss
    };

    let total_return_pct = if initial_balance.is_zero() {
        Decimal::ZERO
    } else {
        saturating_div(net_profit, initial_balance).saturating_mul(Decimal::ONE_HUNDRED)
    };
    let (max_consecutive_wins, max_consecutive_losses) = streaks(trades);
    let average_bars_held = if total == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(trades.iter().map(|t| t.bars_held).sum::<usize>()) / Decimal::from(total)
    };

    Metrics {
        total_trades: total,
        winning_trades: winners.len(),
        losing_trades: losers.len(),
        long_trades: trades.iter().filter(|t| t.side == Side::Long).count(),
        short_trades: trades.iter().filter(|t| t.side == Side::Short).count(),
        win_rate,
        net_profit,
        total_return_pct,
        gross_profit,
        gross_loss,
        profit_factor: ProfitFactor::from_totals(gross_profit, gross_loss),
        average_win,
        average_loss,
        largest_win: winners.iter().copied().max().unwrap_or(Decimal::ZERO),
        largest_loss: losers.iter().copied().max().unwrap_or(Decimal::ZERO),
        expectancy,
        sharpe_ratio: sharpe_ratio(trades),
        max_drawdown_pct: max_drawdown_pct(equity_curve, initial_balance),
        max_consecutive_wins,
        max_consecutive_losses,
        average_bars_held,
        total_commission: saturating_sum(trades.iter().map(|t| t.commission)),
        total_slippage: saturating_sum(trades.iter().map(|t| t.slippage_cost)),
    }
}

fn average(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    saturating_sum(values.iter().copied()) / Decimal::from(values.len())
}

/// Annualized Sharpe over per-trade percent returns, sample standard
/// deviation. 0 with fewer than two trades or zero dispersion.
pub fn sharpe_ratio(trades: &[TradeRecord]) -> Decimal {
    if trades.len() < 2 {
        return Decimal::ZERO;
    }
    let returns: Vec<Decimal> = trades.iter().map(|t| t.return_pct()).collect();
    let mean = average(&returns);
    let n = Decimal::from(returns.len() - 1);
    let squares = returns.iter().map(|r| {
        let d = r.saturating_sub(mean);
        d.saturating_mul(d)
    });
    let variance = saturating_sum(squares) / n;
    let Some(std_dev) = variance.sqrt() else {
        return Decimal::ZERO;
    };
    if std_dev.is_zero() {
        return Decimal::ZERO;
    }
    let annualize = Decimal::from(TRADING_DAYS).sqrt().unwrap_or(Decimal::ONE);
    saturating_div(mean, std_dev).saturating_mul(annualize)
}

/// Largest peak-to-trough decline of the realized balance, in percent.
/// The initial balance is the first peak.
pub fn max_drawdown_pct(equity_curve: &[EquitySample], initial_balance: Decimal) -> Decimal {
    let mut peak = initial_balance;
    let mut worst = Decimal::ZERO;
    for sample in equity_curve {
        peak = peak.max(sample.balance);
        if peak > Decimal::ZERO {
            let fall = saturating_div(peak.saturating_sub(sample.balance), peak);
            worst = worst.max(fall.saturating_mul(Decimal::ONE_HUNDRED));
        }
    }
    worst
}

/// Longest runs of winners and of losers. A break-even trade ends both.
fn streaks(trades: &[TradeRecord]) -> (usize, usize) {
    let (mut wins, mut losses, mut max_wins, mut max_losses) = (0, 0, 0, 0);
    for t in trades {
        if t.net_pnl > Decimal::ZERO {
            wins += 1;
            losses = 0;
        } else if t.net_pnl < Decimal::ZERO {
            losses += 1;
            wins = 0;
        } else {
            wins = 0;
            losses = 0;
        }
        max_wins = max_wins.max(wins);
        max_losses = max_losses.max(losses);
    }
    (max_wins, max_losses)
}
