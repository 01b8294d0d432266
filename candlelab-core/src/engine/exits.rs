//! Stop-loss / take-profit resolution against one bar.

use super::config::IntrabarPolicy;
use crate::domain::{Bar, ExitReason, Position, Side};
use rust_decimal::Decimal;

/// A triggered exit, before commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitDecision {
    pub reason: ExitReason,
    /// Fill price including slippage.
    pub price: Decimal,
    /// Slippage cost in account currency.
    pub slippage_cost: Decimal,
}

/// Check `bar`'s range against the position's stop and target.
///
/// A stop gapped through at the open fills at the open. Slippage always
/// moves the fill against the position.
pub fn check_exit(
    position: &Position,
    bar: &Bar,
    policy: IntrabarPolicy,
    slippage: Decimal,
) -> Option<ExitDecision> {
    let (stop_hit, target_hit, stop_fill) = match position.side {
        Side::Long => (
            bar.low <= position.stop_loss,
            bar.high >= position.take_profit,
            bar.open.min(position.stop_loss),
        ),
        Side::Short => (
            bar.high >= position.stop_loss,
            bar.low <= position.take_profit,
            bar.open.max(position.stop_loss),
        ),
    };

    let (reason, raw) = match (stop_hit, target_hit, policy) {
        (true, true, IntrabarPolicy::TargetFirst) | (false, true, _) => {
            (ExitReason::TakeProfit, position.take_profit)
        }
        (true, _, _) => (ExitReason::StopLoss, stop_fill),
        (false, false, _) => return None,
    };

    // Adverse: a long sells lower, a short buys higher.
    let price = raw - position.side.sign() * slippage;
    Some(ExitDecision {
        reason,
        price,
        slippage_cost: slippage * position.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidateSignal, SignalDetails, Timeframe};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn position(side: Side, entry: Decimal, stop: Decimal, target: Decimal) -> Position {
        let signal = CandidateSignal {
            symbol: "EURUSD".into(),
            timeframe: Timeframe::H1,
            bar_index: 0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            side,
            price: entry,
            stop_loss: stop,
            take_profit: target,
            confidence: dec!(70),
            reason: String::new(),
            tags: Default::default(),
            details: SignalDetails::Vwap {
                vwap: entry,
                previous_vwap: entry,
            },
        };
        Position::open(signal, dec!(1000), dec!(0)).unwrap()
    }

    fn bar(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap(),
            open,
            high,
            low,
            close,
            dec!(0),
        )
        .unwrap()
    }

    #[test]
    fn wide_bar_touching_stop_closes_as_stop() {
        let pos = position(Side::Long, dec!(1.1000), dec!(1.0950), dec!(1.1050));
        let b = bar(dec!(1.1000), dec!(1.1010), dec!(1.0950), dec!(1.1005));
        let exit = check_exit(&pos, &b, IntrabarPolicy::StopFirst, Decimal::ZERO).unwrap();
        assert_eq!(exit.reason, ExitReason::StopLoss);
        assert_eq!(exit.price, dec!(1.0950));
    }

    #[test]
    fn both_levels_in_range_follow_policy() {
        let pos = position(Side::Long, dec!(1.1000), dec!(1.0950), dec!(1.1050));
        let b = bar(dec!(1.1000), dec!(1.1060), dec!(1.0940), dec!(1.1000));
        let stop_first = check_exit(&pos, &b, IntrabarPolicy::StopFirst, Decimal::ZERO).unwrap();
        assert_eq!(stop_first.reason, ExitReason::StopLoss);
        let target_first =
            check_exit(&pos, &b, IntrabarPolicy::TargetFirst, Decimal::ZERO).unwrap();
        assert_eq!(target_first.reason, ExitReason::TakeProfit);
        assert_eq!(target_first.price, dec!(1.1050));
    }

    #[test]
    fn gap_through_stop_fills_at_open() {
        let pos = position(Side::Long, dec!(100), dec!(95), dec!(110));
        let b = bar(dec!(92), dec!(93), dec!(90), dec!(91));
        let exit = check_exit(&pos, &b, IntrabarPolicy::StopFirst, Decimal::ZERO).unwrap();
        assert_eq!(exit.price, dec!(92));

        let short = position(Side::Short, dec!(100), dec!(105), dec!(90));
        let b = bar(dec!(107), dec!(108), dec!(106), dec!(107));
        let exit = check_exit(&short, &b, IntrabarPolicy::StopFirst, Decimal::ZERO).unwrap();
        assert_eq!(exit.reason, ExitReason::StopLoss);
        assert_eq!(exit.price, dec!(107));
    }

    #[test]
    fn slippage_is_adverse_for_both_sides() {
        let long = position(Side::Long, dec!(100), dec!(95), dec!(110));
        let b = bar(dec!(105), dec!(111), dec!(104), dec!(110));
        let exit = check_exit(&long, &b, IntrabarPolicy::StopFirst, dec!(0.5)).unwrap();
        assert_eq!(exit.price, dec!(109.5));
        assert_eq!(exit.slippage_cost, dec!(500));

        let short = position(Side::Short, dec!(100), dec!(105), dec!(90));
        let b = bar(dec!(95), dec!(96), dec!(89), dec!(90));
        let exit = check_exit(&short, &b, IntrabarPolicy::StopFirst, dec!(0.5)).unwrap();
        assert_eq!(exit.reason, ExitReason::TakeProfit);
        assert_eq!(exit.price, dec!(90.5));
    }

    #[test]
    fn inside_bar_keeps_position_open() {
        let pos = position(Side::Long, dec!(100), dec!(95), dec!(110));
        let b = bar(dec!(100), dec!(104), dec!(97), dec!(101));
        assert!(check_exit(&pos, &b, IntrabarPolicy::StopFirst, Decimal::ZERO).is_none());
    }
}
