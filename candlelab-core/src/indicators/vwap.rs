//! Volume-Weighted Average Price.
//!
//! Cumulative (typical price × volume) / cumulative volume, reset at each
//! session boundary. Undefined while the session has seen no volume.

use super::{Indicator, IndicatorError};
use crate::domain::Bar;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where the cumulative sums restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionReset {
    /// Calendar day in UTC.
    #[default]
    Daily,
    /// Never reset: VWAP anchored at the first bar.
    Never,
}

impl SessionReset {
    fn session_key(self, ts: DateTime<Utc>) -> Option<NaiveDate> {
        match self {
            SessionReset::Daily => Some(ts.date_naive()),
            SessionReset::Never => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vwap {
    reset: SessionReset,
    name: String,
}

impl Vwap {
    pub fn new(reset: SessionReset) -> Self {
        let name = match reset {
            SessionReset::Daily => "vwap_daily",
            SessionReset::Never => "vwap_anchored",
        };
        Self {
            reset,
            name: name.to_string(),
        }
    }
}

impl Default for Vwap {
    fn default() -> Self {
        Self::new(SessionReset::Daily)
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    /// On overflow the session has no value from that bar on; use
    /// [`Vwap::try_compute`] to see the failure.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        self.accumulate(bars).0
    }
}

impl Vwap {
    /// Like `compute`, but a session whose sums leave the `Decimal` range is
    /// an error rather than a gap.
    pub fn try_compute(&self, bars: &[Bar]) -> Result<Vec<Option<Decimal>>, IndicatorError> {
        match self.accumulate(bars) {
            (_, Some(index)) => Err(IndicatorError::Overflow { index }),
            (values, None) => Ok(values),
        }
    }

    /// Values per bar, plus the index of the first bar whose sums overflowed.
    fn accumulate(&self, bars: &[Bar]) -> (Vec<Option<Decimal>>, Option<usize>) {
        let mut result = Vec::with_capacity(bars.len());
        let mut first_overflow = None;
        let mut session = None;
        // `None` once the session's sums overflowed.
        let mut sums = Some((Decimal::ZERO, Decimal::ZERO));

        for (i, bar) in bars.iter().enumerate() {
            let key = self.reset.session_key(bar.timestamp);
            if i == 0 || key != session {
                session = key;
                sums = Some((Decimal::ZERO, Decimal::ZERO));
            }
            if let Some((pv, volume)) = sums {
                sums = bar
                    .typical_price()
                    .checked_mul(bar.volume)
                    .and_then(|x| pv.checked_add(x))
                    .zip(volume.checked_add(bar.volume));
                if sums.is_none() && first_overflow.is_none() {
                    first_overflow = Some(i);
                }
            }
            result.push(
                sums.filter(|(_, volume)| !volume.is_zero())
                    .map(|(pv, volume)| pv / volume),
            );
        }
        (result, first_overflow)
    }
}
