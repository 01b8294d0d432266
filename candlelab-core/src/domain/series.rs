//! Series — an ordered sequence of bars for one (symbol, timeframe).

use super::bar::{Bar, BarError};
use super::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("bar {index}: {source}")]
    InvalidBar {
        index: usize,
        #[source]
        source: BarError,
    },
    #[error("bar {index}: timestamp {timestamp} is not after the previous bar ({previous})")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
    #[error("bar {index}: duplicate timestamp {timestamp}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Validated, strictly time-ordered bars. Gaps in time are allowed; disorder is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.validate()
                .map_err(|source| SeriesError::InvalidBar { index, source })?;
            if index == 0 {
                continue;
            }
            let previous = bars[index - 1].timestamp;
            if bar.timestamp == previous {
                return Err(SeriesError::DuplicateTimestamp {
                    index,
                    timestamp: bar.timestamp,
                });
            }
            if bar.timestamp < previous {
                return Err(SeriesError::OutOfOrder {
                    index,
                    timestamp: bar.timestamp,
                    previous,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Bars `[start, end]` of the trailing window that ends at `end`, at most
    /// `max_len` long. Returns the window and the absolute index of its first bar.
    pub fn window_ending_at(&self, end: usize, max_len: usize) -> (&[Bar], usize) {
        let end = end.min(self.bars.len().saturating_sub(1));
        let start = (end + 1).saturating_sub(max_len.max(1));
        if self.bars.is_empty() {
            return (&[], 0);
        }
        (&self.bars[start..=end], start)
    }
}

/// Deserialization re-runs validation so a stored series cannot bypass the ordering checks.
impl<'de> Deserialize<'de> for Series {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            symbol: String,
            timeframe: Timeframe,
            bars: Vec<Bar>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Series::new(raw.symbol, raw.timeframe, raw.bars).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn bar_at(minutes: i64) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        Bar::new(ts, dec!(10), dec!(11), dec!(9), dec!(10.5), dec!(100)).unwrap()
    }

    #[test]
    fn accepts_ordered_bars_with_gaps() {
        let bars = vec![bar_at(0), bar_at(15), bar_at(90)];
        let series = Series::new("EURUSD", Timeframe::M15, bars).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "EURUSD");
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let err = Series::new("EURUSD", Timeframe::M15, vec![bar_at(0), bar_at(0)]).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateTimestamp { index: 1, .. }));
    }

    #[test]
    fn rejects_out_of_order() {
        let err = Series::new("EURUSD", Timeframe::M15, vec![bar_at(30), bar_at(15)]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn rejects_invalid_bar_with_index() {
        let mut bad = bar_at(15);
        bad.low = dec!(12);
        let err = Series::new("EURUSD", Timeframe::M15, vec![bar_at(0), bad]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidBar { index: 1, .. }));
    }

    #[test]
    fn trailing_window() {
        let bars: Vec<Bar> = (0..10).map(|i| bar_at(i * 15)).collect();
        let series = Series::new("EURUSD", Timeframe::M15, bars).unwrap();
        let (window, start) = series.window_ending_at(7, 3);
        assert_eq!(start, 5);
        assert_eq!(window.len(), 3);
        let (window, start) = series.window_ending_at(1, 5);
        assert_eq!(start, 0);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn deserialization_validates_order() {
        let json = serde_json::json!({
            "symbol": "X",
            "timeframe": "15m",
            "bars": [bar_at(15), bar_at(0)],
        });
        assert!(serde_json::from_value::<Series>(json).is_err());
    }
}
