//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted price. Keeps price × size and price² sums inside the
/// `Decimal` range for every window the engine evaluates.
pub const MAX_PRICE: Decimal = dec!(1000000000000);

/// Largest accepted volume per bar.
pub const MAX_VOLUME: Decimal = dec!(1000000000000000);

/// Rejection reasons for a single bar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarError {
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must be positive, got {value}")]
    NonPositivePrice { field: &'static str, value: Decimal },
    #[error("volume must be >= 0, got {0}")]
    NegativeVolume(Decimal),
    #[error("{field} = {value} exceeds the supported maximum {max}")]
    OutOfRange {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },
    #[error("OHLC out of order: low={low} open={open} close={close} high={high}")]
    InconsistentRange {
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    },
}

/// OHLCV bar for one interval of one (symbol, timeframe) series.
///
/// Immutable once validated. Invariant: `low <= min(open, close) <= max(open, close) <= high`.
/// Volume may be zero for instruments that do not report it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Decimal,
}

impl Bar {
    /// Build a validated bar from decimal fields.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self, BarError> {
        let bar = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Build a validated bar from raw floats, rejecting NaN and infinities.
    pub fn from_f64(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        fn convert(field: &'static str, value: f64) -> Result<Decimal, BarError> {
            if !value.is_finite() {
                return Err(BarError::NonFinite { field });
            }
            Decimal::from_f64_retain(value)
                .map(|d| d.normalize())
                .ok_or(BarError::NonFinite { field })
        }
        Self::new(
            timestamp,
            convert("open", open)?,
            convert("high", high)?,
            convert("low", low)?,
            convert("close", close)?,
            convert("volume", volume)?,
        )
    }

    /// Check the OHLCV invariants.
    pub fn validate(&self) -> Result<(), BarError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if value <= Decimal::ZERO {
                return Err(BarError::NonPositivePrice { field, value });
            }
            if value > MAX_PRICE {
                return Err(BarError::OutOfRange {
                    field,
                    value,
                    max: MAX_PRICE,
                });
            }
        }
        if self.volume < Decimal::ZERO {
            return Err(BarError::NegativeVolume(self.volume));
        }
        if self.volume > MAX_VOLUME {
            return Err(BarError::OutOfRange {
                field: "volume",
                value: self.volume,
                max: MAX_VOLUME,
            });
        }
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || body_high > self.high {
            return Err(BarError::InconsistentRange {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }
        Ok(())
    }

    /// High minus low.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Absolute candle body size.
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    pub fn upper_wick(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }
}
