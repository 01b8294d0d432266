//! Market-structure classifications shared by detectors and replay.

use serde::{Deserialize, Serialize};

/// Prevailing swing structure (higher highs/lows vs lower highs/lows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStructure {
    Bullish,
    Bearish,
    Ranging,
}

/// Trend classification used for multi-timeframe agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Uptrend,
    Downtrend,
    Ranging,
}

impl From<MarketStructure> for TrendDirection {
    fn from(structure: MarketStructure) -> Self {
        match structure {
            MarketStructure::Bullish => TrendDirection::Uptrend,
            MarketStructure::Bearish => TrendDirection::Downtrend,
            MarketStructure::Ranging => TrendDirection::Ranging,
        }
    }
}

/// Where price sits inside the most recent swing range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceZone {
    Premium,
    Equilibrium,
    Discount,
}
