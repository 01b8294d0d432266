//! Candidate signals — immutable trade proposals emitted by detectors.
//!
//! A signal carries a shared base (side, price, stop, target, confidence) and a
//! strategy-tagged payload. The payload variant determines the strategy id, so a
//! signal can never claim one strategy while carrying another's metadata.

use super::structure::{MarketStructure, PriceZone, TrendDirection};
use super::timeframe::Timeframe;
use super::zone::{PriceBand, Zone};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(self) -> Decimal {
        match self {
            Side::Long => Decimal::ONE,
            Side::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("long"),
            Side::Short => f.write_str("short"),
        }
    }
}

/// Identifier of each detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    SmartMoney,
    Killzone,
    SupplyDemand,
    MultiTimeframe,
    Breakout,
    Squeeze,
    MeanReversion,
    Vwap,
    Scalping,
    Trend,
}

impl StrategyId {
    /// All detectors, in default aggregator priority (structural first, trend last).
    pub const ALL: [StrategyId; 10] = [
        StrategyId::SmartMoney,
        StrategyId::Killzone,
        StrategyId::SupplyDemand,
        StrategyId::MultiTimeframe,
        StrategyId::Breakout,
        StrategyId::Squeeze,
        StrategyId::MeanReversion,
        StrategyId::Vwap,
        StrategyId::Scalping,
        StrategyId::Trend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyId::SmartMoney => "smart_money",
            StrategyId::Killzone => "killzone",
            StrategyId::SupplyDemand => "supply_demand",
            StrategyId::MultiTimeframe => "multi_timeframe",
            StrategyId::Breakout => "breakout",
            StrategyId::Squeeze => "squeeze",
            StrategyId::MeanReversion => "mean_reversion",
            StrategyId::Vwap => "vwap",
            StrategyId::Scalping => "scalping",
            StrategyId::Trend => "trend",
        }
    }

    /// Detectors built on swing/zone structure rather than indicator thresholds.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            StrategyId::SmartMoney | StrategyId::Killzone | StrategyId::SupplyDemand
        )
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str() == needle)
            .ok_or_else(|| SignalError::UnknownStrategy(s.to_string()))
    }
}

/// Structural facts observed when a signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureTag {
    Crossover,
    BreakOfStructure,
    ChangeOfCharacter,
    OrderBlock,
    FairValueGap,
    LiquiditySweep,
    Premium,
    Discount,
    Equilibrium,
    Displacement,
    DemandZone,
    SupplyZone,
    Killzone,
    WickRejection,
    SqueezeRelease,
    VolumeConfirmed,
    Pullback,
    BandExcursion,
    VwapCross,
}

/// Strategy-specific payload. The variant is the strategy identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SignalDetails {
    Trend {
        fast_ema: Decimal,
        slow_ema: Decimal,
        adx: Decimal,
        atr: Decimal,
    },
    Breakout {
        channel: PriceBand,
        volume_ratio: Option<Decimal>,
    },
    MeanReversion {
        rsi: Decimal,
        upper_band: Decimal,
        middle_band: Decimal,
        lower_band: Decimal,
    },
    Squeeze {
        bollinger: PriceBand,
        keltner: PriceBand,
        basis: Decimal,
    },
    Scalping {
        rsi_extreme: Decimal,
        fast_ema: Decimal,
        slow_ema: Decimal,
    },
    Vwap {
        vwap: Decimal,
        previous_vwap: Decimal,
    },
    SupplyDemand {
        zone: Zone,
        displacement_index: usize,
        body_ratio: Decimal,
    },
    MultiTimeframe {
        higher_trend: TrendDirection,
        lower_trend: TrendDirection,
        ema: Decimal,
    },
    SmartMoney {
        order_block: PriceBand,
        zone: PriceZone,
        structure: MarketStructure,
        liquidity_sweep: bool,
        fair_value_gap: bool,
    },
    Killzone {
        session: String,
        /// Rejection wick over body; `None` for a bodiless candle.
        wick_ratio: Option<Decimal>,
        fair_value_gap: PriceBand,
    },
}

impl SignalDetails {
    pub fn strategy(&self) -> StrategyId {
        match self {
            SignalDetails::Trend { .. } => StrategyId::Trend,
            SignalDetails::Breakout { .. } => StrategyId::Breakout,
            SignalDetails::MeanReversion { .. } => StrategyId::MeanReversion,
            SignalDetails::Squeeze { .. } => StrategyId::Squeeze,
            SignalDetails::Scalping { .. } => StrategyId::Scalping,
            SignalDetails::Vwap { .. } => StrategyId::Vwap,
            SignalDetails::SupplyDemand { .. } => StrategyId::SupplyDemand,
            SignalDetails::MultiTimeframe { .. } => StrategyId::MultiTimeframe,
            SignalDetails::SmartMoney { .. } => StrategyId::SmartMoney,
            SignalDetails::Killzone { .. } => StrategyId::Killzone,
        }
    }

    /// The order-block band this signal was anchored to, if any.
    pub fn order_block(&self) -> Option<PriceBand> {
        match self {
            SignalDetails::SmartMoney { order_block, .. } => Some(*order_block),
            SignalDetails::SupplyDemand { zone, .. } => Some(zone.band),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error(
        "{side} signal has inconsistent levels: stop={stop_loss} price={price} target={take_profit}"
    )]
    InvalidGeometry {
        side: Side,
        price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
    },
    #[error("confidence {0} outside [0, 100]")]
    ConfidenceOutOfRange(Decimal),
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

/// A trade proposal for one bar, produced by exactly one detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSignal {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Absolute index of the signal bar within its series.
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// 0-100.
    pub confidence: Decimal,
    pub reason: String,
    pub tags: BTreeSet<StructureTag>,
    pub details: SignalDetails,
}

impl CandidateSignal {
    pub fn strategy(&self) -> StrategyId {
        self.details.strategy()
    }

    /// Distance between entry and stop.
    pub fn risk(&self) -> Decimal {
        (self.price - self.stop_loss).abs()
    }

    /// Distance between entry and target.
    pub fn reward(&self) -> Decimal {
        (self.take_profit - self.price).abs()
    }

    /// Check that stop and target sit on the correct sides of the price.
    pub fn validate(&self) -> Result<(), SignalError> {
        let ordered = match self.side {
            Side::Long => self.stop_loss < self.price && self.price < self.take_profit,
            Side::Short => self.take_profit < self.price && self.price < self.stop_loss,
        };
        if !ordered {
            return Err(SignalError::InvalidGeometry {
                side: self.side,
                price: self.price,
                stop_loss: self.stop_loss,
                take_profit: self.take_profit,
            });
        }
        if self.confidence < Decimal::ZERO || self.confidence > Decimal::ONE_HUNDRED {
            return Err(SignalError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }
}
