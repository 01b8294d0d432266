//! Price bands and structural zones (order blocks, fair-value gaps, supply/demand).

use super::bar::Bar;
use super::signal::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed price interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceBand {
    pub low: Decimal,
    pub high: Decimal,
}

impl PriceBand {
    /// Build a band from two edges in either order.
    pub fn new(a: Decimal, b: Decimal) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn height(&self) -> Decimal {
        self.high - self.low
    }

    pub fn midpoint(&self) -> Decimal {
        (self.high + self.low) / Decimal::TWO
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.low <= price && price <= self.high
    }

    /// Containment with both edges widened by `pct` percent of their own value.
    pub fn contains_with_tolerance(&self, price: Decimal, pct: Decimal) -> bool {
        let factor = pct / Decimal::ONE_HUNDRED;
        let low = self.low * (Decimal::ONE - factor);
        let high = self.high * (Decimal::ONE + factor);
        low <= price && price <= high
    }

    /// True when the bar's range overlaps the band.
    pub fn touched_by(&self, bar: &Bar) -> bool {
        bar.low <= self.high && bar.high >= self.low
    }
}

/// Direction a structure favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Bullish,
    Bearish,
}

impl Bias {
    pub fn side(self) -> Side {
        match self {
            Bias::Bullish => Side::Long,
            Bias::Bearish => Side::Short,
        }
    }

    pub fn from_side(side: Side) -> Self {
        match side {
            Side::Long => Bias::Bullish,
            Side::Short => Bias::Bearish,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    OrderBlock,
    FairValueGap,
    SupplyDemand,
}

/// A price band anchored to a bar, with touch/fill state updated by later bars.
///
/// Zones live only for the detection pass that created them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub bias: Bias,
    pub band: PriceBand,
    /// Index (within the detection window) of the bar the zone is anchored to.
    pub anchor_index: usize,
    /// 0-100.
    pub strength: Decimal,
    pub touches: u32,
    /// Price traded through the whole band.
    pub filled: bool,
    /// A close beyond the far edge invalidated the zone.
    pub broken: bool,
}

impl Zone {
    pub fn new(
        kind: ZoneKind,
        bias: Bias,
        band: PriceBand,
        anchor_index: usize,
        strength: Decimal,
    ) -> Self {
        Self {
            kind,
            bias,
            band,
            anchor_index,
            strength: strength.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            touches: 0,
            filled: false,
            broken: false,
        }
    }

    /// Apply one later bar to the zone's state.
    pub fn interact(&mut self, bar: &Bar) {
        if self.band.touched_by(bar) {
            self.touches += 1;
        }
        match self.bias {
            Bias::Bullish => {
                if bar.low <= self.band.low {
                    self.filled = true;
                }
                if bar.close < self.band.low {
                    self.broken = true;
                }
            }
            Bias::Bearish => {
                if bar.high >= self.band.high {
                    self.filled = true;
                }
                if bar.close > self.band.high {
                    self.broken = true;
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !self.broken
    }
}
