//! Deterministic synthetic series for demos and tests.
//!
//! The RNG seed is derived from `(seed, symbol, kind)` via BLAKE3, so the
//! same spec always yields the same bars. These are clearly fake; nothing
//! here should be mistaken for market data.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use candlelab_core::domain::{Bar, Series, SeriesError, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticKind {
    /// Up legs of 20 bars, pullbacks of 10.
    Uptrend,
    /// Every bar at one price, zero range, zero volume.
    Flat,
    RandomWalk,
}

impl SyntheticKind {
    pub const ALL: [SyntheticKind; 3] = [
        SyntheticKind::Uptrend,
        SyntheticKind::Flat,
        SyntheticKind::RandomWalk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SyntheticKind::Uptrend => "uptrend",
            SyntheticKind::Flat => "flat",
            SyntheticKind::RandomWalk => "random_walk",
        }
    }
}

impl fmt::Display for SyntheticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown synthetic series kind '{0}' (expected uptrend, flat or random_walk)")]
pub struct UnknownKind(String);

impl FromStr for SyntheticKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        SyntheticKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub kind: SyntheticKind,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub count: usize,
    pub start: DateTime<Utc>,
    pub seed: u64,
}

impl SyntheticSpec {
    /// 500 hourly bars of `SYNTH` from 2024-01-01, seed 42.
    pub fn new(kind: SyntheticKind) -> Self {
        Self {
            kind,
            symbol: "SYNTH".to_string(),
            timeframe: Timeframe::H1,
            count: 500,
            start: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            seed: 42,
        }
    }

    fn rng(&self) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(self.symbol.as_bytes());
        hasher.update(self.kind.as_str().as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }
}

const START_PRICE: Decimal = dec!(100);

/// Generate the series described by `spec`.
pub fn generate(spec: &SyntheticSpec) -> Result<Series, SeriesError> {
    let step = Duration::minutes(i64::from(spec.timeframe.minutes()));
    let at = |i: usize| spec.start + step * i as i32;
    let bars = match spec.kind {
        SyntheticKind::Uptrend => uptrend(spec.count, at)?,
        SyntheticKind::Flat => flat(spec.count, at)?,
        SyntheticKind::RandomWalk => random_walk(spec.count, &mut spec.rng(), at)?,
    };
    Series::new(spec.symbol.clone(), spec.timeframe, bars)
}

fn flat(count: usize, at: impl Fn(usize) -> DateTime<Utc>) -> Result<Vec<Bar>, SeriesError> {
    (0..count)
        .map(|i| {
            Bar::new(at(i), START_PRICE, START_PRICE, START_PRICE, START_PRICE, Decimal::ZERO)
                .map_err(|source| SeriesError::InvalidBar { index: i, source })
        })
        .collect()
}

fn uptrend(count: usize, at: impl Fn(usize) -> DateTime<Utc>) -> Result<Vec<Bar>, SeriesError> {
    let mut close = START_PRICE;
    (0..count)
        .map(|i| {
            let dir: i64 = match i {
                0 => 0,
                _ if (i - 1) % 30 < 20 => 1,
                _ => -1,
            };
            close += match dir {
                1 => dec!(1.0),
                -1 => dec!(-1.2),
                _ => Decimal::ZERO,
            };
            let open = close - dec!(0.3) * Decimal::from(dir);
            Bar::new(
                at(i),
                open,
                open.max(close) + dec!(0.1),
                open.min(close) - dec!(0.1),
                close,
                dec!(1000),
            )
            .map_err(|source| SeriesError::InvalidBar { index: i, source })
        })
        .collect()
}

fn random_walk(
    count: usize,
    rng: &mut StdRng,
    at: impl Fn(usize) -> DateTime<Utc>,
) -> Result<Vec<Bar>, SeriesError> {
    let mut close = START_PRICE;
    (0..count)
        .map(|i| {
            let open = close;
            close = (close + Decimal::new(rng.gen_range(-50i64..=50), 2)).max(dec!(1));
            let high = open.max(close) + Decimal::new(rng.gen_range(0i64..=30), 2);
            let low = (open.min(close) - Decimal::new(rng.gen_range(0i64..=30), 2)).max(dec!(0.5));
            let volume = Decimal::from(rng.gen_range(500u32..5000));
            Bar::new(at(i), open, high, low, close, volume)
                .map_err(|source| SeriesError::InvalidBar { index: i, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: SyntheticKind, count: usize) -> SyntheticSpec {
        SyntheticSpec {
            count,
            ..SyntheticSpec::new(kind)
        }
    }

    #[test]
    fn same_spec_same_bars() {
        for kind in SyntheticKind::ALL {
            let a = generate(&spec(kind, 200)).unwrap();
            let b = generate(&spec(kind, 200)).unwrap();
            assert_eq!(a, b, "{kind}");
            assert_eq!(a.len(), 200);
        }
    }

    #[test]
    fn seed_and_symbol_change_random_walk() {
        let base = generate(&spec(SyntheticKind::RandomWalk, 100)).unwrap();
        let reseeded = generate(&SyntheticSpec {
            seed: 7,
            ..spec(SyntheticKind::RandomWalk, 100)
        })
        .unwrap();
        let renamed = generate(&SyntheticSpec {
            symbol: "OTHER".into(),
            ..spec(SyntheticKind::RandomWalk, 100)
        })
        .unwrap();
        assert_ne!(base.bars(), reseeded.bars());
        assert_ne!(base.bars(), renamed.bars());
    }

    #[test]
    fn flat_is_flat() {
        let s = generate(&spec(SyntheticKind::Flat, 50)).unwrap();
        assert!(s
            .bars()
            .iter()
            .all(|b| b.high == b.low && b.close == START_PRICE));
    }

    #[test]
    fn uptrend_rises_overall() {
        let s = generate(&spec(SyntheticKind::Uptrend, 300)).unwrap();
        // Nine full waves of +8, then a last up leg (+20) and nine pullback bars.
        assert_eq!(s.bars()[0].close, dec!(100));
        assert_eq!(s.bars()[299].close, dec!(181.2));
    }

    #[test]
    fn timestamps_follow_timeframe() {
        let s = generate(&SyntheticSpec {
            timeframe: Timeframe::M15,
            ..spec(SyntheticKind::RandomWalk, 3)
        })
        .unwrap();
        let gap = s.bars()[1].timestamp - s.bars()[0].timestamp;
        assert_eq!(gap, Duration::minutes(15));
    }

    #[test]
    fn empty_count_is_empty_series() {
        assert!(generate(&spec(SyntheticKind::Uptrend, 0)).unwrap().bars().is_empty());
    }

    #[test]
    fn kind_parses_with_dashes() {
        assert_eq!(
            "random-walk".parse::<SyntheticKind>().unwrap(),
            SyntheticKind::RandomWalk
        );
        assert_eq!("Uptrend".parse::<SyntheticKind>().unwrap(), SyntheticKind::Uptrend);
        assert!("sideways".parse::<SyntheticKind>().is_err());
    }
}
