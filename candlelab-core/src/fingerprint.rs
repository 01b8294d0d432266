//! Run fingerprints: BLAKE3 digests of the dataset, the run configuration
//! and the result, each over canonical JSON.
//!
//! Two runs over the same inputs produce the same three digests.

use crate::domain::Series;
use crate::engine::BacktestResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// Digest of `value`'s JSON encoding.
    pub fn of_json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::of_bytes(&serde_json::to_vec(value)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub dataset: Digest,
    pub config: Digest,
    pub result: Digest,
}

impl RunFingerprint {
    /// Fingerprint a finished run. `config` is whatever configuration value
    /// fully determined it.
    pub fn new<C: Serialize + ?Sized>(
        series: &Series,
        config: &C,
        result: &BacktestResult,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            dataset: Digest::of_json(series)?,
            config: Digest::of_json(config)?,
            result: result_digest(result)?,
        })
    }
}

/// Digest of the trade ledger, the metrics and the final state.
pub fn result_digest(result: &BacktestResult) -> Result<Digest, serde_json::Error> {
    #[derive(Serialize)]
    struct Canonical<'a> {
        trades: &'a [crate::domain::TradeRecord],
        metrics: &'a crate::metrics::Metrics,
        final_balance: rust_decimal::Decimal,
        status: &'a crate::engine::RunStatus,
    }
    Digest::of_json(&Canonical {
        trades: &result.trades,
        metrics: &result.metrics,
        final_balance: result.final_balance,
        status: &result.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;
    use crate::indicators::make_bars;

    #[test]
    fn digest_is_stable_hex() {
        let a = Digest::of_bytes(b"candles");
        let b = Digest::of_bytes(b"candles");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a.short().len(), 12);
        assert_ne!(a, Digest::of_bytes(b"candle"));
    }

    #[test]
    fn dataset_digest_tracks_content() {
        let s1 = Series::new("EURUSD", Timeframe::H1, make_bars(&[1.0, 2.0, 3.0])).unwrap();
        let s2 = Series::new("EURUSD", Timeframe::H1, make_bars(&[1.0, 2.0, 3.5])).unwrap();
        assert_eq!(Digest::of_json(&s1).unwrap(), Digest::of_json(&s1.clone()).unwrap());
        assert_ne!(Digest::of_json(&s1).unwrap(), Digest::of_json(&s2).unwrap());
    }
}
