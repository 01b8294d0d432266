//! TOML run configuration.
//!
//! One file fully describes a run:
//!
//! ```toml
//! [run]
//! symbol = "EURUSD"
//! timeframe = "1h"
//! initial_balance = 10000
//! risk_per_trade_pct = 1.0
//!
//! [strategies]
//! enabled = ["trend", "breakout"]   # or "all"
//! priority = ["breakout", "trend"]
//!
//! [detectors.trend]
//! adx_threshold = 20
//! ```
//!
//! Every section is optional; omitted fields take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use candlelab_core::aggregator::{Aggregator, PriorityOrder};
use candlelab_core::detectors::{create_detectors, DetectorParams, FactoryError};
use candlelab_core::domain::{StrategyId, Timeframe};
use candlelab_core::engine::{self, SimulationConfig};
use candlelab_core::fingerprint::Digest;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] engine::ConfigError),
    #[error(transparent)]
    Detectors(#[from] FactoryError),
    #[error("no strategies enabled")]
    NoStrategies,
}

/// Complete configuration of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub strategies: StrategySelection,
    #[serde(default)]
    pub detectors: DetectorParams,
}

/// `[run]`: what is traded and how the account is simulated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSection {
    /// Expected symbol; when set, a series with another symbol is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    #[serde(flatten)]
    pub simulation: SimulationConfig,
}

/// `[strategies]`: which detectors run and their tie-break order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySelection {
    #[serde(default)]
    pub enabled: Enabled,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_priority"
    )]
    pub priority: Option<Vec<StrategyId>>,
}

/// `enabled = "all"` or an explicit list of strategy names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Enabled {
    #[default]
    All,
    Only(Vec<StrategyId>),
}

impl Enabled {
    pub fn strategies(&self) -> Vec<StrategyId> {
        match self {
            Enabled::All => StrategyId::ALL.to_vec(),
            Enabled::Only(ids) => ids.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnabled {
    Keyword(String),
    List(Vec<String>),
}

fn parse_ids<E: serde::de::Error>(names: &[String]) -> Result<Vec<StrategyId>, E> {
    names
        .iter()
        .map(|n| n.parse::<StrategyId>().map_err(E::custom))
        .collect()
}

impl<'de> Deserialize<'de> for Enabled {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawEnabled::deserialize(deserializer)? {
            RawEnabled::Keyword(k) if k.eq_ignore_ascii_case("all") => Ok(Enabled::All),
            RawEnabled::Keyword(k) => Err(serde::de::Error::custom(format!(
                "expected \"all\" or a list of strategies, got \"{k}\""
            ))),
            RawEnabled::List(names) => parse_ids(&names).map(Enabled::Only),
        }
    }
}

impl Serialize for Enabled {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Enabled::All => serializer.serialize_str("all"),
            Enabled::Only(ids) => ids.serialize(serializer),
        }
    }
}

fn deserialize_priority<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<StrategyId>>, D::Error> {
    let names = Vec::<String>::deserialize(deserializer)?;
    parse_ids(&names).map(Some)
}

impl RunConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.simulation.validate()?;
        self.detectors.validate()?;
        if self.enabled_strategies().is_empty() {
            return Err(ConfigError::NoStrategies);
        }
        Ok(())
    }

    pub fn enabled_strategies(&self) -> Vec<StrategyId> {
        self.strategies.enabled.strategies()
    }

    pub fn priority(&self) -> PriorityOrder {
        match &self.strategies.priority {
            Some(order) => PriorityOrder::new(order.clone()),
            None => PriorityOrder::default(),
        }
    }

    /// Build the detector set and aggregator this configuration describes.
    pub fn build_aggregator(&self) -> Result<Aggregator, ConfigError> {
        let detectors = create_detectors(&self.enabled_strategies(), &self.detectors)?;
        Ok(Aggregator::new(detectors, self.priority()))
    }

    /// Deterministic identifier: BLAKE3 of the canonical JSON encoding.
    pub fn run_id(&self) -> Result<Digest, serde_json::Error> {
        Digest::of_json(self)
    }
}
