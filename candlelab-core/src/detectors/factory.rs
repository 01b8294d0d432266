//! Factory: turns strategy identifiers plus `DetectorParams` into boxed
//! detectors, in the order requested.

use super::{
    BreakoutDetector, Detector, DetectorParams, KillzoneDetector, MeanReversionDetector,
    MultiTimeframeDetector, ScalpingDetector, SmartMoneyDetector, SqueezeDetector,
    SupplyDemandDetector, TrendDetector, VwapDetector,
};
use crate::domain::{SignalError, StrategyId};
use crate::engine::ConfigError;

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error(transparent)]
    UnknownDetector(#[from] SignalError),
    #[error(transparent)]
    InvalidParams(#[from] ConfigError),
    #[error("Detector listed twice: {0}")]
    Duplicate(StrategyId),
}

// ─── Construction ────────────────────────────────────────────────────

/// Build one detector. Parameters are taken as given; use
/// [`create_detectors`] to validate them first.
pub fn create_detector(id: StrategyId, params: &DetectorParams) -> Box<dyn Detector> {
    let w = params.swing_window;
    match id {
        StrategyId::Trend => Box::new(TrendDetector::new(params.trend.clone(), w)),
        StrategyId::Breakout => Box::new(BreakoutDetector::new(params.breakout.clone())),
        StrategyId::MeanReversion => {
            Box::new(MeanReversionDetector::new(params.mean_reversion.clone()))
        }
        StrategyId::Squeeze => Box::new(SqueezeDetector::new(params.squeeze.clone())),
        StrategyId::Scalping => Box::new(ScalpingDetector::new(params.scalping.clone())),
        StrategyId::Vwap => Box::new(VwapDetector::new(params.vwap.clone())),
        StrategyId::SupplyDemand => {
            Box::new(SupplyDemandDetector::new(params.supply_demand.clone()))
        }
        StrategyId::MultiTimeframe => Box::new(MultiTimeframeDetector::new(
            params.multi_timeframe.clone(),
            w,
        )),
        StrategyId::SmartMoney => Box::new(SmartMoneyDetector::new(params.smart_money.clone(), w)),
        StrategyId::Killzone => Box::new(KillzoneDetector::new(params.killzone.clone())),
    }
}

/// Validate `params` and build the listed detectors in order.
pub fn create_detectors(
    ids: &[StrategyId],
    params: &DetectorParams,
) -> Result<Vec<Box<dyn Detector>>, FactoryError> {
    params.validate()?;
    let mut out: Vec<Box<dyn Detector>> = Vec::with_capacity(ids.len());
    for &id in ids {
        if out.iter().any(|d| d.id() == id) {
            return Err(FactoryError::Duplicate(id));
        }
        out.push(create_detector(id, params));
    }
    Ok(out)
}

/// Parse detector names (`"smart_money"`, `"killzone"`, ...) and build them.
pub fn create_detectors_by_name<S: AsRef<str>>(
    names: &[S],
    params: &DetectorParams,
) -> Result<Vec<Box<dyn Detector>>, FactoryError> {
    let ids = names
        .iter()
        .map(|n| n.as_ref().parse::<StrategyId>())
        .collect::<Result<Vec<_>, _>>()?;
    create_detectors(&ids, params)
}
