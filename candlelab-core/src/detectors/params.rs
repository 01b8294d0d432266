//! Detector parameters. Every field has a default; TOML/JSON may override any subset.

use crate::engine::{ConfigError, MAX_WINDOW};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Bars on each side of a swing point.
    pub swing_window: usize,
    pub trend: TrendParams,
    pub breakout: BreakoutParams,
    pub mean_reversion: MeanReversionParams,
    pub squeeze: SqueezeParams,
    pub scalping: ScalpingParams,
    pub vwap: VwapParams,
    pub supply_demand: SupplyDemandParams,
    pub multi_timeframe: MultiTimeframeParams,
    pub smart_money: SmartMoneyParams,
    pub killzone: KillzoneParams,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            swing_window: 3,
            trend: TrendParams::default(),
            breakout: BreakoutParams::default(),
            mean_reversion: MeanReversionParams::default(),
            squeeze: SqueezeParams::default(),
            scalping: ScalpingParams::default(),
            vwap: VwapParams::default(),
            supply_demand: SupplyDemandParams::default(),
            multi_timeframe: MultiTimeframeParams::default(),
            smart_money: SmartMoneyParams::default(),
            killzone: KillzoneParams::default(),
        }
    }
}

// ─── Validation helpers ──────────────────────────────────────────────

/// Upper bound on multipliers, ratios and buffers.
pub const MAX_MULTIPLIER: Decimal = dec!(1000);

fn period(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_WINDOW {
        return Err(ConfigError::invalid(
            field,
            format!("period must be in [1, {MAX_WINDOW}], got {value}"),
        ));
    }
    Ok(())
}

fn positive(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO || value > MAX_MULTIPLIER {
        return Err(ConfigError::invalid(
            field,
            format!("must be in (0, {MAX_MULTIPLIER}], got {value}"),
        ));
    }
    Ok(())
}

fn non_negative(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value > MAX_MULTIPLIER {
        return Err(ConfigError::invalid(
            field,
            format!("must be in [0, {MAX_MULTIPLIER}], got {value}"),
        ));
    }
    Ok(())
}

fn percent_range(field: &'static str, low: Decimal, high: Decimal) -> Result<(), ConfigError> {
    if !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&low)
        || !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&high)
        || low >= high
    {
        return Err(ConfigError::invalid(
            field,
            format!("need 0 <= {low} < {high} <= 100"),
        ));
    }
    Ok(())
}

impl DetectorParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        period("swing_window", self.swing_window)?;

        let t = &self.trend;
        period("trend.fast", t.fast)?;
        period("trend.slow", t.slow)?;
        if t.fast >= t.slow {
            return Err(ConfigError::invalid("trend.fast", "must be shorter than trend.slow"));
        }
        period("trend.adx_period", t.adx_period)?;
        if !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&t.adx_threshold) {
            return Err(ConfigError::invalid(
                "trend.adx_threshold",
                format!("must be in [0, 100], got {}", t.adx_threshold),
            ));
        }
        period("trend.atr_period", t.atr_period)?;
        non_negative("trend.atr_multiplier", t.atr_multiplier)?;
        positive("trend.rr", t.rr)?;

        let b = &self.breakout;
        period("breakout.period", b.period)?;
        non_negative("breakout.volume_multiplier", b.volume_multiplier)?;
        period("breakout.atr_period", b.atr_period)?;
        positive("breakout.rr", b.rr)?;

        let m = &self.mean_reversion;
        period("mean_reversion.rsi_period", m.rsi_period)?;
        percent_range("mean_reversion.oversold", m.oversold, m.overbought)?;
        period("mean_reversion.bb_period", m.bb_period)?;
        positive("mean_reversion.bb_multiplier", m.bb_multiplier)?;
        period("mean_reversion.atr_period", m.atr_period)?;
        positive("mean_reversion.stop_atr_multiplier", m.stop_atr_multiplier)?;

        let s = &self.squeeze;
        period("squeeze.bb_period", s.bb_period)?;
        positive("squeeze.bb_multiplier", s.bb_multiplier)?;
        period("squeeze.kc_period", s.kc_period)?;
        positive("squeeze.kc_multiplier", s.kc_multiplier)?;
        period("squeeze.atr_period", s.atr_period)?;
        positive("squeeze.rr", s.rr)?;

        let sc = &self.scalping;
        period("scalping.rsi_period", sc.rsi_period)?;
        percent_range("scalping.oversold", sc.oversold, sc.overbought)?;
        period("scalping.extreme_lookback", sc.extreme_lookback)?;
        period("scalping.fast", sc.fast)?;
        period("scalping.slow", sc.slow)?;
        if sc.fast >= sc.slow {
            return Err(ConfigError::invalid("scalping.fast", "must be shorter than scalping.slow"));
        }
        period("scalping.atr_period", sc.atr_period)?;
        positive("scalping.atr_multiplier", sc.atr_multiplier)?;
        positive("scalping.rr", sc.rr)?;

        let v = &self.vwap;
        period("vwap.atr_period", v.atr_period)?;
        positive("vwap.atr_multiplier", v.atr_multiplier)?;
        positive("vwap.rr", v.rr)?;

        let sd = &self.supply_demand;
        period("supply_demand.body_period", sd.body_period)?;
        positive("supply_demand.displacement_ratio", sd.displacement_ratio)?;
        period("supply_demand.lookback", sd.lookback)?;
        period("supply_demand.atr_period", sd.atr_period)?;
        non_negative("supply_demand.buffer_atr", sd.buffer_atr)?;
        positive("supply_demand.rr", sd.rr)?;

        let mt = &self.multi_timeframe;
        period("multi_timeframe.htf_swing_window", mt.htf_swing_window)?;
        if mt.htf_swing_window <= self.swing_window {
            return Err(ConfigError::invalid(
                "multi_timeframe.htf_swing_window",
                "must be longer than swing_window",
            ));
        }
        period("multi_timeframe.ema_period", mt.ema_period)?;
        period("multi_timeframe.atr_period", mt.atr_period)?;
        non_negative("multi_timeframe.buffer_atr", mt.buffer_atr)?;
        positive("multi_timeframe.rr", mt.rr)?;

        let smc = &self.smart_money;
        positive("smart_money.ob_body_ratio", smc.ob_body_ratio)?;
        period("smart_money.ob_lookback", smc.ob_lookback)?;
        non_negative("smart_money.ob_tolerance_pct", smc.ob_tolerance_pct)?;
        if smc.discount_threshold <= Decimal::ZERO
            || smc.premium_threshold >= Decimal::ONE
            || smc.discount_threshold >= smc.premium_threshold
        {
            return Err(ConfigError::invalid(
                "smart_money.premium_threshold",
                "need 0 < discount_threshold < premium_threshold < 1",
            ));
        }
        period("smart_money.atr_period", smc.atr_period)?;
        non_negative("smart_money.buffer_atr", smc.buffer_atr)?;
        positive("smart_money.rr", smc.rr)?;

        let k = &self.killzone;
        if k.sessions.is_empty() {
            return Err(ConfigError::invalid("killzone.sessions", "at least one session required"));
        }
        for session in &k.sessions {
            if session.start_hour >= session.end_hour || session.end_hour > 24 {
                return Err(ConfigError::invalid(
                    "killzone.sessions",
                    format!(
                        "session '{}' needs start_hour < end_hour <= 24",
                        session.name
                    ),
                ));
            }
        }
        positive("killzone.wick_ratio", k.wick_ratio)?;
        period("killzone.fvg_lookback", k.fvg_lookback)?;
        non_negative("killzone.buffer_atr", k.buffer_atr)?;
        period("killzone.atr_period", k.atr_period)?;
        positive("killzone.rr", k.rr)?;
        Ok(())
    }
}

// ─── Per-detector parameters ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    pub fast: usize,
    pub slow: usize,
    pub adx_period: usize,
    pub adx_threshold: Decimal,
    pub atr_period: usize,
    pub atr_multiplier: Decimal,
    pub rr: Decimal,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            fast: 9,
            slow: 21,
            adx_period: 14,
            adx_threshold: dec!(25),
            atr_period: 14,
            atr_multiplier: dec!(1.5),
            rr: dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutParams {
    pub period: usize,
    pub volume_multiplier: Decimal,
    pub atr_period: usize,
    pub rr: Decimal,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            period: 20,
            volume_multiplier: dec!(1.5),
            atr_period: 14,
            rr: dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionParams {
    pub rsi_period: usize,
    pub oversold: Decimal,
    pub overbought: Decimal,
    pub bb_period: usize,
    pub bb_multiplier: Decimal,
    pub atr_period: usize,
    pub stop_atr_multiplier: Decimal,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            oversold: dec!(30),
            overbought: dec!(70),
            bb_period: 20,
            bb_multiplier: dec!(2.0),
            atr_period: 14,
            stop_atr_multiplier: dec!(1.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqueezeParams {
    pub bb_period: usize,
    pub bb_multiplier: Decimal,
    pub kc_period: usize,
    pub kc_multiplier: Decimal,
    pub atr_period: usize,
    pub rr: Decimal,
}

impl Default for SqueezeParams {
    fn default() -> Self {
        Self {
            bb_period: 20,
            bb_multiplier: dec!(2.0),
            kc_period: 20,
            kc_multiplier: dec!(1.5),
            atr_period: 10,
            rr: dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalpingParams {
    /// Largest timeframe, in minutes, the detector runs on.
    pub max_timeframe_minutes: u32,
    pub rsi_period: usize,
    pub oversold: Decimal,
    pub overbought: Decimal,
    pub extreme_lookback: usize,
    pub fast: usize,
    pub slow: usize,
    pub atr_period: usize,
    pub atr_multiplier: Decimal,
    pub rr: Decimal,
}

impl Default for ScalpingParams {
    fn default() -> Self {
        Self {
            max_timeframe_minutes: 4,
            rsi_period: 3,
            oversold: dec!(20),
            overbought: dec!(80),
            extreme_lookback: 3,
            fast: 5,
            slow: 13,
            atr_period: 14,
            atr_multiplier: dec!(1.0),
            rr: dec!(1.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VwapParams {
    pub atr_period: usize,
    pub atr_multiplier: Decimal,
    pub rr: Decimal,
}

impl Default for VwapParams {
    fn default() -> Self {
        Self {
            atr_period: 14,
            atr_multiplier: dec!(1.0),
            rr: dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyDemandParams {
    pub body_period: usize,
    pub displacement_ratio: Decimal,
    pub lookback: usize,
    pub atr_period: usize,
    pub buffer_atr: Decimal,
    pub rr: Decimal,
}

impl Default for SupplyDemandParams {
    fn default() -> Self {
        Self {
            body_period: 20,
            displacement_ratio: dec!(2.0),
            lookback: 30,
            atr_period: 14,
            buffer_atr: dec!(0.5),
            rr: dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiTimeframeParams {
    pub htf_swing_window: usize,
    pub ema_period: usize,
    pub atr_period: usize,
    pub buffer_atr: Decimal,
    pub rr: Decimal,
}

impl Default for MultiTimeframeParams {
    fn default() -> Self {
        Self {
            htf_swing_window: 8,
            ema_period: 20,
            atr_period: 14,
            buffer_atr: dec!(0.5),
            rr: dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartMoneyParams {
    pub ob_body_ratio: Decimal,
    pub ob_lookback: usize,
    /// Percent of price each order-block edge is widened by.
    pub ob_tolerance_pct: Decimal,
    /// Fraction of the swing range above which price is premium.
    pub premium_threshold: Decimal,
    pub discount_threshold: Decimal,
    pub atr_period: usize,
    pub buffer_atr: Decimal,
    pub rr: Decimal,
}

impl Default for SmartMoneyParams {
    fn default() -> Self {
        Self {
            ob_body_ratio: dec!(2.0),
            ob_lookback: 50,
            ob_tolerance_pct: dec!(2.0),
            premium_threshold: dec!(0.62),
            discount_threshold: dec!(0.38),
            atr_period: 14,
            buffer_atr: dec!(0.5),
            rr: dec!(2.0),
        }
    }
}

/// A UTC trading session `[start_hour, end_hour)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub name: String,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl SessionWindow {
    pub fn new(name: &str, start_hour: u32, end_hour: u32) -> Self {
        Self {
            name: name.to_string(),
            start_hour,
            end_hour,
        }
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillzoneParams {
    pub sessions: Vec<SessionWindow>,
    pub wick_ratio: Decimal,
    pub fvg_lookback: usize,
    pub buffer_atr: Decimal,
    pub atr_period: usize,
    pub rr: Decimal,
}

impl Default for KillzoneParams {
    fn default() -> Self {
        Self {
            sessions: vec![
                SessionWindow::new("london", 7, 10),
                SessionWindow::new("new_york", 12, 15),
            ],
            wick_ratio: dec!(2.0),
            fvg_lookback: 20,
            buffer_atr: dec!(0.25),
            atr_period: 14,
            rr: dec!(2.0),
        }
    }
}
