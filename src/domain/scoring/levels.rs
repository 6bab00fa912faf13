use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{Slope, TrendDirection};
use crate::domain::scoring::signals::Side;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-timeframe SuperTrend reading inside the support map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportEntry {
    pub dir: TrendDirection,
    pub slope: Slope,
    pub aligned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportMap {
    pub map: BTreeMap<Timeframe, SupportEntry>,
    pub bull_count: usize,
    pub bear_count: usize,
    pub slope_aligned: usize,
    /// 0 fully bearish, 0.5 neutral, 1 fully bullish and slope-aligned
    pub support_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Day,
    Week,
    Month,
    Quarter,
    Longterm,
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Horizon::Day => "day",
            Horizon::Week => "week",
            Horizon::Month => "month",
            Horizon::Quarter => "quarter",
            Horizon::Longterm => "longterm",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateSide {
    Bull,
    Bear,
}

/// Golden-Gate tracker: entered past 38.2% of ATR, completed at 61.8%
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub side: GateSide,
    pub entered: bool,
    pub completed: bool,
    pub entry_level: f64,
    pub target_level: f64,
    pub progress_pct: f64,
    pub horizon: Horizon,
}

/// Fibonacci ATR ladder of one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtrLevels {
    pub prev_close: f64,
    pub atr: f64,
    #[serde(rename = "trigger_up")]
    pub trigger_up: f64,
    #[serde(rename = "trigger_dn")]
    pub trigger_dn: f64,
    #[serde(rename = "levels_up")]
    pub levels_up: Vec<FibLevel>,
    #[serde(rename = "levels_dn")]
    pub levels_dn: Vec<FibLevel>,
    pub gate: Option<Gate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelStatus {
    Healthy,
    Low,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelGauge {
    pub fuel_pct: f64,
    pub phase_fuel: f64,
    pub rsi_fuel: f64,
    pub status: FuelStatus,
}

impl FuelGauge {
    /// Reading used when the timeframe has no bundle
    pub fn neutral() -> Self {
        Self {
            fuel_pct: 50.0,
            phase_fuel: 50.0,
            rsi_fuel: 50.0,
            status: FuelStatus::Healthy,
        }
    }
}

/// Volatility bucket from daily ATR as a percentage of price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolatilityTier {
    Low,
    Medium,
    High,
    Extreme,
}

impl VolatilityTier {
    pub fn from_atr_pct(atr_pct: Decimal) -> Self {
        if atr_pct < dec!(1.5) {
            VolatilityTier::Low
        } else if atr_pct < dec!(3.0) {
            VolatilityTier::Medium
        } else if atr_pct < dec!(5.0) {
            VolatilityTier::High
        } else {
            VolatilityTier::Extreme
        }
    }

    /// Allowed stop distance as a percentage of price, (min, max)
    pub fn stop_clamp_pct(&self) -> (Decimal, Decimal) {
        match self {
            VolatilityTier::Low => (dec!(1.0), dec!(3.0)),
            VolatilityTier::Medium => (dec!(1.5), dec!(5.0)),
            VolatilityTier::High => (dec!(2.5), dec!(8.0)),
            VolatilityTier::Extreme => (dec!(4.0), dec!(12.0)),
        }
    }

    /// Entry-quality grade a setup must reach in this tier
    pub fn min_entry_quality(&self) -> u32 {
        match self {
            VolatilityTier::Low => 55,
            VolatilityTier::Medium => 60,
            VolatilityTier::High => 65,
            VolatilityTier::Extreme => 70,
        }
    }
}

/// Stop and three-step target ladder for the HTF direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPlan {
    pub direction: Side,
    pub sl: Option<f64>,
    pub tp_trim: Option<f64>,
    pub tp_exit: Option<f64>,
    pub tp_runner: Option<f64>,
    pub rr: f64,
    pub completion: f64,
}

impl RiskPlan {
    pub fn empty(direction: Side) -> Self {
        Self {
            direction,
            sl: None,
            tp_trim: None,
            tp_exit: None,
            tp_runner: None,
            rr: 0.0,
            completion: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(VolatilityTier::from_atr_pct(dec!(1.49)), VolatilityTier::Low);
        assert_eq!(VolatilityTier::from_atr_pct(dec!(1.5)), VolatilityTier::Medium);
        assert_eq!(VolatilityTier::from_atr_pct(dec!(4.99)), VolatilityTier::High);
        assert_eq!(VolatilityTier::from_atr_pct(dec!(5.0)), VolatilityTier::Extreme);
    }

    #[test]
    fn test_tier_bars_increase_with_volatility() {
        let tiers = [
            VolatilityTier::Low,
            VolatilityTier::Medium,
            VolatilityTier::High,
            VolatilityTier::Extreme,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].min_entry_quality() < pair[1].min_entry_quality());
            assert!(pair[0].stop_clamp_pct().1 < pair[1].stop_clamp_pct().1);
        }
    }

    #[test]
    fn test_atr_levels_field_names() {
        let levels = AtrLevels {
            prev_close: 100.0,
            atr: 2.0,
            trigger_up: 100.47,
            trigger_dn: 99.53,
            levels_up: vec![],
            levels_dn: vec![],
            gate: None,
        };
        let json = serde_json::to_value(&levels).unwrap();
        assert_eq!(json["prevClose"], 100.0);
        assert_eq!(json["trigger_up"], 100.47);
        assert!(json["gate"].is_null());
    }
}
