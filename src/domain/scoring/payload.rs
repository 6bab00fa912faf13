use crate::domain::market::market_regime::SwingRegime;
use crate::domain::market::session::SessionType;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{PhaseZone, TrendDirection};
use crate::domain::scoring::levels::{AtrLevels, FuelGauge, Gate, Horizon, SupportMap, VolatilityTier};
use crate::domain::scoring::signals::{EntryQuality, ExhaustionState, SwingConsensus};
use crate::domain::scoring::state::MarketState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Event markers. Downstream matchers test truthiness, so unset markers are
/// omitted instead of written as `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Flags {
    #[serde(skip_serializing_if = "is_false")]
    pub st_flip_30m: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub st_flip_30m_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub st_flip_1h: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub st_flip_1h_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub st_flip_10m: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub st_flip_10m_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub st_flip_5m: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub st_flip_5m_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub st_flip_bear: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub st_flip_bear_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub ema_cross_1h_13_48: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_cross_1h_13_48_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub ema_cross_30m_13_48: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_cross_30m_13_48_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub sq30_release: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sq30_release_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub sq1h_release: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sq1h_release_ts: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub momentum_elite: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub phase_zone_change: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmaTech {
    pub stack: i8,
    pub depth: u8,
    pub structure: f64,
    pub momentum: f64,
}

/// Price position against EMA21 in ATR units, plus the SuperTrend flip marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrBand {
    pub s: i8,
    pub lo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xs: Option<i8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqueezeTech {
    pub s: u8,
    pub r: u8,
    pub c: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiTech {
    pub r5: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTech {
    pub v: f64,
    pub z: PhaseZone,
    pub dots: Vec<String>,
}

/// Compact per-timeframe snapshot for dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfTech {
    pub ema: EmaTech,
    pub atr: AtrBand,
    pub sq: SqueezeTech,
    pub rsi: RsiTech,
    pub ph: PhaseTech,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel: Option<FuelGauge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmaMapEntry {
    pub depth: u8,
    pub structure: f64,
    pub momentum: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseDirection {
    Bull,
    Bear,
    Flat,
}

impl PhaseDirection {
    pub fn from_value(phase: f64) -> Self {
        if phase > 0.0 {
            PhaseDirection::Bull
        } else if phase < 0.0 {
            PhaseDirection::Bear
        } else {
            PhaseDirection::Flat
        }
    }
}

/// A timeframe left out of this computation and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedTimeframe {
    pub timeframe: Timeframe,
    pub reason: String,
    pub detail: String,
}

/// Everything computed for one instrument in one cycle.
///
/// Top-level `Option`s serialize as `null` rather than being omitted so that
/// `merge_with_previous` never lets a stale value shadow a field the engine
/// owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePayload {
    pub ticker: String,
    /// Timestamp of the freshest bar used, Unix ms
    pub ts: i64,
    pub session: SessionType,
    pub htf_score: f64,
    pub ltf_score: f64,
    pub state: MarketState,
    pub price: f64,
    pub sl: Option<f64>,
    pub tp: Option<f64>,
    pub tp_trim: Option<f64>,
    pub tp_exit: Option<f64>,
    pub tp_runner: Option<f64>,
    pub rr: f64,
    pub completion: f64,
    pub phase_pct: f64,
    pub phase_dir: PhaseDirection,
    pub phase_zone: PhaseZone,
    pub flags: Flags,
    pub tf_tech: BTreeMap<String, TfTech>,
    pub atr_d: Option<f64>,
    pub atr_w: Option<f64>,
    pub st_support: SupportMap,
    pub atr_levels: BTreeMap<Horizon, AtrLevels>,
    pub fuel: BTreeMap<Timeframe, FuelGauge>,
    pub ema_map: BTreeMap<Timeframe, EmaMapEntry>,
    pub active_gates: Vec<Gate>,
    pub td_sequential: ExhaustionState,
    pub regime: SwingRegime,
    pub swing_consensus: SwingConsensus,
    pub entry_quality: EntryQuality,
    pub volatility_tier: VolatilityTier,
    pub volatility_atr_pct: f64,
    pub timeframes: Vec<Timeframe>,
    pub degraded: Vec<DegradedTimeframe>,
}

impl ScorePayload {
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Layers a freshly computed payload over a previously stored one.
///
/// Every top-level field the engine computes wins, including ones that are
/// `null` this cycle. Only keys the engine never writes (annotations added by
/// other collaborators) are carried over from `previous`. A non-object
/// `previous` is ignored.
pub fn merge_with_previous(
    payload: &ScorePayload,
    previous: Option<&Value>,
) -> Result<Value, serde_json::Error> {
    let computed = payload.to_value()?;
    let Value::Object(computed) = computed else {
        return Ok(computed);
    };

    let mut merged: Map<String, Value> = match previous {
        Some(Value::Object(prev)) => prev
            .iter()
            .filter(|(key, _)| !computed.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        _ => Map::new(),
    };
    merged.extend(computed);

    Ok(Value::Object(merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_omit_unset_markers() {
        let flags = Flags {
            sq30_release: true,
            sq30_release_ts: Some(1_700_000_000_000),
            ..Default::default()
        };
        let json = serde_json::to_value(&flags).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(json["sq30_release"], true);
        assert!(obj.get("momentum_elite").is_none());
    }

    #[test]
    fn test_phase_direction() {
        assert_eq!(PhaseDirection::from_value(12.0), PhaseDirection::Bull);
        assert_eq!(PhaseDirection::from_value(-0.1), PhaseDirection::Bear);
        assert_eq!(PhaseDirection::from_value(0.0), PhaseDirection::Flat);
    }
}
