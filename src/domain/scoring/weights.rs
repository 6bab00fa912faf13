use crate::domain::market::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Per-instrument weight overrides produced by the calibration pipeline.
///
/// Every multiplier defaults to 1.0. Maps are keyed by timeframe label
/// (`"W"`, `"D"`, `"240"`, `"1H"`, ...); a missing, non-finite or
/// non-positive entry reads as 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LearnedWeights {
    /// HTF blend multipliers, applied before renormalization
    pub htf: BTreeMap<String, f64>,
    /// LTF blend multipliers, applied before renormalization
    pub ltf: BTreeMap<String, f64>,
    /// Swing-consensus signal multipliers
    pub signals: SignalMultipliers,
    /// Swing-consensus per-timeframe vote weights
    pub consensus: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalMultipliers {
    pub ema_cross: f64,
    pub supertrend: f64,
    pub ema_structure: f64,
    pub ema_depth: f64,
    pub rsi: f64,
}

impl Default for SignalMultipliers {
    fn default() -> Self {
        Self {
            ema_cross: 1.0,
            supertrend: 1.0,
            ema_structure: 1.0,
            ema_depth: 1.0,
            rsi: 1.0,
        }
    }
}

impl SignalMultipliers {
    pub fn sanitized(&self) -> Self {
        Self {
            ema_cross: sanitize(self.ema_cross),
            supertrend: sanitize(self.supertrend),
            ema_structure: sanitize(self.ema_structure),
            ema_depth: sanitize(self.ema_depth),
            rsi: sanitize(self.rsi),
        }
    }
}

impl LearnedWeights {
    pub fn htf_multiplier(&self, timeframe: Timeframe) -> f64 {
        lookup(&self.htf, timeframe)
    }

    pub fn ltf_multiplier(&self, timeframe: Timeframe) -> f64 {
        lookup(&self.ltf, timeframe)
    }

    pub fn consensus_weight(&self, timeframe: Timeframe) -> f64 {
        lookup(&self.consensus, timeframe)
    }

    /// True when no override differs from the neutral multiplier
    pub fn is_neutral(&self) -> bool {
        let maps_neutral = [&self.htf, &self.ltf, &self.consensus]
            .iter()
            .all(|m| m.values().all(|v| sanitize(*v) == 1.0));
        maps_neutral && self.signals.sanitized() == SignalMultipliers::default()
    }
}

fn lookup(map: &BTreeMap<String, f64>, timeframe: Timeframe) -> f64 {
    map.iter()
        .find(|(key, _)| Timeframe::from_str(key).is_ok_and(|tf| tf == timeframe))
        .map(|(_, v)| sanitize(*v))
        .unwrap_or(1.0)
}

/// Non-finite and non-positive multipliers fall back to neutral
pub fn sanitize(multiplier: f64) -> f64 {
    if multiplier.is_finite() && multiplier > 0.0 {
        multiplier
    } else {
        1.0
    }
}
