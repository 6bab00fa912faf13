use crate::domain::market::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Periods of the ten-EMA ribbon, fastest first
pub const EMA_PERIODS: [usize; 10] = [3, 5, 8, 13, 21, 34, 48, 89, 200, 233];

/// Bundles of one instrument keyed by timeframe; a missing key is an absent
/// timeframe.
pub type BundleMap = BTreeMap<Timeframe, Bundle>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bull,
    Bear,
}

impl TrendDirection {
    pub fn sign(&self) -> f64 {
        match self {
            TrendDirection::Bull => 1.0,
            TrendDirection::Bear => -1.0,
        }
    }

    pub fn is_bull(&self) -> bool {
        matches!(self, TrendDirection::Bull)
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Bull => write!(f, "bull"),
            TrendDirection::Bear => write!(f, "bear"),
        }
    }
}

/// Slope of the SuperTrend line between the last two bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slope {
    Rising,
    Falling,
    Flat,
}

impl Slope {
    pub fn from_change(prev: f64, current: f64) -> Self {
        if current > prev {
            Slope::Rising
        } else if current < prev {
            Slope::Falling
        } else {
            Slope::Flat
        }
    }

    pub fn sign(&self) -> i8 {
        match self {
            Slope::Rising => 1,
            Slope::Falling => -1,
            Slope::Flat => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhaseZone {
    Low,
    Medium,
    High,
    Extreme,
}

impl PhaseZone {
    pub fn from_value(phase: f64) -> Self {
        let abs = phase.abs();
        if abs > 100.0 {
            PhaseZone::Extreme
        } else if abs > 61.8 {
            PhaseZone::High
        } else if abs > 38.2 {
            PhaseZone::Medium
        } else {
            PhaseZone::Low
        }
    }
}

impl fmt::Display for PhaseZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseZone::Low => write!(f, "LOW"),
            PhaseZone::Medium => write!(f, "MEDIUM"),
            PhaseZone::High => write!(f, "HIGH"),
            PhaseZone::Extreme => write!(f, "EXTREME"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossDirection {
    Up,
    Down,
}

/// An EMA13/EMA48 crossing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaCross {
    pub direction: CrossDirection,
    pub timestamp: i64,
    /// 0 when the cross happened on the last bar
    pub bars_ago: usize,
}

/// SuperTrend direction change on the last bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuperTrendFlip {
    pub direction: TrendDirection,
    pub timestamp: i64,
}

/// Previous daily close and daily ATR used for Golden-Gate levels and
/// SuperTrend-support normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAnchors {
    pub prev_close: f64,
    pub atr: f64,
}

impl DailyAnchors {
    pub const GATE_RATIO: f64 = 0.382;

    /// Anchors are only usable with a finite close and a positive ATR
    pub fn new(prev_close: f64, atr: f64) -> Option<Self> {
        (prev_close.is_finite() && atr.is_finite() && atr > 0.0).then_some(Self { prev_close, atr })
    }

    pub fn gate_up(&self) -> f64 {
        self.prev_close + Self::GATE_RATIO * self.atr
    }

    pub fn gate_down(&self) -> f64 {
        self.prev_close - Self::GATE_RATIO * self.atr
    }
}

/// Golden-Gate position of the last close relative to the daily anchors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoldenGate {
    /// Position inside the gate range in [0, 1]; 0.5 without anchors
    pub distance: f64,
    pub up_cross_ts: Option<i64>,
    pub down_cross_ts: Option<i64>,
}

impl Default for GoldenGate {
    fn default() -> Self {
        Self {
            distance: 0.5,
            up_cross_ts: None,
            down_cross_ts: None,
        }
    }
}

/// Indicator snapshot of one timeframe at its last bar.
///
/// Built from scratch by the bundle engine on every call. EMA slots are `None`
/// while the series is shorter than the period; comparisons against a missing
/// EMA are false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bundle {
    pub timeframe: Timeframe,
    pub timestamp: i64,
    pub price: f64,
    pub prev_close: f64,
    pub bar_count: usize,

    pub emas: [Option<f64>; 10],
    pub ema_depth: u8,
    pub ema_structure: f64,
    pub ema_momentum: f64,
    pub ribbon_spread: f64,
    pub ema_stack: i8,
    pub ema_cross: Option<EmaCross>,
    pub last_ema_cross: Option<EmaCross>,

    pub st_line: f64,
    pub st_line_prev: f64,
    pub st_direction: TrendDirection,
    pub st_slope: Slope,
    pub st_flip: Option<SuperTrendFlip>,

    pub squeeze_on: bool,
    pub squeeze_on_prev: bool,
    pub squeeze_release: bool,
    pub compressed: bool,

    pub momentum: f64,
    pub momentum_std: f64,
    pub phase: f64,
    pub phase_zone: PhaseZone,

    pub atr: f64,
    pub atr_ratio: f64,
    pub rsi: f64,
    pub volume_ratio: f64,

    pub golden_gate: GoldenGate,
}

impl Bundle {
    /// EMA value for one of the ribbon periods
    pub fn ema(&self, period: usize) -> Option<f64> {
        EMA_PERIODS
            .iter()
            .position(|p| *p == period)
            .and_then(|idx| self.emas[idx])
    }

    /// EMA13 >= EMA48, the fast/slow ordering used across the scorers
    pub fn fast_above_slow(&self) -> bool {
        gte(self.ema(13), self.ema(48))
    }

    /// Momentum normalized by its rolling deviation, if the deviation is positive
    pub fn momentum_strength(&self) -> Option<f64> {
        (self.momentum_std > 0.0 && self.momentum.is_finite())
            .then(|| self.momentum / self.momentum_std)
    }

    pub fn squeeze_release_ts(&self) -> Option<i64> {
        self.squeeze_release.then_some(self.timestamp)
    }
}

#[cfg(test)]
impl Bundle {
    /// Quiet bundle with an empty ribbon and a flat bullish SuperTrend
    pub(crate) fn fixture(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            timestamp: 0,
            price: 100.0,
            prev_close: 100.0,
            bar_count: 100,
            emas: [None; 10],
            ema_depth: 0,
            ema_structure: 0.0,
            ema_momentum: 0.0,
            ribbon_spread: 0.0,
            ema_stack: 0,
            ema_cross: None,
            last_ema_cross: None,
            st_line: 99.0,
            st_line_prev: 99.0,
            st_direction: TrendDirection::Bull,
            st_slope: Slope::Flat,
            st_flip: None,
            squeeze_on: false,
            squeeze_on_prev: false,
            squeeze_release: false,
            compressed: false,
            momentum: 0.0,
            momentum_std: 0.0,
            phase: 0.0,
            phase_zone: PhaseZone::Low,
            atr: 1.0,
            atr_ratio: 1.0,
            rsi: 50.0,
            volume_ratio: 1.0,
            golden_gate: GoldenGate::default(),
        }
    }
}

/// `a > b`, false when either side is missing
pub fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

/// `a >= b`, false when either side is missing
pub fn gte(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a >= b)
}

/// `a < b`, false when either side is missing
pub fn lt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_zone_thresholds() {
        assert_eq!(PhaseZone::from_value(38.2), PhaseZone::Low);
        assert_eq!(PhaseZone::from_value(-38.3), PhaseZone::Medium);
        assert_eq!(PhaseZone::from_value(61.9), PhaseZone::High);
        assert_eq!(PhaseZone::from_value(100.0), PhaseZone::High);
        assert_eq!(PhaseZone::from_value(-100.5), PhaseZone::Extreme);
    }

    #[test]
    fn test_anchors_reject_non_positive_atr() {
        assert!(DailyAnchors::new(100.0, 0.0).is_none());
        assert!(DailyAnchors::new(f64::NAN, 2.0).is_none());

        let anchors = DailyAnchors::new(100.0, 10.0).unwrap();
        assert!((anchors.gate_up() - 103.82).abs() < 1e-9);
        assert!((anchors.gate_down() - 96.18).abs() < 1e-9);
    }

    #[test]
    fn test_missing_side_compares_false() {
        assert!(!gt(None, Some(1.0)));
        assert!(!gte(Some(1.0), None));
        assert!(!lt(None, None));
        assert!(gte(Some(1.0), Some(1.0)));
    }

    #[test]
    fn test_slope_from_change() {
        assert_eq!(Slope::from_change(1.0, 2.0), Slope::Rising);
        assert_eq!(Slope::from_change(2.0, 1.0), Slope::Falling);
        assert_eq!(Slope::from_change(1.0, 1.0).sign(), 0);
    }
}
