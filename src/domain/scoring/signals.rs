use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::CrossDirection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Proposed trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score >= 0.0 { Side::Long } else { Side::Short }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasLabel {
    Bullish,
    Bearish,
    Neutral,
}

/// One row of the consensus stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeBias {
    pub tf: Timeframe,
    pub bias: BiasLabel,
    /// Continuous bias in [-1, 1], rounded to 3 decimals
    pub score: f64,
    #[serde(rename = "crossDir")]
    pub cross_dir: Option<CrossDirection>,
    /// Bars since the most recent EMA13/48 cross, if any
    pub cross_age: Option<usize>,
}

/// Multi-timeframe swing vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SwingConsensus {
    pub direction: Option<Side>,
    pub aggregate_bias: f64,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub freshest_cross_tf: Option<Timeframe>,
    pub freshest_cross_age: Option<usize>,
    pub tf_stack: Vec<TimeframeBias>,
}

/// Supporting detail of an entry-quality grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EntryQualityDetail {
    /// Timeframes whose EMA13/48 ordering agrees with the side
    pub structure_aligned: Vec<Timeframe>,
    /// Raw SuperTrend tally before rescaling, in [-20, 36]
    pub momentum_raw: i32,
    pub regime_points: u32,
    pub phase_points: u32,
    pub rsi_points: u32,
    pub squeeze_bonus: u32,
}

/// 0-100 grade of a proposed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryQuality {
    pub side: Side,
    pub score: u32,
    pub structure: u32,
    pub momentum: u32,
    pub confirmation: u32,
    /// Minimum grade the volatility tier asks for
    pub min_required: u32,
    pub meets_minimum: bool,
    pub details: EntryQualityDetail,
}

/// Exhaustion sequence state of one timeframe, or the merged view across D/W/M
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhaustionState {
    pub tf: Timeframe,
    pub td9_bullish: bool,
    pub td9_bearish: bool,
    pub td13_bullish: bool,
    pub td13_bearish: bool,
    pub exit_long: bool,
    pub exit_short: bool,
    pub boost: f64,
    pub bullish_prep_count: u8,
    pub bearish_prep_count: u8,
    pub bullish_leadup_count: u8,
    pub bearish_leadup_count: u8,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_tf: BTreeMap<Timeframe, ExhaustionState>,
}

impl ExhaustionState {
    /// All-zero state, returned when the series is too short
    pub fn neutral(tf: Timeframe) -> Self {
        Self {
            tf,
            td9_bullish: false,
            td9_bearish: false,
            td13_bullish: false,
            td13_bearish: false,
            exit_long: false,
            exit_short: false,
            boost: 0.0,
            bullish_prep_count: 0,
            bearish_prep_count: 0,
            bullish_leadup_count: 0,
            bearish_leadup_count: 0,
            per_tf: BTreeMap::new(),
        }
    }

    pub fn has_prep_count(&self) -> bool {
        self.bullish_prep_count > 0 || self.bearish_prep_count > 0
    }

    pub fn has_signal(&self) -> bool {
        self.td9_bullish || self.td9_bearish || self.td13_bullish || self.td13_bearish
    }

    pub fn refresh_exits(&mut self) {
        self.exit_long = self.td9_bearish || self.td13_bearish;
        self.exit_short = self.td9_bullish || self.td13_bullish;
    }
}
