use serde::{Deserialize, Serialize};
use std::fmt;

/// Trend structure of one timeframe, read from its confirmed swing pivots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendRegime {
    Uptrend,
    Downtrend,
    #[default]
    Transition,
}

impl TrendRegime {
    /// +1 for uptrend, -1 for downtrend, 0 while in transition
    pub fn sign(&self) -> i8 {
        match self {
            TrendRegime::Uptrend => 1,
            TrendRegime::Downtrend => -1,
            TrendRegime::Transition => 0,
        }
    }
}

impl fmt::Display for TrendRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendRegime::Uptrend => write!(f, "Uptrend"),
            TrendRegime::Downtrend => write!(f, "Downtrend"),
            TrendRegime::Transition => write!(f, "Transition"),
        }
    }
}

/// Daily/weekly regime pair folded into one of nine labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombinedRegime {
    StrongBull,
    EarlyBull,
    LateBull,
    CounterTrendBull,
    #[default]
    Neutral,
    CounterTrendBear,
    EarlyBear,
    LateBear,
    StrongBear,
}

impl CombinedRegime {
    /// Fixed (daily, weekly) lookup table
    pub fn from_pair(daily: TrendRegime, weekly: TrendRegime) -> Self {
        use TrendRegime::*;
        match (daily, weekly) {
            (Uptrend, Uptrend) => CombinedRegime::StrongBull,
            (Uptrend, Transition) => CombinedRegime::EarlyBull,
            (Uptrend, Downtrend) => CombinedRegime::CounterTrendBull,
            (Transition, Uptrend) => CombinedRegime::LateBull,
            (Transition, Transition) => CombinedRegime::Neutral,
            (Transition, Downtrend) => CombinedRegime::LateBear,
            (Downtrend, Uptrend) => CombinedRegime::CounterTrendBear,
            (Downtrend, Transition) => CombinedRegime::EarlyBear,
            (Downtrend, Downtrend) => CombinedRegime::StrongBear,
        }
    }
}

impl fmt::Display for CombinedRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CombinedRegime::StrongBull => "Strong Bull",
            CombinedRegime::EarlyBull => "Early Bull",
            CombinedRegime::LateBull => "Late Bull",
            CombinedRegime::CounterTrendBull => "CT Bull",
            CombinedRegime::Neutral => "Neutral",
            CombinedRegime::CounterTrendBear => "CT Bear",
            CombinedRegime::EarlyBear => "Early Bear",
            CombinedRegime::LateBear => "Late Bear",
            CombinedRegime::StrongBear => "Strong Bear",
        };
        write!(f, "{}", label)
    }
}

/// A confirmed swing high or low
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub index: usize,
    pub timestamp: i64,
    pub price: f64,
}

/// Swing regime for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SwingRegime {
    pub daily: TrendRegime,
    pub weekly: TrendRegime,
    pub combined: CombinedRegime,
}

impl SwingRegime {
    pub fn new(daily: TrendRegime, weekly: TrendRegime) -> Self {
        Self {
            daily,
            weekly,
            combined: CombinedRegime::from_pair(daily, weekly),
        }
    }
}
