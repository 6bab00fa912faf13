use serde::{Deserialize, Serialize};
use std::fmt;

/// Quadrant of the (HTF, LTF) score plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketState {
    HtfBullLtfBull,
    HtfBullLtfPullback,
    HtfBearLtfBear,
    HtfBearLtfPullback,
}

impl MarketState {
    /// Zero counts as bullish on both axes.
    pub fn classify(htf_score: f64, ltf_score: f64) -> Self {
        match (htf_score >= 0.0, ltf_score >= 0.0) {
            (true, true) => MarketState::HtfBullLtfBull,
            (true, false) => MarketState::HtfBullLtfPullback,
            (false, false) => MarketState::HtfBearLtfBear,
            (false, true) => MarketState::HtfBearLtfPullback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketState::HtfBullLtfBull => "HTF_BULL_LTF_BULL",
            MarketState::HtfBullLtfPullback => "HTF_BULL_LTF_PULLBACK",
            MarketState::HtfBearLtfBear => "HTF_BEAR_LTF_BEAR",
            MarketState::HtfBearLtfPullback => "HTF_BEAR_LTF_PULLBACK",
        }
    }

    pub fn is_htf_bull(&self) -> bool {
        matches!(
            self,
            MarketState::HtfBullLtfBull | MarketState::HtfBullLtfPullback
        )
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrants() {
        assert_eq!(MarketState::classify(0.0, 0.0), MarketState::HtfBullLtfBull);
        assert_eq!(MarketState::classify(12.0, -0.1), MarketState::HtfBullLtfPullback);
        assert_eq!(MarketState::classify(-3.0, -3.0), MarketState::HtfBearLtfBear);
        assert_eq!(MarketState::classify(-0.1, 40.0), MarketState::HtfBearLtfPullback);
    }

    #[test]
    fn test_sign_preserving_scaling_keeps_state() {
        let samples = [(-50.0, 50.0), (13.5, -7.25), (0.0, -0.0001), (-22.0, -49.0)];
        for (h, l) in samples {
            let base = MarketState::classify(h, l);
            assert_eq!(MarketState::classify(h * 0.5, l * 0.01), base);
            assert_eq!(MarketState::classify(h * 3.0, l * 7.0), base);
        }
    }

    #[test]
    fn test_serialized_label() {
        let json = serde_json::to_string(&MarketState::HtfBearLtfPullback).unwrap();
        assert_eq!(json, "\"HTF_BEAR_LTF_PULLBACK\"");
        assert_eq!(MarketState::HtfBullLtfBull.to_string(), "HTF_BULL_LTF_BULL");
    }
}
