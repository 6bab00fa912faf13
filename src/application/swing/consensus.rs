//! Multi-timeframe swing vote.
//!
//! Each of 10m/30m/1H/4H/D contributes a continuous bias in [-1, 1] built
//! from whichever of five signals it has; the aggregate is a weighted mean
//! of those biases, gated by the daily swing regime.

use crate::application::indicators::primitives::{clamp, round_to};
use crate::domain::market::market_regime::{SwingRegime, TrendRegime};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{Bundle, BundleMap};
use crate::domain::scoring::signals::{BiasLabel, Side, SwingConsensus, TimeframeBias};
use crate::domain::scoring::weights::{LearnedWeights, SignalMultipliers};

const W_EMA_CROSS: f64 = 0.15;
const W_SUPERTREND: f64 = 0.25;
const W_STRUCTURE: f64 = 0.25;
const W_DEPTH: f64 = 0.20;
const W_RSI: f64 = 0.15;

/// Aggregate-bias thresholds of the direction rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusThresholds {
    /// Direction is taken unless the daily regime opposes it
    pub strong: f64,
    /// Direction is taken only when the daily regime agrees or is in transition
    pub weak: f64,
    /// Per-timeframe bias beyond which a row is labelled bullish/bearish
    pub label: f64,
}

impl Default for ConsensusThresholds {
    fn default() -> Self {
        Self {
            strong: 0.3,
            weak: 0.15,
            label: 0.2,
        }
    }
}

/// Continuous bias of one timeframe, `None` when no signal is available
pub fn timeframe_bias(b: &Bundle, multipliers: &SignalMultipliers) -> Option<f64> {
    let m = multipliers.sanitized();
    let mut signals: Vec<(f64, f64)> = Vec::with_capacity(5);

    if b.ema(13).is_some() && b.ema(48).is_some() {
        let cross = if b.fast_above_slow() { 1.0 } else { -1.0 };
        signals.push((cross, W_EMA_CROSS * m.ema_cross));
    }
    signals.push((b.st_direction.sign(), W_SUPERTREND * m.supertrend));
    if b.ema_structure.is_finite() {
        signals.push((b.ema_structure, W_STRUCTURE * m.ema_structure));
    }
    signals.push(((f64::from(b.ema_depth) - 5.0) / 5.0, W_DEPTH * m.ema_depth));
    if b.rsi.is_finite() {
        signals.push((clamp((b.rsi - 50.0) / 50.0, -1.0, 1.0), W_RSI * m.rsi));
    }

    let total: f64 = signals.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }
    let bias = signals.iter().map(|(s, w)| s * w).sum::<f64>() / total;
    Some(clamp(bias, -1.0, 1.0))
}

/// Votes across the swing timeframes present in `bundles`.
pub fn swing_consensus(
    bundles: &BundleMap,
    regime: &SwingRegime,
    learned: &LearnedWeights,
    thresholds: &ConsensusThresholds,
) -> SwingConsensus {
    let mut stack = Vec::new();
    let mut weighted = 0.0;
    let mut weight_total = 0.0;

    for tf in Timeframe::SWING {
        let Some(bundle) = bundles.get(&tf) else {
            continue;
        };
        let Some(bias) = timeframe_bias(bundle, &learned.signals) else {
            continue;
        };

        let tf_weight = learned.consensus_weight(tf);
        weighted += bias * tf_weight;
        weight_total += tf_weight;

        let label = if bias > thresholds.label {
            BiasLabel::Bullish
        } else if bias < -thresholds.label {
            BiasLabel::Bearish
        } else {
            BiasLabel::Neutral
        };

        stack.push(TimeframeBias {
            tf,
            bias: label,
            score: round_to(bias, 3),
            cross_dir: bundle.last_ema_cross.map(|c| c.direction),
            cross_age: bundle.last_ema_cross.map(|c| c.bars_ago),
        });
    }

    let aggregate = if weight_total > 0.0 {
        clamp(weighted / weight_total, -1.0, 1.0)
    } else {
        0.0
    };

    let freshest = Timeframe::SWING
        .iter()
        .filter_map(|tf| {
            bundles
                .get(tf)
                .and_then(|b| b.last_ema_cross)
                .map(|cross| (*tf, cross))
        })
        .max_by_key(|(_, cross)| cross.timestamp);

    SwingConsensus {
        direction: direction(aggregate, regime.daily, thresholds),
        aggregate_bias: round_to(aggregate, 3),
        bullish_count: stack.iter().filter(|r| r.bias == BiasLabel::Bullish).count(),
        bearish_count: stack.iter().filter(|r| r.bias == BiasLabel::Bearish).count(),
        freshest_cross_tf: freshest.map(|(tf, _)| tf),
        freshest_cross_age: freshest.map(|(_, cross)| cross.bars_ago),
        tf_stack: stack,
    }
}

fn direction(aggregate: f64, daily: TrendRegime, t: &ConsensusThresholds) -> Option<Side> {
    use TrendRegime::*;
    let long = (aggregate > t.strong && daily != Downtrend)
        || (aggregate > t.weak && matches!(daily, Uptrend | Transition));
    let short = (aggregate < -t.strong && daily != Uptrend)
        || (aggregate < -t.weak && matches!(daily, Downtrend | Transition));

    if long {
        Some(Side::Long)
    } else if short {
        Some(Side::Short)
    } else {
        None
    }
}
