//! Per-timeframe HTF and LTF scores, each clamped to [-50, 50].

use crate::application::indicators::primitives::clamp;
use crate::domain::scoring::bundle::{Bundle, DailyAnchors, Slope, TrendDirection, gt, gte};

pub const SCORE_LIMIT: f64 = 50.0;

/// Trend-following score for a slower timeframe.
pub fn htf_score(b: &Bundle) -> f64 {
    let price = Some(b.price);

    let trend_bias = (if gte(price, b.ema(200)) { 10.0 } else { -10.0 })
        + (if b.st_direction.is_bull() { 10.0 } else { -10.0 });

    let mut stack = 0.0;
    if gt(b.ema(5), b.ema(8)) {
        stack += 2.0;
    }
    if gt(b.ema(8), b.ema(13)) {
        stack += 2.5;
    }
    if gt(b.ema(13), b.ema(21)) {
        stack += 2.5;
    }
    if gt(b.ema(21), b.ema(48)) {
        stack += 3.0;
    }
    let fast_over_slow = b.fast_above_slow();
    let structure = stack + if fast_over_slow { 5.0 } else { -5.0 };

    let structure_bias = if b.ema_structure.is_finite() {
        b.ema_structure * 5.0
    } else {
        0.0
    };

    let mut regime = 0.0;
    if b.compressed {
        regime += if trend_bias >= 0.0 { 5.0 } else { -5.0 };
    }
    if b.phase.abs() > 61.8 {
        regime -= 3.0;
    }
    if b.atr_ratio > 1.1 && !b.compressed {
        regime += 2.0;
    }
    if b.volume_ratio > 1.3 {
        regime += 1.0;
    }
    if b.volume_ratio < 0.7 {
        regime -= 0.5;
    }

    let volume_boost = if b.volume_ratio > 1.2 {
        3.0
    } else if b.volume_ratio < 0.8 {
        -2.0
    } else {
        0.0
    };
    let momentum = (if fast_over_slow { 5.0 } else { -5.0 }) + volume_boost;

    clamp(
        trend_bias + structure + structure_bias + regime + momentum,
        -SCORE_LIMIT,
        SCORE_LIMIT,
    )
}

/// Timing score for a faster timeframe. Without anchors the Golden-Gate
/// proximity term drops out and SuperTrend distance is measured in raw
/// price units.
pub fn ltf_score(b: &Bundle, anchors: Option<&DailyAnchors>) -> f64 {
    let price = Some(b.price);

    let mut trigger = 0.0;
    if b.squeeze_on_prev && !b.squeeze_on {
        let direction = if b.momentum >= 0.0 { 8.0 } else { -8.0 };
        let strength = if b.momentum_std > 0.0 {
            (b.momentum.abs() / b.momentum_std).min(1.5)
        } else {
            1.0
        };
        trigger += direction * strength;
    }

    let gg_dist = b.golden_gate.distance;
    if gg_dist > 0.8 {
        trigger += 6.0;
    }
    if gg_dist < 0.2 {
        trigger -= 4.0;
    }
    let daily_atr = anchors.map(|a| a.atr).unwrap_or(0.0);
    if let Some(a) = anchors {
        if (b.price - a.gate_up()).abs() < a.atr * 0.1 {
            trigger += 2.0;
        }
        if (b.price - a.gate_down()).abs() < a.atr * 0.1 {
            trigger -= 2.0;
        }
    }

    let mut align = (if gte(price, b.ema(21)) { 6.0 } else { -6.0 })
        + (if gte(price, b.ema(48)) { 6.0 } else { -6.0 });
    let (e5, e13, e21, e48) = (b.ema(5), b.ema(13), b.ema(21), b.ema(48));
    if gt(e5, e13) && gt(e13, e21) && gt(e21, e48) {
        align += 3.0;
    } else if gt(e13, e5) && gt(e21, e13) && gt(e48, e21) {
        align -= 3.0;
    }

    let st_support = supertrend_support(b, daily_atr);

    let mut st_momentum = 0.0;
    if b.ema_momentum.is_finite() {
        if st_support > 0.0 && b.ema_momentum > 0.0 {
            st_momentum = (st_support * 0.4 * b.ema_momentum).min(4.0);
        } else if st_support < 0.0 && b.ema_momentum < 0.0 {
            st_momentum = (st_support * 0.4 * b.ema_momentum.abs()).max(-4.0);
        }
    }

    let mean_reversion = if b.rsi > 70.0 {
        -4.0
    } else if b.rsi < 30.0 {
        4.0
    } else {
        0.0
    };

    let guard = (if b.squeeze_on { -3.0 } else { 0.0 }) + (if b.compressed { -2.0 } else { 0.0 });

    clamp(
        trigger + align + st_support + st_momentum + mean_reversion + guard,
        -SCORE_LIMIT,
        SCORE_LIMIT,
    )
}

/// +/-10 when SuperTrend direction, slope and price side agree, decaying
/// linearly to zero at two normalized ATRs from the line.
pub fn supertrend_support(b: &Bundle, daily_atr: f64) -> f64 {
    let norm = if b.atr_ratio.is_finite() && b.atr_ratio > 0.0 && daily_atr > 0.0 {
        b.atr_ratio * daily_atr
    } else {
        1.0
    };
    let dist = (b.price - b.st_line).abs() / norm;
    let decay = (1.0 - dist / 2.0).max(0.0);

    match (b.st_direction, b.st_slope) {
        (TrendDirection::Bull, Slope::Rising) if b.price > b.st_line => 10.0 * decay,
        (TrendDirection::Bear, Slope::Falling) if b.price < b.st_line => -10.0 * decay,
        _ => 0.0,
    }
}
