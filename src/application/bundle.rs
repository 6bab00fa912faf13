//! Bundle engine: one indicator snapshot per (instrument, timeframe).

use crate::application::indicators::primitives::{
    atr_series, ema_series, last, linreg_series, prev, rsi_series, sma_series, stdev_series,
};
use crate::application::indicators::squeeze::{SQUEEZE_LEN, squeeze};
use crate::application::indicators::supertrend::{DEFAULT_ATR_LEN, DEFAULT_FACTOR, supertrend};
use crate::domain::errors::EngineError;
use crate::domain::market::bar::Bar;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{
    Bundle, CrossDirection, DailyAnchors, EMA_PERIODS, EmaCross, GoldenGate, PhaseZone, Slope,
    SuperTrendFlip, TrendDirection,
};

/// Bars required before a timeframe gets a bundle
pub const MIN_BUNDLE_BARS: usize = 50;

const STRUCTURE_WEIGHTS: [(usize, f64); 5] =
    [(34, 0.12), (48, 0.18), (89, 0.22), (200, 0.25), (233, 0.23)];
const MOMENTUM_WEIGHTS: [(usize, f64); 5] =
    [(3, 0.10), (5, 0.15), (8, 0.20), (13, 0.25), (21, 0.30)];

const MOMENTUM_LEN: usize = 20;
const RSI_LEN: usize = 14;
const ATR_LEN: usize = 14;
const VOLUME_LEN: usize = 20;
const ATR_RATIO_LEN: usize = 20;

/// Computes the full bundle at the last bar of `bars`.
///
/// `bars` must already be prepared (finite prices, strictly ascending).
/// `min_bars` below [`MIN_BUNDLE_BARS`] is raised to it.
pub fn compute_bundle(
    timeframe: Timeframe,
    bars: &[Bar],
    anchors: Option<&DailyAnchors>,
    min_bars: usize,
) -> Result<Bundle, EngineError> {
    let need = min_bars.max(MIN_BUNDLE_BARS);
    if bars.len() < need {
        return Err(EngineError::InsufficientData {
            timeframe,
            have: bars.len(),
            need,
        });
    }

    let n = bars.len();
    let last_idx = n - 1;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let price = closes[last_idx];
    let prev_close = closes[last_idx - 1];
    let timestamp = bars[last_idx].timestamp;

    // EMA ribbon
    let ema_lines: Vec<Vec<Option<f64>>> =
        EMA_PERIODS.iter().map(|p| ema_series(&closes, *p)).collect();
    let mut emas = [None; 10];
    for (slot, series) in emas.iter_mut().zip(&ema_lines) {
        *slot = last(series);
    }
    let ema_at = |period: usize| {
        EMA_PERIODS
            .iter()
            .position(|p| *p == period)
            .and_then(|idx| emas[idx])
    };

    let ema_depth = emas.iter().flatten().filter(|v| price > **v).count() as u8;
    let ema_structure = weighted_side(price, &STRUCTURE_WEIGHTS, ema_at);
    let ema_momentum = weighted_side(price, &MOMENTUM_WEIGHTS, ema_at);
    let ribbon_spread = match (ema_at(3), ema_at(233)) {
        (Some(fast), Some(slow)) if price > 0.0 => (fast - slow).abs() / price,
        _ => 0.0,
    };
    let ema_stack = stack_count(&[ema_at(5), ema_at(8), ema_at(13), ema_at(21), ema_at(48)]);

    let e13_line = &ema_lines[3];
    let e48_line = &ema_lines[6];
    let ema_cross = cross_at(e13_line, e48_line, last_idx).map(|direction| EmaCross {
        direction,
        timestamp,
        bars_ago: 0,
    });
    let last_ema_cross = (1..=last_idx).rev().find_map(|i| {
        cross_at(e13_line, e48_line, i).map(|direction| EmaCross {
            direction,
            timestamp: bars[i].timestamp,
            bars_ago: last_idx - i,
        })
    });

    // SuperTrend
    let st = supertrend(bars, DEFAULT_FACTOR, DEFAULT_ATR_LEN);
    let st_line = last(&st.line).unwrap_or(price);
    let st_line_prev = prev(&st.line).unwrap_or(st_line);
    let st_direction = st.direction[last_idx].unwrap_or(TrendDirection::Bull);
    let st_flip = st
        .flipped_at(last_idx)
        .map(|direction| SuperTrendFlip { direction, timestamp });

    // Squeeze
    let sq = squeeze(bars, SQUEEZE_LEN);
    let squeeze_on = sq.on[last_idx];
    let squeeze_on_prev = sq.on[last_idx - 1];
    let squeeze_release = sq.released_at(last_idx);
    let deviation = last(&sq.deviation).unwrap_or(0.0);

    // Momentum oscillator
    let basis = sma_series(&closes, MOMENTUM_LEN);
    let detrended: Vec<Option<f64>> = closes
        .iter()
        .zip(&basis)
        .map(|(c, b)| b.map(|b| c - b))
        .collect();
    let momentum_line = linreg_series(&detrended, MOMENTUM_LEN);
    let momentum = last(&momentum_line).unwrap_or(0.0);
    let momentum_filled: Vec<f64> = momentum_line.iter().map(|v| v.unwrap_or(0.0)).collect();
    let momentum_std = last(&stdev_series(&momentum_filled, MOMENTUM_LEN)).unwrap_or(0.0);

    // Volume
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let volume_avg = last(&sma_series(&volumes, VOLUME_LEN)).unwrap_or(0.0);
    let volume = volumes[last_idx];
    let volume_ratio = if volume_avg > 0.0 && volume > 0.0 {
        volume / volume_avg
    } else {
        1.0
    };

    let rsi = last(&rsi_series(&closes, RSI_LEN)).unwrap_or(50.0);

    // ATR and ratio to its own 20-bar average
    let atr_line = atr_series(bars, ATR_LEN);
    let atr = last(&atr_line).unwrap_or(0.0);
    let finite_atr: Vec<f64> = atr_line.iter().flatten().copied().collect();
    let atr_ratio = match last(&sma_series(&finite_atr, ATR_RATIO_LEN)) {
        Some(avg) if avg > 0.0 => atr / avg,
        _ => 1.0,
    };

    // Phase oscillator, unsmoothed composite at the last bar
    let pivot = ema_at(21);
    let price_phase = match pivot {
        Some(piv) if atr > 0.0 => (price - piv) / (3.0 * atr) * 100.0,
        _ => 0.0,
    };
    let momentum_phase = if momentum_std > 0.0 {
        momentum / momentum_std * 20.0
    } else {
        0.0
    };
    let volume_phase = (volume_ratio - 1.0) * 30.0;
    let phase = price_phase * 0.6 + momentum_phase * 0.3 + volume_phase * 0.1;

    // Bollinger width against a 2 ATR envelope around EMA21
    let compressed = pivot.is_some() && 2.0 * deviation - 2.0 * atr <= 0.0;

    let golden_gate = anchors
        .map(|a| golden_gate(a, prev_close, price, timestamp))
        .unwrap_or_default();

    Ok(Bundle {
        timeframe,
        timestamp,
        price,
        prev_close,
        bar_count: n,
        emas,
        ema_depth,
        ema_structure,
        ema_momentum,
        ribbon_spread,
        ema_stack,
        ema_cross,
        last_ema_cross,
        st_line,
        st_line_prev,
        st_direction,
        st_slope: Slope::from_change(st_line_prev, st_line),
        st_flip,
        squeeze_on,
        squeeze_on_prev,
        squeeze_release,
        compressed,
        momentum,
        momentum_std,
        phase,
        phase_zone: PhaseZone::from_value(phase),
        atr,
        atr_ratio,
        rsi,
        volume_ratio,
        golden_gate,
    })
}

/// Signed weighted vote of price against a set of EMAs, normalized by the
/// weight of the EMAs that exist. Ties count zero.
fn weighted_side(
    price: f64,
    weights: &[(usize, f64)],
    ema_at: impl Fn(usize) -> Option<f64>,
) -> f64 {
    let (score, total) = weights
        .iter()
        .filter_map(|(period, w)| ema_at(*period).map(|v| (v, *w)))
        .fold((0.0, 0.0), |(score, total), (v, w)| {
            let side = if price > v {
                w
            } else if price < v {
                -w
            } else {
                0.0
            };
            (score + side, total + w)
        });

    if total > 0.0 { score / total } else { 0.0 }
}

/// +1/-1 per adjacent ordered pair of the 5/8/13/21/48 EMAs
fn stack_count(ordered: &[Option<f64>; 5]) -> i8 {
    let Some(values) = ordered.iter().copied().collect::<Option<Vec<f64>>>() else {
        return 0;
    };
    values
        .windows(2)
        .map(|pair| {
            if pair[0] > pair[1] {
                1
            } else if pair[0] < pair[1] {
                -1
            } else {
                0
            }
        })
        .sum()
}

/// EMA13 crossing EMA48 between bar `i - 1` and bar `i`
fn cross_at(fast: &[Option<f64>], slow: &[Option<f64>], i: usize) -> Option<CrossDirection> {
    if i == 0 {
        return None;
    }
    let (Some(f0), Some(s0), Some(f1), Some(s1)) = (fast[i - 1], slow[i - 1], fast[i], slow[i])
    else {
        return None;
    };

    if f0 <= s0 && f1 > s1 {
        Some(CrossDirection::Up)
    } else if f0 >= s0 && f1 < s1 {
        Some(CrossDirection::Down)
    } else {
        None
    }
}

fn golden_gate(anchors: &DailyAnchors, prev_close: f64, price: f64, timestamp: i64) -> GoldenGate {
    let up = anchors.gate_up();
    let down = anchors.gate_down();
    let range = up - down;

    let distance = if range > 0.0 {
        let raw = if price >= anchors.prev_close {
            (price - down) / range
        } else {
            (up - price) / range
        };
        raw.clamp(0.0, 1.0)
    } else {
        0.5
    };

    GoldenGate {
        distance,
        up_cross_ts: (prev_close < up && price >= up).then_some(timestamp),
        down_cross_ts: (prev_close > down && price <= down).then_some(timestamp),
    }
}
