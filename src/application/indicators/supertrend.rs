use crate::application::indicators::primitives::atr_series;
use crate::domain::market::bar::Bar;
use crate::domain::scoring::bundle::TrendDirection;

pub const DEFAULT_ATR_LEN: usize = 10;
pub const DEFAULT_FACTOR: f64 = 3.0;

/// SuperTrend line, direction and constrained bands, aligned with the bars
#[derive(Debug, Clone, Default)]
pub struct SuperTrendSeries {
    pub line: Vec<Option<f64>>,
    pub direction: Vec<Option<TrendDirection>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

impl SuperTrendSeries {
    /// Direction change on bar `i` relative to bar `i - 1`
    pub fn flipped_at(&self, i: usize) -> Option<TrendDirection> {
        let prev = i.checked_sub(1).and_then(|p| self.direction[p])?;
        let current = self.direction.get(i).copied().flatten()?;
        (prev != current).then_some(current)
    }
}

/// ATR-band trend follower.
///
/// Starts bullish on bar `atr_len` with the line on the lower band. On every
/// later bar the lower band may not drop while the previous close held above
/// it, and the upper band may not rise while the previous close held below
/// it. Bullish flips to bearish when the close breaks the lower band, bearish
/// flips to bullish when the close breaks the upper band.
pub fn supertrend(bars: &[Bar], factor: f64, atr_len: usize) -> SuperTrendSeries {
    let n = bars.len();
    let atr = atr_series(bars, atr_len);

    let mut upper: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut lower: Vec<Option<f64>> = Vec::with_capacity(n);
    for (bar, atr) in bars.iter().zip(&atr) {
        upper.push(atr.map(|a| bar.hl2() + factor * a));
        lower.push(atr.map(|a| bar.hl2() - factor * a));
    }

    let mut out = SuperTrendSeries {
        line: vec![None; n],
        direction: vec![None; n],
        upper,
        lower,
    };

    if atr_len >= n {
        return out;
    }

    out.direction[atr_len] = Some(TrendDirection::Bull);
    out.line[atr_len] = out.lower[atr_len];

    for i in (atr_len + 1)..n {
        let prev_dir = out.direction[i - 1];
        let (Some(mut up), Some(mut lo)) = (out.upper[i], out.lower[i]) else {
            out.direction[i] = prev_dir;
            out.line[i] = out.line[i - 1];
            continue;
        };

        let prev_close = bars[i - 1].close;
        if let Some(prev_lo) = out.lower[i - 1] {
            if lo < prev_lo && prev_close > prev_lo {
                lo = prev_lo;
            }
        }
        if let Some(prev_up) = out.upper[i - 1] {
            if up > prev_up && prev_close < prev_up {
                up = prev_up;
            }
        }
        out.upper[i] = Some(up);
        out.lower[i] = Some(lo);

        let close = bars[i].close;
        let (dir, line) = match prev_dir {
            Some(TrendDirection::Bull) if close < lo => (TrendDirection::Bear, up),
            Some(TrendDirection::Bull) => (TrendDirection::Bull, lo),
            _ if close > up => (TrendDirection::Bull, lo),
            _ => (TrendDirection::Bear, up),
        };
        out.direction[i] = Some(dir);
        out.line[i] = Some(line);
    }

    out
}
