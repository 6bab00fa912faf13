use crate::application::indicators::primitives::atr_series;
use crate::domain::market::bar::Bar;
use ta::Next;
use ta::indicators::BollingerBands;

pub const SQUEEZE_LEN: usize = 20;
pub const BB_MULT: f64 = 2.0;
pub const KC_MULT: f64 = 1.5;

/// Bollinger-inside-Keltner compression state per bar
#[derive(Debug, Clone, Default)]
pub struct SqueezeSeries {
    pub on: Vec<bool>,
    /// Population standard deviation of closes over the squeeze window
    pub deviation: Vec<Option<f64>>,
}

impl SqueezeSeries {
    /// Squeeze was on at `i - 1` and is off at `i`
    pub fn released_at(&self, i: usize) -> bool {
        i > 0 && i < self.on.len() && self.on[i - 1] && !self.on[i]
    }
}

/// Squeeze is on when both Bollinger bands (SMA basis, `BB_MULT` deviations)
/// sit strictly inside the Keltner channel (same basis, `KC_MULT` x Wilder ATR).
pub fn squeeze(bars: &[Bar], len: usize) -> SqueezeSeries {
    let n = bars.len();
    let Ok(mut bb) = BollingerBands::new(len, BB_MULT) else {
        return SqueezeSeries {
            on: vec![false; n],
            deviation: vec![None; n],
        };
    };
    let atr = atr_series(bars, len);

    let mut on = Vec::with_capacity(n);
    let mut deviation = Vec::with_capacity(n);

    for (i, bar) in bars.iter().enumerate() {
        let bands = bb.next(bar.close);
        if i + 1 < len {
            on.push(false);
            deviation.push(None);
            continue;
        }

        deviation.push(Some((bands.upper - bands.average) / BB_MULT));
        let state = match atr[i] {
            Some(atr) => {
                let kc_upper = bands.average + KC_MULT * atr;
                let kc_lower = bands.average - KC_MULT * atr;
                bands.upper < kc_upper && bands.lower > kc_lower
            }
            None => false,
        };
        on.push(state);
    }

    SqueezeSeries { on, deviation }
}
