//! Series primitives shared by the bundle engine.
//!
//! Every function returns a series aligned with its input; slots without
//! enough history are `None`.

use crate::domain::market::bar::Bar;
use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Moving average seeded with the simple mean of its first `period` inputs,
/// then smoothed recursively with a fixed alpha.
///
/// `alpha = 2 / (period + 1)` gives a standard EMA, `alpha = 1 / period`
/// gives Wilder's RMA.
#[derive(Debug, Clone)]
pub struct SeededAverage {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    count: usize,
    current: Option<f64>,
}

impl SeededAverage {
    pub fn ema(period: usize) -> Self {
        Self::with_alpha(period, 2.0 / (period as f64 + 1.0))
    }

    pub fn wilder(period: usize) -> Self {
        Self::with_alpha(period, 1.0 / period.max(1) as f64)
    }

    fn with_alpha(period: usize, alpha: f64) -> Self {
        Self {
            period: period.max(1),
            alpha,
            seed_sum: 0.0,
            count: 0,
            current: None,
        }
    }
}

impl Next<f64> for SeededAverage {
    type Output = Option<f64>;

    fn next(&mut self, input: f64) -> Option<f64> {
        self.count += 1;

        match self.current {
            Some(prev) => {
                let value = self.alpha * input + (1.0 - self.alpha) * prev;
                self.current = Some(value);
            }
            None => {
                self.seed_sum += input;
                if self.count == self.period {
                    self.current = Some(self.seed_sum / self.period as f64);
                }
            }
        }

        self.current
    }
}

pub fn ema_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut ema = SeededAverage::ema(period);
    values.iter().map(|v| ema.next(*v)).collect()
}

/// Wilder smoothing; missing inputs count as zero
pub fn rma_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut rma = SeededAverage::wilder(period);
    values.iter().map(|v| rma.next(v.unwrap_or(0.0))).collect()
}

pub fn sma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let Ok(mut sma) = SimpleMovingAverage::new(period) else {
        return vec![None; values.len()];
    };
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let avg = sma.next(*v);
            (i + 1 >= period).then_some(avg)
        })
        .collect()
}

/// True range; the first bar uses its own high-low span
pub fn true_range_series(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let span = bar.high - bar.low;
            let tr = match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev_close) => span
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs()),
                None => span,
            };
            Some(tr)
        })
        .collect()
}

/// ATR as the Wilder average of true range
pub fn atr_series(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rma_series(&true_range_series(bars), period)
}

/// Rolling population standard deviation
pub fn stdev_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        out[i] = Some(var.sqrt());
    }
    out
}

/// Wilder RSI; 100 when the average loss is zero
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if closes.len() < period + 1 {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(Some(0.0));
    losses.push(Some(0.0));
    for pair in closes.windows(2) {
        let diff = pair[1] - pair[0];
        gains.push(Some(diff.max(0.0)));
        losses.push(Some((-diff).max(0.0)));
    }

    let avg_gain = rma_series(&gains, period);
    let avg_loss = rma_series(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(loss)) if loss == 0.0 => Some(100.0),
            (Some(gain), Some(loss)) => Some(100.0 - 100.0 / (1.0 + gain / loss)),
            _ => None,
        })
        .collect()
}

/// Least-squares line over each window, evaluated at the window's last point.
/// A window holding any missing value yields `None`.
pub fn linreg_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let n = period as f64;
    let sum_x: f64 = (0..period).map(|x| x as f64).sum();
    let sum_x2: f64 = (0..period).map(|x| (x * x) as f64).sum();
    let denom = n * sum_x2 - sum_x * sum_x;

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let Some(ys) = window.iter().copied().collect::<Option<Vec<f64>>>() else {
            continue;
        };

        if denom == 0.0 {
            out[i] = values[i];
            continue;
        }

        let sum_y: f64 = ys.iter().sum();
        let sum_xy: f64 = ys.iter().enumerate().map(|(x, y)| x as f64 * y).sum();
        let slope = (n * sum_xy - sum_x * sum_y) / denom;
        let intercept = (sum_y - slope * sum_x) / n;
        out[i] = Some(intercept + slope * (n - 1.0));
    }
    out
}

/// Last element of a series, flattened
pub fn last(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Second-to-last element of a series, flattened
pub fn prev(series: &[Option<f64>]) -> Option<f64> {
    series.len().checked_sub(2).and_then(|i| series[i])
}

pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Rounds half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ema = ema_series(&values, 3);
        assert_eq!(ema[0], None);
        assert_eq!(ema[1], None);
        assert!(approx(ema[2].unwrap(), 2.0));
        // k = 0.5
        assert!(approx(ema[3].unwrap(), 3.0));
        assert!(approx(ema[4].unwrap(), 4.0));
    }

    #[test]
    fn test_rma_uses_wilder_alpha() {
        let values: Vec<Option<f64>> = vec![Some(2.0), Some(4.0), Some(6.0), None];
        let rma = rma_series(&values, 2);
        assert!(approx(rma[1].unwrap(), 3.0));
        // 0.5 * 6 + 0.5 * 3
        assert!(approx(rma[2].unwrap(), 4.5));
        // missing input counts as zero
        assert!(approx(rma[3].unwrap(), 2.25));
    }

    #[test]
    fn test_sma_gated_until_full_window() {
        let sma = sma_series(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_eq!(sma[1], None);
        assert!(approx(sma[2].unwrap(), 4.0));
        assert!(approx(sma[3].unwrap(), 6.0));
    }

    #[test]
    fn test_stdev_is_population() {
        let sd = stdev_series(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        assert!(approx(sd[7].unwrap(), 2.0));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let rsi = rsi_series(&closes, 14);
        assert_eq!(rsi[12], None);
        assert_eq!(rsi[13], Some(100.0));
        assert_eq!(rsi[19], Some(100.0));
    }

    #[test]
    fn test_rsi_balanced_moves_near_50() {
        let closes: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let rsi = last(&rsi_series(&closes, 14)).unwrap();
        assert!((rsi - 50.0).abs() < 5.0);
    }

    #[test]
    fn test_linreg_on_line_returns_last_point() {
        let values: Vec<Option<f64>> = (0..10).map(|i| Some(3.0 + 2.0 * i as f64)).collect();
        let lr = linreg_series(&values, 5);
        assert_eq!(lr[3], None);
        assert!(approx(lr[9].unwrap(), 21.0));
    }

    #[test]
    fn test_linreg_skips_windows_with_gaps() {
        let values = vec![None, Some(1.0), Some(2.0), Some(3.0)];
        let lr = linreg_series(&values, 3);
        assert_eq!(lr[2], None);
        assert!(approx(lr[3].unwrap(), 3.0));
    }

    #[test]
    fn test_true_range_first_bar_uses_span() {
        let bars = vec![
            Bar::new(0, 10.0, 12.0, 9.0, 11.0, 0.0),
            Bar::new(1, 11.0, 11.5, 10.5, 11.0, 0.0),
            Bar::new(2, 14.0, 15.0, 13.5, 14.5, 0.0),
        ];
        let tr = true_range_series(&bars);
        assert_eq!(tr[0], Some(3.0));
        assert_eq!(tr[1], Some(1.0));
        assert_eq!(tr[2], Some(4.0));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-12.349, 1), -12.3);
    }
}
