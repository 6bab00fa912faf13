use crate::domain::market::bar::Bar;
use crate::domain::market::market_regime::{Pivot, SwingRegime, TrendRegime};

pub const DAILY_PIVOT_LOOKBACK: usize = 15;
pub const WEEKLY_PIVOT_LOOKBACK: usize = 10;

/// Confirmed swing highs and lows of one series, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pivots {
    pub highs: Vec<Pivot>,
    pub lows: Vec<Pivot>,
}

/// Detects daily and weekly trend structure from confirmed pivots
pub struct SwingRegimeDetector {
    daily_lookback: usize,
    weekly_lookback: usize,
}

impl Default for SwingRegimeDetector {
    fn default() -> Self {
        Self::new(DAILY_PIVOT_LOOKBACK, WEEKLY_PIVOT_LOOKBACK)
    }
}

impl SwingRegimeDetector {
    pub fn new(daily_lookback: usize, weekly_lookback: usize) -> Self {
        Self {
            daily_lookback: daily_lookback.max(1),
            weekly_lookback: weekly_lookback.max(1),
        }
    }

    /// Missing series read as transition
    pub fn detect(&self, daily: Option<&[Bar]>, weekly: Option<&[Bar]>) -> SwingRegime {
        let daily_regime = daily
            .map(|bars| classify_trend(&find_pivots(bars, self.daily_lookback)))
            .unwrap_or_default();
        let weekly_regime = weekly
            .map(|bars| classify_trend(&find_pivots(bars, self.weekly_lookback)))
            .unwrap_or_default();

        SwingRegime::new(daily_regime, weekly_regime)
    }
}

/// A pivot high at `i` has a high strictly above every high within
/// `lookback` bars on both sides; pivot lows mirror this. Bars closer than
/// `lookback` to either end cannot be confirmed.
pub fn find_pivots(bars: &[Bar], lookback: usize) -> Pivots {
    let mut pivots = Pivots::default();
    if lookback == 0 || bars.len() < 2 * lookback + 1 {
        return pivots;
    }

    for i in lookback..bars.len() - lookback {
        let window = bars[i - lookback..=i + lookback]
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != lookback);

        let bar = &bars[i];
        let mut is_high = true;
        let mut is_low = true;
        for (_, other) in window {
            is_high &= bar.high > other.high;
            is_low &= bar.low < other.low;
            if !is_high && !is_low {
                break;
            }
        }

        if is_high {
            pivots.highs.push(Pivot {
                index: i,
                timestamp: bar.timestamp,
                price: bar.high,
            });
        }
        if is_low {
            pivots.lows.push(Pivot {
                index: i,
                timestamp: bar.timestamp,
                price: bar.low,
            });
        }
    }

    pivots
}

/// Higher high with higher low is an uptrend, lower high with lower low a
/// downtrend. Anything else, including fewer than two pivots of either
/// kind, is transition.
pub fn classify_trend(pivots: &Pivots) -> TrendRegime {
    let (Some((h1, h2)), Some((l1, l2))) = (last_two(&pivots.highs), last_two(&pivots.lows)) else {
        return TrendRegime::Transition;
    };

    if h2.price > h1.price && l2.price > l1.price {
        TrendRegime::Uptrend
    } else if h2.price < h1.price && l2.price < l1.price {
        TrendRegime::Downtrend
    } else {
        TrendRegime::Transition
    }
}

fn last_two(pivots: &[Pivot]) -> Option<(Pivot, Pivot)> {
    match pivots {
        [.., a, b] => Some((*a, *b)),
        _ => None,
    }
}
