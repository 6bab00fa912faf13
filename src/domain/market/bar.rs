use crate::domain::errors::EngineError;
use crate::domain::market::timeframe::Timeframe;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One OHLCV bar. Timestamps are Unix milliseconds, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Midpoint of the bar's range (Pine `hl2`)
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    fn prices_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Filters non-finite bars and rejects series whose timestamps are not strictly
/// ascending.
///
/// A bar with any non-finite price is dropped so it contributes no signal; a
/// non-finite volume is read as zero. Duplicate or out-of-order timestamps fail
/// closed: the whole timeframe is reported as a data-quality problem.
pub fn prepare_bars(timeframe: Timeframe, bars: &[Bar]) -> Result<Vec<Bar>, EngineError> {
    let mut prepared = Vec::with_capacity(bars.len());

    for bar in bars.iter().filter(|b| b.prices_finite()) {
        if let Some(prev) = prepared.last().map(|b: &Bar| b.timestamp) {
            if bar.timestamp <= prev {
                return Err(EngineError::DataQuality {
                    timeframe,
                    reason: if bar.timestamp == prev {
                        format!("duplicate timestamp {}", bar.timestamp)
                    } else {
                        format!("timestamp {} precedes {}", bar.timestamp, prev)
                    },
                });
            }
        }

        let mut bar = *bar;
        if !bar.volume.is_finite() {
            bar.volume = 0.0;
        }
        prepared.push(bar);
    }

    Ok(prepared)
}

/// Keeps at most one bar per calendar period, the last one seen.
///
/// Daily bars group by UTC date, weekly by ISO week, monthly by year-month and
/// intraday bars by exact timestamp. Output is sorted ascending. This is the
/// ingestion-side cleanup; the core itself never deduplicates.
pub fn deduplicate_by_period(bars: &[Bar], timeframe: Timeframe) -> Vec<Bar> {
    if bars.len() <= 1 {
        return bars.to_vec();
    }

    let mut by_period: BTreeMap<(i32, u32, u32, i64), Bar> = BTreeMap::new();
    for bar in bars {
        by_period.insert(period_key(bar.timestamp, timeframe), *bar);
    }

    let mut out: Vec<Bar> = by_period.into_values().collect();
    out.sort_by_key(|b| b.timestamp);
    out
}

fn period_key(timestamp_ms: i64, timeframe: Timeframe) -> (i32, u32, u32, i64) {
    let Some(dt) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms) else {
        return (0, 0, 0, timestamp_ms);
    };

    match timeframe {
        Timeframe::OneDay => (dt.year(), dt.month(), dt.day(), 0),
        Timeframe::OneWeek => {
            let week = dt.iso_week();
            (week.year(), week.week(), 0, 0)
        }
        Timeframe::OneMonth => (dt.year(), dt.month(), 0, 0),
        _ => (0, 0, 0, timestamp_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;
    // 2024-01-01 00:00:00 UTC (a Monday)
    const BASE: i64 = 1_704_067_200_000;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar::new(ts, close, close + 1.0, close - 1.0, close, 1000.0)
    }

    #[test]
    fn test_prepare_drops_non_finite_prices() {
        let bars = vec![
            bar(BASE, 10.0),
            Bar::new(BASE + DAY_MS, f64::NAN, 11.0, 9.0, 10.0, 100.0),
            bar(BASE + 2 * DAY_MS, 12.0),
        ];
        let prepared = prepare_bars(Timeframe::OneDay, &bars).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[1].close, 12.0);
    }

    #[test]
    fn test_prepare_zeroes_non_finite_volume() {
        let mut b = bar(BASE, 10.0);
        b.volume = f64::INFINITY;
        let prepared = prepare_bars(Timeframe::OneDay, &[b]).unwrap();
        assert_eq!(prepared[0].volume, 0.0);
    }

    #[test]
    fn test_prepare_rejects_duplicate_timestamps() {
        let bars = vec![bar(BASE, 10.0), bar(BASE, 10.5)];
        let err = prepare_bars(Timeframe::OneDay, &bars).unwrap_err();
        assert!(matches!(err, EngineError::DataQuality { .. }));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_prepare_rejects_out_of_order() {
        let bars = vec![bar(BASE + DAY_MS, 10.0), bar(BASE, 10.5)];
        assert!(prepare_bars(Timeframe::OneHour, &bars).is_err());
    }

    #[test]
    fn test_dedupe_daily_keeps_last_bar_of_date() {
        let four_hours = 4 * 3_600_000;
        let bars = vec![
            bar(BASE, 10.0),
            bar(BASE + four_hours, 11.0),
            bar(BASE + DAY_MS, 12.0),
        ];
        let out = deduplicate_by_period(&bars, Timeframe::OneDay);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].close, 11.0);
        assert_eq!(out[1].close, 12.0);
    }

    #[test]
    fn test_dedupe_weekly_groups_iso_week() {
        let bars = vec![
            bar(BASE, 10.0),
            bar(BASE + 3 * DAY_MS, 11.0),
            bar(BASE + 7 * DAY_MS, 12.0),
        ];
        let out = deduplicate_by_period(&bars, Timeframe::OneWeek);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].close, 11.0);
    }

    #[test]
    fn test_dedupe_intraday_by_exact_timestamp() {
        let bars = vec![bar(BASE, 10.0), bar(BASE, 10.2), bar(BASE + 300_000, 10.4)];
        let out = deduplicate_by_period(&bars, Timeframe::FiveMin);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].close, 10.2);
    }
}
