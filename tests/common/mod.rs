#![allow(dead_code)]

use mtf_state::domain::market::bar::Bar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 2024-01-01 00:00:00 UTC, a Monday
pub const BASE_TS: i64 = 1_704_067_200_000;
pub const MINUTE_MS: i64 = 60_000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const WEEK_MS: i64 = 7 * DAY_MS;

/// Bar with a one-point range around `close`
pub fn bar_at(ts: i64, close: f64) -> Bar {
    Bar::new(ts, close, close + 0.5, close - 0.5, close, 1_000.0)
}

/// One bar per close, `step_ms` apart starting at `start`
pub fn series(start: i64, step_ms: i64, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| bar_at(start + i as i64 * step_ms, *c))
        .collect()
}

/// Strictly rising closes: `first`, `first + slope`, ...
pub fn trending(n: usize, step_ms: i64, first: f64, slope: f64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n).map(|i| first + slope * i as f64).collect();
    series(BASE_TS, step_ms, &closes)
}

/// Seeded random walk with ranges wide enough to move the ATR bands
pub fn random_walk(seed: u64, n: usize, step_ms: i64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = 100.0_f64;
    (0..n)
        .map(|i| {
            let open = close;
            close = (close + rng.random_range(-2.0..2.0)).max(5.0);
            let high = open.max(close) + rng.random_range(0.05..1.0);
            let low = open.min(close) - rng.random_range(0.05..1.0);
            Bar::new(BASE_TS + i as i64 * step_ms, open, high, low, close, 1_000.0)
        })
        .collect()
}
