use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{Bundle, BundleMap, PhaseZone, TrendDirection};
use crate::domain::scoring::payload::Flags;

/// Event markers raised by the last bar of each intraday bundle.
pub fn detect_flags(bundles: &BundleMap) -> Flags {
    let mut flags = Flags::default();
    let b30 = bundles.get(&Timeframe::ThirtyMin);
    let b60 = bundles.get(&Timeframe::OneHour);
    let b10 = bundles.get(&Timeframe::TenMin);
    let b5 = bundles.get(&Timeframe::FiveMin);

    let flip_ts = |b: Option<&Bundle>| b.and_then(|b| b.st_flip).map(|f| f.timestamp);

    // SuperTrend flips
    flags.st_flip_30m_ts = flip_ts(b30);
    flags.st_flip_30m = flags.st_flip_30m_ts.is_some();
    flags.st_flip_1h_ts = flip_ts(b60);
    flags.st_flip_1h = flags.st_flip_1h_ts.is_some();
    flags.st_flip_10m_ts = flip_ts(b10);
    flags.st_flip_10m = flags.st_flip_10m_ts.is_some();
    flags.st_flip_5m_ts = flip_ts(b5);
    flags.st_flip_5m = flags.st_flip_5m_ts.is_some();

    flags.st_flip_bear_ts = [b30, b60]
        .into_iter()
        .flatten()
        .filter_map(|b| b.st_flip)
        .filter(|f| f.direction == TrendDirection::Bear)
        .map(|f| f.timestamp)
        .max();
    flags.st_flip_bear = flags.st_flip_bear_ts.is_some();

    // EMA 13/48 crosses on the last bar
    flags.ema_cross_1h_13_48_ts = b60.and_then(|b| b.ema_cross).map(|c| c.timestamp);
    flags.ema_cross_1h_13_48 = flags.ema_cross_1h_13_48_ts.is_some();
    flags.ema_cross_30m_13_48_ts = b30.and_then(|b| b.ema_cross).map(|c| c.timestamp);
    flags.ema_cross_30m_13_48 = flags.ema_cross_30m_13_48_ts.is_some();

    // Squeeze releases
    flags.sq30_release_ts = b30.and_then(|b| b.squeeze_release_ts());
    flags.sq30_release = flags.sq30_release_ts.is_some();
    flags.sq1h_release_ts = b60.and_then(|b| b.squeeze_release_ts());
    flags.sq1h_release = flags.sq1h_release_ts.is_some();

    let strong_momentum = [b30, b10, b5]
        .into_iter()
        .flatten()
        .filter(|b| b.momentum_strength().is_some_and(|s| s.abs() > 1.0))
        .count();
    flags.momentum_elite = strong_momentum >= 2;

    flags.phase_zone_change = [b30, b10]
        .into_iter()
        .flatten()
        .any(|b| b.phase_zone == PhaseZone::Extreme);

    flags
}
