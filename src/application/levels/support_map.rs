use crate::application::indicators::primitives::{clamp, round_to};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{BundleMap, Slope};
use crate::domain::scoring::levels::{SupportEntry, SupportMap};
use std::collections::BTreeMap;

/// Longer timeframes carry more weight
const SUPPORT_WEIGHTS: [(Timeframe, f64); 7] = [
    (Timeframe::OneWeek, 0.25),
    (Timeframe::OneDay, 0.22),
    (Timeframe::FourHour, 0.18),
    (Timeframe::OneHour, 0.14),
    (Timeframe::ThirtyMin, 0.10),
    (Timeframe::TenMin, 0.07),
    (Timeframe::FiveMin, 0.04),
];

/// Extra share of a timeframe's weight when its slope does not fight its direction
const SLOPE_BONUS: f64 = 0.3;
/// Raw score range is [-1.3, 1.3]
const RAW_SPAN: f64 = 1.0 + SLOPE_BONUS;

/// Aggregates SuperTrend direction and slope across the available timeframes.
///
/// The support score maps the weight-normalized raw tally onto [0, 1];
/// 0.5 is neutral and also the value with no timeframes.
pub fn build_support_map(bundles: &BundleMap) -> SupportMap {
    let mut map = BTreeMap::new();
    let mut weighted = 0.0;
    let mut total = 0.0;

    for (tf, weight) in SUPPORT_WEIGHTS {
        let Some(b) = bundles.get(&tf) else {
            continue;
        };

        let dir_sign = b.st_direction.sign();
        let aligned = match b.st_slope {
            Slope::Flat => true,
            slope => f64::from(slope.sign()) == dir_sign,
        };

        let mut tf_score = dir_sign * weight;
        if aligned {
            tf_score += weight * SLOPE_BONUS;
        }
        weighted += tf_score;
        total += weight;

        map.insert(
            tf,
            SupportEntry {
                dir: b.st_direction,
                slope: b.st_slope,
                aligned,
            },
        );
    }

    let raw = if total > 0.0 { weighted / total } else { 0.0 };
    let bull_count = map.values().filter(|e| e.dir.is_bull()).count();

    SupportMap {
        bull_count,
        bear_count: map.len() - bull_count,
        slope_aligned: map.values().filter(|e| e.aligned).count(),
        support_score: round_to(clamp((raw + RAW_SPAN) / (2.0 * RAW_SPAN), 0.0, 1.0), 3),
        map,
    }
}
