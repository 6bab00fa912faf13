use crate::application::indicators::primitives::{clamp, round_to};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::BundleMap;
use crate::domain::scoring::levels::{AtrLevels, FibLevel, Gate, GateSide, Horizon};
use std::collections::BTreeMap;

pub const FIB_RATIOS: [f64; 11] = [
    0.236, 0.382, 0.5, 0.618, 0.786, 1.0, 1.236, 1.618, 2.0, 2.618, 3.0,
];

const TRIGGER_RATIO: f64 = 0.236;
const GATE_ENTRY_RATIO: f64 = 0.382;
const GATE_TARGET_RATIO: f64 = 0.618;

/// Weeks per month, quarter and year used to scale weekly ATR
const WEEKS_PER_MONTH: f64 = 4.33;
const WEEKS_PER_QUARTER: f64 = 13.0;
const WEEKS_PER_YEAR: f64 = 52.0;

fn cents(value: f64) -> f64 {
    round_to(value, 2)
}

/// Fibonacci ladder of `atr` around `prev_close`, with the Golden-Gate
/// tracker for `price`. `None` unless the anchor is finite and `atr` positive.
pub fn compute_atr_levels(
    prev_close: f64,
    atr: f64,
    price: f64,
    horizon: Horizon,
) -> Option<AtrLevels> {
    if !prev_close.is_finite() || !atr.is_finite() || atr <= 0.0 {
        return None;
    }

    let ladder = |sign: f64| -> Vec<FibLevel> {
        FIB_RATIOS
            .iter()
            .map(|ratio| FibLevel {
                ratio: *ratio,
                price: cents(prev_close + sign * ratio * atr),
                label: format!("{}{:.1}%", if sign > 0.0 { "+" } else { "-" }, ratio * 100.0),
            })
            .collect()
    };

    Some(AtrLevels {
        prev_close: cents(prev_close),
        atr: cents(atr),
        trigger_up: cents(prev_close + TRIGGER_RATIO * atr),
        trigger_dn: cents(prev_close - TRIGGER_RATIO * atr),
        levels_up: ladder(1.0),
        levels_dn: ladder(-1.0),
        gate: price
            .is_finite()
            .then(|| gate(prev_close, atr, price, horizon))
            .flatten(),
    })
}

fn gate(prev_close: f64, atr: f64, price: f64, horizon: Horizon) -> Option<Gate> {
    let entry_up = prev_close + GATE_ENTRY_RATIO * atr;
    let target_up = prev_close + GATE_TARGET_RATIO * atr;
    let entry_dn = prev_close - GATE_ENTRY_RATIO * atr;
    let target_dn = prev_close - GATE_TARGET_RATIO * atr;

    let (side, entry, target, travelled) = if price >= entry_up {
        (GateSide::Bull, entry_up, target_up, price - entry_up)
    } else if price <= entry_dn {
        (GateSide::Bear, entry_dn, target_dn, entry_dn - price)
    } else {
        return None;
    };

    let range = (target - entry).abs();
    let progress = if range > 0.0 {
        clamp(travelled / range, 0.0, 1.0)
    } else {
        0.0
    };

    Some(Gate {
        side,
        entered: true,
        completed: match side {
            GateSide::Bull => price >= target,
            GateSide::Bear => price <= target,
        },
        entry_level: cents(entry),
        target_level: cents(target),
        progress_pct: round_to(progress, 3),
        horizon,
    })
}

/// Ladders for every horizon the bundles support.
///
/// Day uses the Daily bundle, Week the Weekly bundle, and the longer horizons
/// scale weekly ATR by the square root of the weeks they span. Each horizon is
/// anchored on its bundle's previous close.
pub fn build_atr_level_maps(bundles: &BundleMap, price: f64) -> BTreeMap<Horizon, AtrLevels> {
    let mut maps = BTreeMap::new();

    if let Some(daily) = bundles.get(&Timeframe::OneDay) {
        if let Some(levels) = compute_atr_levels(daily.prev_close, daily.atr, price, Horizon::Day) {
            maps.insert(Horizon::Day, levels);
        }
    }

    if let Some(weekly) = bundles.get(&Timeframe::OneWeek) {
        let horizons = [
            (Horizon::Week, 1.0),
            (Horizon::Month, WEEKS_PER_MONTH),
            (Horizon::Quarter, WEEKS_PER_QUARTER),
            (Horizon::Longterm, WEEKS_PER_YEAR),
        ];
        for (horizon, weeks) in horizons {
            let atr = weekly.atr * f64::sqrt(weeks);
            if let Some(levels) = compute_atr_levels(weekly.prev_close, atr, price, horizon) {
                maps.insert(horizon, levels);
            }
        }
    }

    maps
}

/// Gates entered but not yet completed, in horizon order
pub fn active_gates(levels: &BTreeMap<Horizon, AtrLevels>) -> Vec<Gate> {
    levels
        .values()
        .filter_map(|l| l.gate.as_ref())
        .filter(|g| g.entered && !g.completed)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_prices_and_labels() {
        let levels = compute_atr_levels(100.0, 10.0, 100.0, Horizon::Day).unwrap();
        assert_eq!(levels.levels_up.len(), 11);
        assert_eq!(levels.levels_up[0].price, 102.36);
        assert_eq!(levels.levels_up[0].label, "+23.6%");
        assert_eq!(levels.levels_dn[3].price, 93.82);
        assert_eq!(levels.levels_dn[3].label, "-61.8%");
        assert_eq!(levels.levels_up[10].label, "+300.0%");
        assert_eq!(levels.trigger_up, 102.36);
        assert_eq!(levels.trigger_dn, 97.64);
        assert!(levels.gate.is_none());
    }

    #[test]
    fn test_invalid_anchor_has_no_levels() {
        assert!(compute_atr_levels(100.0, 0.0, 100.0, Horizon::Day).is_none());
        assert!(compute_atr_levels(f64::NAN, 1.0, 100.0, Horizon::Week).is_none());
    }

    #[test]
    fn test_bull_gate_progress() {
        // entry 103.82, target 106.18
        let levels = compute_atr_levels(100.0, 10.0, 105.0, Horizon::Week).unwrap();
        let gate = levels.gate.unwrap();
        assert_eq!(gate.side, GateSide::Bull);
        assert!(!gate.completed);
        assert_eq!(gate.entry_level, 103.82);
        assert_eq!(gate.target_level, 106.18);
        assert_eq!(gate.progress_pct, 0.5);
        assert_eq!(gate.horizon, Horizon::Week);
    }

    #[test]
    fn test_completed_bear_gate_is_not_active() {
        let mut maps = BTreeMap::new();
        maps.insert(
            Horizon::Day,
            compute_atr_levels(100.0, 10.0, 90.0, Horizon::Day).unwrap(),
        );
        maps.insert(
            Horizon::Week,
            compute_atr_levels(100.0, 20.0, 90.0, Horizon::Week).unwrap(),
        );

        let day_gate = maps[&Horizon::Day].gate.clone().unwrap();
        assert_eq!(day_gate.side, GateSide::Bear);
        assert!(day_gate.completed);
        assert_eq!(day_gate.progress_pct, 1.0);

        // week: entry 92.36, target 87.64, price 90 is halfway
        let active = active_gates(&maps);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].horizon, Horizon::Week);
    }
}
