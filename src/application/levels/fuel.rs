use crate::application::indicators::primitives::clamp;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{Bundle, BundleMap};
use crate::domain::scoring::levels::{FuelGauge, FuelStatus};
use std::collections::BTreeMap;

/// Timeframes that carry a fuel gauge in the payload
pub const FUEL_TIMEFRAMES: [Timeframe; 4] = [
    Timeframe::ThirtyMin,
    Timeframe::TenMin,
    Timeframe::OneHour,
    Timeframe::OneDay,
];

const PHASE_SHARE: f64 = 0.6;
const RSI_SHARE: f64 = 0.4;

/// Room left in the move: a phase near zero and an RSI near 50 read as a
/// full tank. A missing bundle reads as half full.
pub fn fuel_gauge(bundle: Option<&Bundle>) -> FuelGauge {
    let Some(b) = bundle else {
        return FuelGauge::neutral();
    };

    let phase = if b.phase.is_finite() { b.phase } else { 0.0 };
    let rsi = if b.rsi.is_finite() { b.rsi } else { 50.0 };

    let phase_fuel = clamp(100.0 - phase.abs(), 0.0, 100.0);
    let rsi_fuel = clamp(100.0 - 2.0 * (rsi - 50.0).abs(), 0.0, 100.0);
    let fuel_pct = (phase_fuel * PHASE_SHARE + rsi_fuel * RSI_SHARE).round();

    let status = if fuel_pct >= 50.0 {
        FuelStatus::Healthy
    } else if fuel_pct >= 25.0 {
        FuelStatus::Low
    } else {
        FuelStatus::Critical
    };

    FuelGauge {
        fuel_pct,
        phase_fuel: phase_fuel.round(),
        rsi_fuel: rsi_fuel.round(),
        status,
    }
}

pub fn build_fuel_map(bundles: &BundleMap) -> BTreeMap<Timeframe, FuelGauge> {
    FUEL_TIMEFRAMES
        .iter()
        .map(|tf| (*tf, fuel_gauge(bundles.get(tf))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_bundle_is_half_full() {
        assert_eq!(fuel_gauge(None), FuelGauge::neutral());
        let map = build_fuel_map(&BundleMap::new());
        assert_eq!(map.len(), 4);
        assert!(map.values().all(|g| g.status == FuelStatus::Healthy));
    }

    fn gauge(phase: f64, rsi: f64) -> FuelGauge {
        let mut b = Bundle::fixture(Timeframe::OneHour);
        b.phase = phase;
        b.rsi = rsi;
        fuel_gauge(Some(&b))
    }

    #[test]
    fn test_fuel_blend_and_status_bands() {
        let full = gauge(0.0, 50.0);
        assert_eq!(full.fuel_pct, 100.0);
        assert_eq!(full.status, FuelStatus::Healthy);

        // 0.6 * 30 + 0.4 * 40
        let stretched = gauge(-70.0, 80.0);
        assert_eq!(stretched.phase_fuel, 30.0);
        assert_eq!(stretched.rsi_fuel, 40.0);
        assert_eq!(stretched.fuel_pct, 34.0);
        assert_eq!(stretched.status, FuelStatus::Low);
        assert_eq!(gauge(70.0, 20.0), stretched);

        let empty = gauge(120.0, 100.0);
        assert_eq!(empty.fuel_pct, 0.0);
        assert_eq!(empty.status, FuelStatus::Critical);
    }

    #[test]
    fn test_non_finite_inputs_read_as_neutral() {
        let g = gauge(f64::NAN, f64::INFINITY);
        assert_eq!(g.fuel_pct, 100.0);
        assert_eq!(g.status, FuelStatus::Healthy);
    }

    #[test]
    fn test_neutral_gauge_field_names() {
        let json = serde_json::to_value(FuelGauge::neutral()).unwrap();
        assert_eq!(json["fuelPct"], 50.0);
        assert_eq!(json["status"], "healthy");
    }
}
