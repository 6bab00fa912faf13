//! Compact per-timeframe views of the bundles for dashboards.

use crate::application::indicators::primitives::round_to;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{Bundle, BundleMap, TrendDirection};
use crate::domain::scoring::levels::FuelGauge;
use crate::domain::scoring::payload::{
    AtrBand, EmaMapEntry, EmaTech, PhaseTech, RsiTech, SqueezeTech, TfTech,
};
use std::collections::BTreeMap;

/// `tf_tech` key of a timeframe
pub fn tech_label(tf: Timeframe) -> &'static str {
    match tf {
        Timeframe::FourHour => "4H",
        Timeframe::OneHour => "1H",
        other => other.key(),
    }
}

fn zone_label(zone: f64) -> (&'static str, Option<&'static str>) {
    if zone < 0.5 {
        ("0", Some("0.5"))
    } else if zone < 1.0 {
        ("0.5", Some("1.0"))
    } else if zone < 1.5 {
        ("1.0", Some("1.5"))
    } else if zone < 2.0 {
        ("1.5", Some("2.0"))
    } else {
        ("2.0", None)
    }
}

/// Price against EMA21 (EMA48, then price, when missing) in ATR units
fn atr_band(b: &Bundle) -> AtrBand {
    let pivot = b.ema(21).or(b.ema(48)).unwrap_or(b.price);
    let dist = b.price - pivot;
    let zone = if b.atr > 0.0 { dist.abs() / b.atr } else { 0.0 };
    let (lo, hi) = zone_label(zone);

    let flip = b.st_flip.map(|f| f.direction);
    AtrBand {
        s: if dist >= 0.0 { 1 } else { -1 },
        lo: lo.to_string(),
        hi: hi.map(str::to_string),
        x: flip,
        xd: flip.map(|d| if d.is_bull() { "up" } else { "dn" }.to_string()),
        // direction code: -1 bull, 1 bear
        xs: flip.map(|_| match b.st_direction {
            TrendDirection::Bull => -1,
            TrendDirection::Bear => 1,
        }),
    }
}

fn phase_dots(phase: f64) -> Vec<String> {
    let dot = if phase >= 100.0 {
        Some("P100")
    } else if phase >= 61.8 {
        Some("P618")
    } else if phase <= -100.0 {
        Some("N100")
    } else if phase <= -61.8 {
        Some("N618")
    } else {
        None
    };
    dot.map(|d| vec![d.to_string()]).unwrap_or_default()
}

fn tf_tech(b: &Bundle, fuel: Option<FuelGauge>) -> TfTech {
    TfTech {
        ema: EmaTech {
            stack: b.ema_stack,
            depth: b.ema_depth,
            structure: round_to(b.ema_structure, 3),
            momentum: round_to(b.ema_momentum, 3),
        },
        atr: atr_band(b),
        sq: SqueezeTech {
            s: u8::from(b.squeeze_on),
            r: u8::from(b.squeeze_release),
            c: u8::from(b.compressed),
        },
        rsi: RsiTech {
            r5: round_to(b.rsi, 1),
        },
        ph: PhaseTech {
            v: round_to(b.phase, 1),
            z: b.phase_zone,
            dots: phase_dots(b.phase),
        },
        fuel,
    }
}

/// `tf_tech` for every scored timeframe present
pub fn build_tf_tech(
    bundles: &BundleMap,
    fuel: &BTreeMap<Timeframe, FuelGauge>,
) -> BTreeMap<String, TfTech> {
    Timeframe::SCORED
        .iter()
        .filter_map(|tf| {
            let b = bundles.get(tf)?;
            Some((tech_label(*tf).to_string(), tf_tech(b, fuel.get(tf).copied())))
        })
        .collect()
}

pub fn build_ema_map(bundles: &BundleMap) -> BTreeMap<Timeframe, EmaMapEntry> {
    bundles
        .iter()
        .map(|(tf, b)| {
            (
                *tf,
                EmaMapEntry {
                    depth: b.ema_depth,
                    structure: round_to(b.ema_structure, 3),
                    momentum: round_to(b.ema_momentum, 3),
                    spread: round_to(b.ribbon_spread, 4),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(tech_label(Timeframe::FourHour), "4H");
        assert_eq!(tech_label(Timeframe::OneHour), "1H");
        assert_eq!(tech_label(Timeframe::ThirtyMin), "30");
        assert_eq!(tech_label(Timeframe::OneWeek), "W");
    }

    #[test]
    fn test_zone_labels() {
        assert_eq!(zone_label(0.2), ("0", Some("0.5")));
        assert_eq!(zone_label(1.0), ("1.0", Some("1.5")));
        assert_eq!(zone_label(2.0), ("2.0", None));
    }

    #[test]
    fn test_phase_dots() {
        assert_eq!(phase_dots(100.0), vec!["P100".to_string()]);
        assert_eq!(phase_dots(-70.0), vec!["N618".to_string()]);
        assert!(phase_dots(10.0).is_empty());
    }
}
