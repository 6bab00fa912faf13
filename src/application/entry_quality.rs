//! 0-100 entry grade for a proposed side, split into structure (35),
//! momentum (35) and confirmation (30).

use crate::domain::market::market_regime::{SwingRegime, TrendRegime};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{Bundle, BundleMap, Slope, TrendDirection, gt, lt};
use crate::domain::scoring::levels::VolatilityTier;
use crate::domain::scoring::signals::{EntryQuality, EntryQualityDetail, Side};

const STRUCTURE_POINTS: [(Timeframe, u32); 5] = [
    (Timeframe::TenMin, 5),
    (Timeframe::ThirtyMin, 7),
    (Timeframe::OneHour, 8),
    (Timeframe::FourHour, 8),
    (Timeframe::OneDay, 7),
];

const MOMENTUM_TFS: [Timeframe; 4] = [
    Timeframe::TenMin,
    Timeframe::ThirtyMin,
    Timeframe::OneHour,
    Timeframe::FourHour,
];

const MOMENTUM_RAW_MIN: i32 = -20;
const MOMENTUM_RAW_SPAN: f64 = 56.0;
const SECTION_MAX: u32 = 35;
const CONFIRMATION_MAX: u32 = 30;

/// Grades an entry on `side` against the tier's minimum.
pub fn score_entry(
    side: Side,
    bundles: &BundleMap,
    regime: &SwingRegime,
    tier: VolatilityTier,
) -> EntryQuality {
    let structure_aligned: Vec<Timeframe> = STRUCTURE_POINTS
        .iter()
        .filter(|(tf, _)| bundles.get(tf).is_some_and(|b| ema_agrees(b, side)))
        .map(|(tf, _)| *tf)
        .collect();
    let structure: u32 = STRUCTURE_POINTS
        .iter()
        .filter(|(tf, _)| structure_aligned.contains(tf))
        .map(|(_, pts)| pts)
        .sum();

    let momentum_raw: i32 = MOMENTUM_TFS
        .iter()
        .filter_map(|tf| bundles.get(tf))
        .map(|b| supertrend_points(b, side))
        .sum();
    let momentum = rescale_momentum(momentum_raw);

    let one_hour = bundles.get(&Timeframe::OneHour);
    let regime_points = regime_points(regime, side);
    let phase_points = one_hour.map_or(0, |b| phase_points(b.phase));
    let rsi_points = one_hour.map_or(0, |b| rsi_points(b.rsi, side));
    let squeeze_bonus = if [Timeframe::ThirtyMin, Timeframe::OneHour]
        .iter()
        .any(|tf| bundles.get(tf).is_some_and(|b| b.squeeze_release))
    {
        5
    } else {
        0
    };
    let confirmation =
        (regime_points + phase_points + rsi_points + squeeze_bonus).min(CONFIRMATION_MAX);

    let score = (structure + momentum + confirmation).min(100);
    let min_required = tier.min_entry_quality();

    EntryQuality {
        side,
        score,
        structure,
        momentum,
        confirmation,
        min_required,
        meets_minimum: score >= min_required,
        details: EntryQualityDetail {
            structure_aligned,
            momentum_raw,
            regime_points,
            phase_points,
            rsi_points,
            squeeze_bonus,
        },
    }
}

fn ema_agrees(b: &Bundle, side: Side) -> bool {
    match side {
        Side::Long => gt(b.ema(13), b.ema(48)),
        Side::Short => lt(b.ema(13), b.ema(48)),
    }
}

fn supertrend_points(b: &Bundle, side: Side) -> i32 {
    let supportive = matches!(
        (side, b.st_direction),
        (Side::Long, TrendDirection::Bull) | (Side::Short, TrendDirection::Bear)
    );
    let with_side = matches!(
        (side, b.st_slope),
        (Side::Long, Slope::Rising) | (Side::Short, Slope::Falling)
    );
    let against_side = matches!(
        (side, b.st_slope),
        (Side::Long, Slope::Falling) | (Side::Short, Slope::Rising)
    );

    match (supportive, with_side, against_side) {
        (true, true, _) => 9,
        (true, false, _) => 5,
        (false, _, true) => -5,
        (false, _, false) => -2,
    }
}

/// Linear map of the raw tally [-20, 36] onto [0, 35]
fn rescale_momentum(raw: i32) -> u32 {
    let scaled = (f64::from(raw - MOMENTUM_RAW_MIN) / MOMENTUM_RAW_SPAN * f64::from(SECTION_MAX))
        .round();
    scaled.clamp(0.0, f64::from(SECTION_MAX)) as u32
}

fn regime_points(regime: &SwingRegime, side: Side) -> u32 {
    let agrees = |r: TrendRegime| match side {
        Side::Long => r == TrendRegime::Uptrend,
        Side::Short => r == TrendRegime::Downtrend,
    };
    let opposes = |r: TrendRegime| match side {
        Side::Long => r == TrendRegime::Downtrend,
        Side::Short => r == TrendRegime::Uptrend,
    };

    let (d, w) = (regime.daily, regime.weekly);
    if !opposes(d) && !opposes(w) && (agrees(d) || agrees(w)) {
        12
    } else if d == TrendRegime::Transition && w == TrendRegime::Transition {
        6
    } else {
        0
    }
}

fn phase_points(phase: f64) -> u32 {
    let abs = phase.abs();
    if abs < 61.8 {
        8
    } else if abs < 80.0 {
        4
    } else {
        0
    }
}

fn rsi_points(rsi: f64, side: Side) -> u32 {
    let (ideal, acceptable) = match side {
        Side::Long => ((40.0, 65.0), (30.0, 75.0)),
        Side::Short => ((35.0, 60.0), (25.0, 70.0)),
    };
    let within = |(lo, hi): (f64, f64)| rsi >= lo && rsi <= hi;

    if within(ideal) {
        10
    } else if within(acceptable) {
        5
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_momentum_rescale_endpoints() {
        assert_eq!(rescale_momentum(-20), 0);
        assert_eq!(rescale_momentum(36), 35);
        // (0 + 20) / 56 * 35 = 12.5
        assert_eq!(rescale_momentum(0), 13);
        assert_eq!(rescale_momentum(100), 35);
    }

    #[test]
    fn test_regime_points() {
        let up_transition = SwingRegime::new(TrendRegime::Uptrend, TrendRegime::Transition);
        assert_eq!(regime_points(&up_transition, Side::Long), 12);
        assert_eq!(regime_points(&up_transition, Side::Short), 0);

        let flat = SwingRegime::default();
        assert_eq!(regime_points(&flat, Side::Long), 6);
        assert_eq!(regime_points(&flat, Side::Short), 6);

        let mixed = SwingRegime::new(TrendRegime::Uptrend, TrendRegime::Downtrend);
        assert_eq!(regime_points(&mixed, Side::Long), 0);
    }

    #[test]
    fn test_rsi_bands_depend_on_side() {
        assert_eq!(rsi_points(62.0, Side::Long), 10);
        assert_eq!(rsi_points(62.0, Side::Short), 5);
        assert_eq!(rsi_points(37.0, Side::Short), 10);
        assert_eq!(rsi_points(80.0, Side::Long), 0);
    }

    #[test]
    fn test_phase_points() {
        assert_eq!(phase_points(-61.0), 8);
        assert_eq!(phase_points(61.8), 4);
        assert_eq!(phase_points(95.0), 0);
    }

    fn trending_bundles(tfs: &[Timeframe]) -> BundleMap {
        tfs.iter()
            .map(|tf| {
                let mut b = Bundle::fixture(*tf);
                b.emas[3] = Some(105.0);
                b.emas[6] = Some(100.0);
                b.st_slope = Slope::Rising;
                (*tf, b)
            })
            .collect()
    }

    #[test]
    fn test_full_alignment_caps_each_section() {
        let mut bundles = trending_bundles(&Timeframe::SWING);
        if let Some(b) = bundles.get_mut(&Timeframe::ThirtyMin) {
            b.squeeze_release = true;
        }
        let regime = SwingRegime::new(TrendRegime::Uptrend, TrendRegime::Uptrend);

        let long = score_entry(Side::Long, &bundles, &regime, VolatilityTier::Extreme);
        assert_eq!(long.structure, 35);
        assert_eq!(long.details.structure_aligned.len(), 5);
        assert_eq!(long.details.momentum_raw, 36);
        assert_eq!(long.momentum, 35);
        // 12 + 8 + 10 + 5 capped at 30
        assert_eq!(long.details.squeeze_bonus, 5);
        assert_eq!(long.confirmation, 30);
        assert_eq!(long.score, 100);
        assert_eq!(long.min_required, 70);
        assert!(long.meets_minimum);

        let short = score_entry(Side::Short, &bundles, &regime, VolatilityTier::High);
        assert_eq!(short.structure, 0);
        assert_eq!(short.details.momentum_raw, -20);
        assert_eq!(short.momentum, 0);
        assert_eq!(short.details.regime_points, 0);
        assert_eq!(short.confirmation, 23);
        assert_eq!(short.score, 23);
        assert_eq!(short.min_required, 65);
        assert!(!short.meets_minimum);
    }

    #[test]
    fn test_structure_points_per_timeframe() {
        let mut bundles = trending_bundles(&[Timeframe::TenMin, Timeframe::OneHour]);
        if let Some(b) = bundles.get_mut(&Timeframe::TenMin) {
            b.st_direction = TrendDirection::Bear;
            b.st_slope = Slope::Flat;
        }
        let quality = score_entry(
            Side::Long,
            &bundles,
            &SwingRegime::default(),
            VolatilityTier::Medium,
        );
        assert_eq!(quality.structure, 13);
        assert_eq!(
            quality.details.structure_aligned,
            vec![Timeframe::TenMin, Timeframe::OneHour]
        );
        // -2 + 9, rescaled from 27 / 56 * 35
        assert_eq!(quality.details.momentum_raw, 7);
        assert_eq!(quality.momentum, 17);
        // 6 + 8 + 10
        assert_eq!(quality.confirmation, 24);
        assert_eq!(quality.score, 54);
        assert_eq!(quality.min_required, 60);
    }

    #[test]
    fn test_empty_bundles_grade_on_regime_only() {
        let quality = score_entry(
            Side::Long,
            &BundleMap::new(),
            &SwingRegime::default(),
            VolatilityTier::Low,
        );
        assert_eq!(quality.structure, 0);
        assert_eq!(quality.momentum, 13);
        assert_eq!(quality.confirmation, 6);
        assert_eq!(quality.score, 19);
        assert_eq!(quality.min_required, 55);
        assert!(!quality.meets_minimum);
    }
}
