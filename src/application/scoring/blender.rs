//! Weighted cross-timeframe blends of the per-timeframe scores.

use crate::application::indicators::primitives::clamp;
use crate::application::scoring::timeframe_scores::{SCORE_LIMIT, htf_score, ltf_score};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{BundleMap, DailyAnchors};
use crate::domain::scoring::weights::LearnedWeights;
use serde::Serialize;

/// One timeframe's contribution to a blend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendComponent {
    pub timeframe: Timeframe,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Blend {
    pub score: f64,
    pub components: Vec<BlendComponent>,
}

impl Blend {
    pub fn weight_sum(&self) -> f64 {
        self.components.iter().map(|c| c.weight).sum()
    }
}

/// Base HTF weight with its volatility adjustment: (base, ATR-ratio
/// threshold, multiplier above, multiplier at or below).
fn htf_weight_rule(timeframe: Timeframe) -> Option<(f64, f64, f64, f64)> {
    match timeframe {
        Timeframe::OneWeek => Some((0.50, 1.5, 0.7, 1.2)),
        Timeframe::OneDay => Some((0.35, 1.3, 1.2, 0.9)),
        Timeframe::FourHour => Some((0.10, 1.2, 1.3, 0.8)),
        Timeframe::OneHour => Some((0.05, 1.1, 1.2, 0.9)),
        _ => None,
    }
}

fn ltf_base_weight(timeframe: Timeframe, is_rth: bool) -> Option<f64> {
    let (base, rth_mult) = match timeframe {
        Timeframe::ThirtyMin => (0.55, 1.15),
        Timeframe::TenMin => (0.30, 1.0),
        Timeframe::FiveMin => (0.15, 0.7),
        _ => return None,
    };
    Some(if is_rth { base * rth_mult } else { base })
}

/// HTF blend over Weekly/Daily/4H/1H.
///
/// Each present timeframe's base weight is scaled by its ATR-ratio rule and
/// its learned multiplier, then weights are renormalized over the
/// timeframes actually present. `None` when none of them is present.
pub fn blend_htf(bundles: &BundleMap, learned: &LearnedWeights) -> Option<Blend> {
    let raw: Vec<(Timeframe, f64, f64)> = Timeframe::HTF
        .iter()
        .filter_map(|tf| {
            let bundle = bundles.get(tf)?;
            let (base, threshold, above, below) = htf_weight_rule(*tf)?;
            let vol_mult = if bundle.atr_ratio > threshold { above } else { below };
            let weight = base * vol_mult * learned.htf_multiplier(*tf);
            Some((*tf, htf_score(bundle), weight))
        })
        .collect();

    normalize(raw)
}

/// LTF blend over 30m/10m/5m. During regular hours the 30m weight is raised
/// and the 5m weight lowered before renormalization.
pub fn blend_ltf(
    bundles: &BundleMap,
    anchors: Option<&DailyAnchors>,
    is_rth: bool,
    learned: &LearnedWeights,
) -> Option<Blend> {
    let raw: Vec<(Timeframe, f64, f64)> = Timeframe::LTF
        .iter()
        .filter_map(|tf| {
            let bundle = bundles.get(tf)?;
            let weight = ltf_base_weight(*tf, is_rth)? * learned.ltf_multiplier(*tf);
            Some((*tf, ltf_score(bundle, anchors), weight))
        })
        .collect();

    normalize(raw)
}

fn normalize(raw: Vec<(Timeframe, f64, f64)>) -> Option<Blend> {
    let total: f64 = raw.iter().map(|(_, _, w)| w).sum();
    if raw.is_empty() || total <= 0.0 {
        return None;
    }

    let components: Vec<BlendComponent> = raw
        .into_iter()
        .map(|(timeframe, score, weight)| BlendComponent {
            timeframe,
            score,
            weight: weight / total,
        })
        .collect();
    let score = components.iter().map(|c| c.score * c.weight).sum::<f64>();

    Some(Blend {
        score: clamp(score, -SCORE_LIMIT, SCORE_LIMIT),
        components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scoring::bundle::Bundle;

    #[test]
    fn test_htf_rules_cover_only_htf() {
        for tf in Timeframe::HTF {
            assert!(htf_weight_rule(tf).is_some());
        }
        assert!(htf_weight_rule(Timeframe::ThirtyMin).is_none());
    }

    #[test]
    fn test_rth_shifts_ltf_weight_to_30m() {
        let quiet = ltf_base_weight(Timeframe::ThirtyMin, false).unwrap();
        let rth = ltf_base_weight(Timeframe::ThirtyMin, true).unwrap();
        assert!(rth > quiet);
        assert!(
            ltf_base_weight(Timeframe::FiveMin, true).unwrap()
                < ltf_base_weight(Timeframe::FiveMin, false).unwrap()
        );
    }

    #[test]
    fn test_normalize_sums_to_one() {
        let blend = normalize(vec![
            (Timeframe::OneWeek, 20.0, 0.6),
            (Timeframe::OneHour, -10.0, 0.2),
        ])
        .unwrap();
        assert!((blend.weight_sum() - 1.0).abs() < 1e-12);
        // 20 * 0.75 - 10 * 0.25
        assert!((blend.score - 12.5).abs() < 1e-12);
    }

    fn ltf_bundles(tfs: &[Timeframe]) -> BundleMap {
        tfs.iter()
            .map(|tf| {
                let mut b = Bundle::fixture(*tf);
                match tf {
                    Timeframe::ThirtyMin => b.rsi = 75.0,
                    Timeframe::TenMin => b.golden_gate.distance = 0.9,
                    _ => b.rsi = 25.0,
                }
                (*tf, b)
            })
            .collect()
    }

    fn weight_of(blend: &Blend, tf: Timeframe) -> f64 {
        blend
            .components
            .iter()
            .find(|c| c.timeframe == tf)
            .map_or(0.0, |c| c.weight)
    }

    #[test]
    fn test_ltf_blend_session_weights() {
        let bundles = ltf_bundles(&Timeframe::LTF);
        let learned = LearnedWeights::default();

        let rth = blend_ltf(&bundles, None, true, &learned).unwrap();
        // 0.6325 + 0.30 + 0.105
        assert!((weight_of(&rth, Timeframe::ThirtyMin) - 0.6325 / 1.0375).abs() < 1e-9);
        assert!((weight_of(&rth, Timeframe::TenMin) - 0.30 / 1.0375).abs() < 1e-9);
        assert!((weight_of(&rth, Timeframe::FiveMin) - 0.105 / 1.0375).abs() < 1e-9);

        let quiet = blend_ltf(&bundles, None, false, &learned).unwrap();
        assert!((weight_of(&quiet, Timeframe::ThirtyMin) - 0.55).abs() < 1e-9);
        assert!((weight_of(&quiet, Timeframe::FiveMin) - 0.15).abs() < 1e-9);

        let expected: f64 = quiet
            .components
            .iter()
            .map(|c| ltf_score(&bundles[&c.timeframe], None) * c.weight)
            .sum();
        assert!((quiet.score - expected).abs() < 1e-9);
        assert!(
            quiet
                .components
                .iter()
                .all(|c| c.score == ltf_score(&bundles[&c.timeframe], None))
        );
    }

    #[test]
    fn test_ltf_blend_renormalizes_missing_timeframe() {
        let bundles = ltf_bundles(&[Timeframe::ThirtyMin, Timeframe::TenMin]);
        let blend = blend_ltf(&bundles, None, false, &LearnedWeights::default()).unwrap();
        assert_eq!(blend.components.len(), 2);
        assert!((weight_of(&blend, Timeframe::ThirtyMin) - 0.55 / 0.85).abs() < 1e-9);
        assert!((weight_of(&blend, Timeframe::TenMin) - 0.30 / 0.85).abs() < 1e-9);
        assert!((blend.weight_sum() - 1.0).abs() < 1e-12);

        let mut learned = LearnedWeights::default();
        learned.ltf.insert("10".to_string(), 2.0);
        let boosted = blend_ltf(&bundles, None, false, &learned).unwrap();
        assert!((weight_of(&boosted, Timeframe::TenMin) - 0.60 / 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_empty_is_none() {
        assert!(normalize(vec![]).is_none());
        let empty = BundleMap::new();
        assert!(blend_htf(&empty, &LearnedWeights::default()).is_none());
    }
}
