//! Builds the full payload of one instrument from its raw bar series.
//!
//! Bundles are built fork-join: Daily first because it supplies the
//! Golden-Gate anchors, then the remaining timeframes in parallel. Any
//! timeframe that fails preparation or is too short is left out and noted
//! in `degraded`.

use crate::application::bundle::compute_bundle;
use crate::application::entry_quality::score_entry;
use crate::application::exhaustion::merge_exhaustion;
use crate::application::flags::detect_flags;
use crate::application::indicators::primitives::round_to;
use crate::application::levels::atr_levels::{active_gates, build_atr_level_maps};
use crate::application::levels::fuel::build_fuel_map;
use crate::application::levels::risk_plan::{build_risk_plan, volatility_tier};
use crate::application::levels::support_map::build_support_map;
use crate::application::scoring::blender::{blend_htf, blend_ltf};
use crate::application::snapshot::{build_ema_map, build_tf_tech};
use crate::application::swing::consensus::swing_consensus;
use crate::application::swing::regime::SwingRegimeDetector;
use crate::config::EngineConfig;
use crate::domain::errors::EngineError;
use crate::domain::market::bar::{Bar, prepare_bars};
use crate::domain::market::session::classify_session;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::{Bundle, BundleMap, DailyAnchors, PhaseZone};
use crate::domain::scoring::payload::{DegradedTimeframe, PhaseDirection, ScorePayload};
use crate::domain::scoring::signals::Side;
use crate::domain::scoring::state::MarketState;
use crate::domain::scoring::weights::LearnedWeights;
use rayon::prelude::*;
use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Everything the engine needs for one instrument in one cycle
#[derive(Debug, Clone, Default)]
pub struct InstrumentInput {
    pub symbol: String,
    pub series: BTreeMap<Timeframe, Vec<Bar>>,
    /// Derived from the Daily series when not supplied
    pub anchors: Option<DailyAnchors>,
    pub weights: LearnedWeights,
}

impl InstrumentInput {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn with_series(mut self, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.series.insert(timeframe, bars);
        self
    }

    pub fn with_weights(mut self, weights: LearnedWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_anchors(mut self, anchors: DailyAnchors) -> Self {
        self.anchors = Some(anchors);
        self
    }
}

/// Bundles of one instrument plus the prepared series they came from
#[derive(Debug, Clone, Default)]
pub struct BundleSet {
    pub bundles: BundleMap,
    pub prepared: BTreeMap<Timeframe, Vec<Bar>>,
    pub anchors: Option<DailyAnchors>,
    pub degraded: Vec<DegradedTimeframe>,
}

impl BundleSet {
    fn degrade(&mut self, symbol: &str, err: &EngineError) {
        let timeframe = match err {
            EngineError::InsufficientData { timeframe, .. }
            | EngineError::DataQuality { timeframe, .. } => *timeframe,
            EngineError::NoUsableTimeframes { .. } => return,
        };

        match err {
            EngineError::DataQuality { .. } => {
                warn!(symbol, timeframe = %timeframe, reason = err.reason_label(), "{}", err)
            }
            _ => debug!(symbol, timeframe = %timeframe, reason = err.reason_label(), "{}", err),
        }

        self.degraded.push(DegradedTimeframe {
            timeframe,
            reason: err.reason_label().to_string(),
            detail: err.to_string(),
        });
    }
}

/// Prepares every supplied series and builds a bundle for each scored
/// timeframe that has enough history.
pub fn build_bundles(input: &InstrumentInput, config: &EngineConfig) -> BundleSet {
    let mut set = BundleSet::default();

    for (tf, bars) in &input.series {
        match prepare_bars(*tf, bars) {
            Ok(prepared) => {
                set.prepared.insert(*tf, prepared);
            }
            Err(err) => set.degrade(&input.symbol, &err),
        }
    }

    // Daily first: it supplies the anchors for everything else
    let daily = set.prepared.get(&Timeframe::OneDay).map(|bars| {
        compute_bundle(
            Timeframe::OneDay,
            bars,
            input.anchors.as_ref(),
            config.min_bundle_bars,
        )
    });
    set.anchors = input.anchors.or_else(|| {
        daily
            .as_ref()
            .and_then(|d| d.as_ref().ok())
            .and_then(|d| DailyAnchors::new(d.prev_close, d.atr))
    });
    match daily {
        Some(Ok(bundle)) => {
            set.bundles.insert(Timeframe::OneDay, bundle);
        }
        Some(Err(err)) => set.degrade(&input.symbol, &err),
        None => {}
    }

    let anchors = set.anchors;
    let rest: Vec<(Timeframe, Result<Bundle, EngineError>)> = Timeframe::SCORED
        .par_iter()
        .filter(|tf| **tf != Timeframe::OneDay)
        .filter_map(|tf| {
            let bars = set.prepared.get(tf)?;
            Some((
                *tf,
                compute_bundle(*tf, bars, anchors.as_ref(), config.min_bundle_bars),
            ))
        })
        .collect();

    for (tf, result) in rest {
        match result {
            Ok(bundle) => {
                set.bundles.insert(tf, bundle);
            }
            Err(err) => set.degrade(&input.symbol, &err),
        }
    }

    set
}

/// Price the payload quotes: 30m, then 10m, then Daily, then the first
/// scored timeframe present.
fn reference_price(bundles: &BundleMap) -> f64 {
    [Timeframe::ThirtyMin, Timeframe::TenMin, Timeframe::OneDay]
        .iter()
        .chain(Timeframe::SCORED.iter())
        .find_map(|tf| bundles.get(tf))
        .map(|b| b.price)
        .unwrap_or(0.0)
}

fn positive_cents(value: Option<f64>) -> Option<f64> {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| round_to(v, 2))
}

/// Computes the full payload for one instrument.
///
/// Fails only when no scored timeframe produced a bundle.
pub fn assemble(input: &InstrumentInput, config: &EngineConfig) -> Result<ScorePayload, EngineError> {
    let set = build_bundles(input, config);
    assemble_from(input, &set, config)
}

pub fn assemble_from(
    input: &InstrumentInput,
    set: &BundleSet,
    config: &EngineConfig,
) -> Result<ScorePayload, EngineError> {
    let bundles = &set.bundles;
    if bundles.is_empty() {
        return Err(EngineError::NoUsableTimeframes {
            symbol: input.symbol.clone(),
        });
    }

    let ts = bundles.values().map(|b| b.timestamp).max().unwrap_or(0);
    let as_of = bundles
        .values()
        .filter(|b| b.timeframe.is_intraday())
        .map(|b| b.timestamp)
        .max()
        .unwrap_or(ts);
    let session = classify_session(as_of);
    let is_rth = config.force_rth.unwrap_or(session.is_regular());

    let htf_score = blend_htf(bundles, &input.weights).map_or(0.0, |b| b.score);
    let ltf_score = blend_ltf(bundles, set.anchors.as_ref(), is_rth, &input.weights)
        .map_or(0.0, |b| b.score);
    let state = MarketState::classify(htf_score, ltf_score);
    let price = reference_price(bundles);

    let regime = SwingRegimeDetector::new(config.daily_pivot_lookback, config.weekly_pivot_lookback)
        .detect(
            set.prepared.get(&Timeframe::OneDay).map(Vec::as_slice),
            set.prepared.get(&Timeframe::OneWeek).map(Vec::as_slice),
        );
    let consensus = swing_consensus(bundles, &regime, &input.weights, &config.consensus);

    let (tier, atr_pct) = volatility_tier(bundles, price);
    let side = consensus
        .direction
        .unwrap_or_else(|| Side::from_score(htf_score));
    let entry_quality = score_entry(side, bundles, &regime, tier);

    let exhaustion_series: BTreeMap<Timeframe, Vec<Bar>> = Timeframe::EXHAUSTION
        .iter()
        .filter_map(|tf| set.prepared.get(tf).map(|bars| (*tf, bars.clone())))
        .collect();
    let td_sequential = merge_exhaustion(
        &exhaustion_series,
        htf_score >= 0.0,
        config.exhaustion_min_bars,
    );

    let plan = build_risk_plan(htf_score, price, bundles, tier);
    let atr_levels = build_atr_level_maps(bundles, price);
    let fuel = build_fuel_map(bundles);

    let daily = bundles.get(&Timeframe::OneDay);
    let daily_phase = daily.map_or(0.0, |b| b.phase);

    let payload = ScorePayload {
        ticker: input.symbol.to_uppercase(),
        ts,
        session,
        htf_score: round_to(htf_score, 1),
        ltf_score: round_to(ltf_score, 1),
        state,
        price,
        sl: plan.sl,
        tp: plan.tp_trim,
        tp_trim: plan.tp_trim,
        tp_exit: plan.tp_exit,
        tp_runner: plan.tp_runner,
        rr: plan.rr,
        completion: plan.completion,
        phase_pct: round_to((daily_phase.abs() / 100.0).min(1.0), 3),
        phase_dir: PhaseDirection::from_value(daily_phase),
        phase_zone: daily.map_or(PhaseZone::Low, |b| b.phase_zone),
        flags: detect_flags(bundles),
        tf_tech: build_tf_tech(bundles, &fuel),
        atr_d: positive_cents(daily.map(|b| b.atr)),
        atr_w: positive_cents(bundles.get(&Timeframe::OneWeek).map(|b| b.atr)),
        st_support: build_support_map(bundles),
        active_gates: active_gates(&atr_levels),
        atr_levels,
        fuel,
        ema_map: build_ema_map(bundles),
        td_sequential,
        regime,
        swing_consensus: consensus,
        entry_quality,
        volatility_tier: tier,
        volatility_atr_pct: atr_pct
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or(0.0),
        timeframes: Timeframe::SCORED
            .iter()
            .filter(|tf| bundles.contains_key(tf))
            .copied()
            .collect(),
        degraded: set.degraded.clone(),
    };

    info!(
        symbol = %payload.ticker,
        htf = payload.htf_score,
        ltf = payload.ltf_score,
        state = %payload.state,
        timeframes = payload.timeframes.len(),
        degraded = payload.degraded.len(),
        "Payload assembled"
    );

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_usable_timeframes() {
        let input = InstrumentInput::new("aapl");
        let err = assemble(&input, &EngineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EngineError::NoUsableTimeframes {
                symbol: "aapl".to_string()
            }
        );
    }

    #[test]
    fn test_short_series_is_degraded_not_fatal_to_build() {
        let bars: Vec<Bar> = (0..10)
            .map(|i| Bar::new(i * 60_000, 1.0, 1.0, 1.0, 1.0, 1.0))
            .collect();
        let input = InstrumentInput::new("x").with_series(Timeframe::FiveMin, bars);
        let set = build_bundles(&input, &EngineConfig::default());
        assert!(set.bundles.is_empty());
        assert_eq!(set.degraded.len(), 1);
        assert_eq!(set.degraded[0].reason, "insufficient_data");
    }

    #[test]
    fn test_reference_price_without_bundles() {
        assert_eq!(reference_price(&BundleMap::new()), 0.0);
    }
}
