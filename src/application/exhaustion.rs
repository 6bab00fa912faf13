//! DeMark-style exhaustion sequence over Daily, Weekly and Monthly bars.
//!
//! Every call folds the whole series from the first comparable bar; no
//! counter survives between calls.

use crate::domain::market::bar::Bar;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::signals::ExhaustionState;
use std::collections::BTreeMap;
use tracing::debug;

pub const PREP_LEN: u8 = 9;
pub const PREP_COMPARE: usize = 4;
pub const LEADUP_LEN: u8 = 13;
pub const LEADUP_COMPARE: usize = 2;

/// Bars a timeframe needs to join the multi-timeframe merge
pub const MIN_EXHAUSTION_BARS: usize = 14;

const BOOST_LIMIT: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    bull_prep: u8,
    bear_prep: u8,
    bull_leadup: u8,
    bear_leadup: u8,
}

/// Counter past its signal length restarts at 1
fn advance(count: u8, len: u8) -> u8 {
    if count >= len { 1 } else { count + 1 }
}

/// Leadup step: starts on the bar a prep completes, continues while the
/// close keeps beyond the comparison extreme, and resets when it does not.
fn step_leadup(count: u8, prep_complete: bool, beyond: bool) -> u8 {
    if beyond && (prep_complete || count > 0) {
        advance(count, LEADUP_LEN)
    } else {
        0
    }
}

/// Runs the sequence on one timeframe.
///
/// `htf_bull` chooses which side's signals count as a boost. A series
/// shorter than 13 bars yields the neutral state.
pub fn compute_sequence(bars: &[Bar], timeframe: Timeframe, htf_bull: bool) -> ExhaustionState {
    let mut state = ExhaustionState::neutral(timeframe);
    if bars.len() < PREP_COMPARE + PREP_LEN as usize {
        return state;
    }

    let counters = (PREP_COMPARE..bars.len()).fold(Counters::default(), |mut c, i| {
        let close = bars[i].close;
        let compare = bars[i - PREP_COMPARE].close;

        c.bull_prep = if close < compare { advance(c.bull_prep, PREP_LEN) } else { 0 };
        c.bear_prep = if close > compare { advance(c.bear_prep, PREP_LEN) } else { 0 };

        let bull_complete = c.bull_prep == PREP_LEN;
        let bear_complete = c.bear_prep == PREP_LEN;
        if bear_complete {
            c.bull_leadup = 0;
        }
        if bull_complete {
            c.bear_leadup = 0;
        }

        let extreme = &bars[i - LEADUP_COMPARE];
        c.bull_leadup = step_leadup(c.bull_leadup, bull_complete, close < extreme.low);
        c.bear_leadup = step_leadup(c.bear_leadup, bear_complete, close > extreme.high);
        c
    });

    state.bullish_prep_count = counters.bull_prep;
    state.bearish_prep_count = counters.bear_prep;
    state.bullish_leadup_count = counters.bull_leadup;
    state.bearish_leadup_count = counters.bear_leadup;
    state.td9_bullish = counters.bull_prep == PREP_LEN;
    state.td9_bearish = counters.bear_prep == PREP_LEN;
    state.td13_bullish = counters.bull_leadup == LEADUP_LEN;
    state.td13_bearish = counters.bear_leadup == LEADUP_LEN;
    state.refresh_exits();
    state.boost = boost(&state, htf_bull);

    state
}

/// Signal points for the biased side, negative for the opposite side, plus
/// extra points when the biased side's counters are close to completing.
fn boost(state: &ExhaustionState, htf_bull: bool) -> f64 {
    let (td9_with, td13_with, td9_against, td13_against, prep, leadup) = if htf_bull {
        (
            state.td9_bullish,
            state.td13_bullish,
            state.td9_bearish,
            state.td13_bearish,
            state.bullish_prep_count,
            state.bullish_leadup_count,
        )
    } else {
        (
            state.td9_bearish,
            state.td13_bearish,
            state.td9_bullish,
            state.td13_bullish,
            state.bearish_prep_count,
            state.bearish_leadup_count,
        )
    };

    let mut boost = if td9_with {
        5.0
    } else if td13_with {
        8.0
    } else if td9_against {
        -5.0
    } else if td13_against {
        -8.0
    } else {
        0.0
    };
    if (6..PREP_LEN).contains(&prep) {
        boost += 2.0;
    }
    if (6..LEADUP_LEN).contains(&leadup) {
        boost += 3.0;
    }
    boost
}

/// Merges the Daily, Weekly and Monthly sequences.
///
/// Daily is the base. Weekly signals override it and Monthly signals
/// override both, moving `tf` to the overriding timeframe. Boosts sum as
/// D + 1.5 W + 2 M, clamped to +/-15. Displayed counts come from the
/// highest timeframe that has a running prep count.
pub fn merge_exhaustion(
    series: &BTreeMap<Timeframe, Vec<Bar>>,
    htf_bull: bool,
    min_bars: usize,
) -> ExhaustionState {
    let per_tf: BTreeMap<Timeframe, ExhaustionState> = Timeframe::EXHAUSTION
        .iter()
        .filter_map(|tf| {
            let bars = series.get(tf)?;
            if bars.len() < min_bars {
                debug!(timeframe = %tf, bars = bars.len(), "Exhaustion series too short");
                return None;
            }
            Some((*tf, compute_sequence(bars, *tf, htf_bull)))
        })
        .collect();

    let daily = per_tf.get(&Timeframe::OneDay);
    let weekly = per_tf.get(&Timeframe::OneWeek);
    let monthly = per_tf.get(&Timeframe::OneMonth);

    let mut merged = daily
        .cloned()
        .unwrap_or_else(|| ExhaustionState::neutral(Timeframe::OneDay));

    for higher in [weekly, monthly].into_iter().flatten() {
        let mut overridden = false;
        if higher.td9_bullish {
            merged.td9_bullish = true;
            overridden = true;
        }
        if higher.td9_bearish {
            merged.td9_bearish = true;
            overridden = true;
        }
        if higher.td13_bullish {
            merged.td13_bullish = true;
            overridden = true;
        }
        if higher.td13_bearish {
            merged.td13_bearish = true;
            overridden = true;
        }
        if overridden {
            merged.tf = higher.tf;
        }
    }
    merged.refresh_exits();

    let total = daily.map_or(0.0, |s| s.boost)
        + weekly.map_or(0.0, |s| s.boost) * 1.5
        + monthly.map_or(0.0, |s| s.boost) * 2.0;
    merged.boost = ((total * 10.0).round() / 10.0).clamp(-BOOST_LIMIT, BOOST_LIMIT);

    if let Some(source) = [monthly, weekly]
        .into_iter()
        .flatten()
        .find(|s| s.has_prep_count())
    {
        merged.bullish_prep_count = source.bullish_prep_count;
        merged.bearish_prep_count = source.bearish_prep_count;
        merged.bullish_leadup_count = source.bullish_leadup_count;
        merged.bearish_leadup_count = source.bearish_leadup_count;
    }

    merged.per_tf = per_tf;
    merged
}
