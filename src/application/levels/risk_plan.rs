//! Volatility tier, stop and target ladder.
//!
//! Price arithmetic runs in `Decimal` so stops and targets round to exact
//! cents; ATR fallbacks are scaled in `f64` first.

use crate::application::indicators::primitives::{clamp, round_to};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::scoring::bundle::BundleMap;
use crate::domain::scoring::levels::{RiskPlan, VolatilityTier};
use crate::domain::scoring::signals::Side;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

const TRIM_MULT: Decimal = dec!(0.618);
const EXIT_MULT: Decimal = dec!(1.0);
const RUNNER_MULT: Decimal = dec!(1.618);
const STOP_MULT: Decimal = dec!(1.5);

fn atr_of(bundles: &BundleMap, tf: Timeframe) -> Option<f64> {
    bundles
        .get(&tf)
        .map(|b| b.atr)
        .filter(|atr| atr.is_finite() && *atr > 0.0)
}

/// Weekly ATR, or the best intraday/daily proxy for it
pub fn target_atr(bundles: &BundleMap) -> Option<f64> {
    atr_of(bundles, Timeframe::OneWeek)
        .or_else(|| atr_of(bundles, Timeframe::OneDay).map(|a| a * 5f64.sqrt()))
        .or_else(|| atr_of(bundles, Timeframe::OneHour).map(|a| a * 32.5f64.sqrt()))
        .or_else(|| atr_of(bundles, Timeframe::ThirtyMin).map(|a| a * 65f64.sqrt()))
}

/// Daily ATR, or the best weekly/intraday proxy for it
pub fn stop_atr(bundles: &BundleMap) -> Option<f64> {
    atr_of(bundles, Timeframe::OneDay)
        .or_else(|| atr_of(bundles, Timeframe::OneWeek).map(|a| a / 5f64.sqrt()))
        .or_else(|| atr_of(bundles, Timeframe::OneHour).map(|a| a * 6.5f64.sqrt()))
        .or_else(|| atr_of(bundles, Timeframe::ThirtyMin).map(|a| a * 13f64.sqrt()))
}

/// Daily ATR as a percentage of price and its tier. Without any ATR or a
/// positive price the reading is 0%, which is the LOW tier.
pub fn volatility_tier(bundles: &BundleMap, price: f64) -> (VolatilityTier, Decimal) {
    let pct = match (stop_atr(bundles), Decimal::from_f64(price)) {
        (Some(atr), Some(px)) if px > Decimal::ZERO => Decimal::from_f64(atr)
            .map(|atr| atr / px * dec!(100))
            .unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    };
    (VolatilityTier::from_atr_pct(pct), pct)
}

fn to_cents(value: Decimal) -> Option<f64> {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

/// Builds the stop/target ladder in the HTF direction.
///
/// Targets sit at 0.618, 1.0 and 1.618 target ATRs from price. The stop sits
/// 1.5 stop ATRs away, clamped into the tier's percentage band.
pub fn build_risk_plan(
    htf_score: f64,
    price: f64,
    bundles: &BundleMap,
    tier: VolatilityTier,
) -> RiskPlan {
    let direction = Side::from_score(htf_score);
    let mut plan = RiskPlan::empty(direction);

    let Some(px) = Decimal::from_f64(price).filter(|p| *p > Decimal::ZERO) else {
        return plan;
    };
    let dir = match direction {
        Side::Long => Decimal::ONE,
        Side::Short => Decimal::NEGATIVE_ONE,
    };

    if let Some(atr) = target_atr(bundles).and_then(Decimal::from_f64) {
        plan.tp_trim = to_cents(px + dir * TRIM_MULT * atr);
        plan.tp_exit = to_cents(px + dir * EXIT_MULT * atr);
        plan.tp_runner = to_cents(px + dir * RUNNER_MULT * atr);
    }

    if let Some(atr) = stop_atr(bundles).and_then(Decimal::from_f64) {
        let (min_pct, max_pct) = tier.stop_clamp_pct();
        let min_dist = px * min_pct / dec!(100);
        let max_dist = px * max_pct / dec!(100);
        let distance = (STOP_MULT * atr).max(min_dist).min(max_dist);
        plan.sl = to_cents(px - dir * distance);
    }

    let Some(sl) = plan.sl else {
        return plan;
    };

    let risk = (price - sl).abs();
    if let Some(trim) = plan.tp_trim {
        if risk > 0.0 {
            plan.rr = round_to((trim - price).abs() / risk, 2);
        }
    }

    if let Some(runner) = plan.tp_runner.or(plan.tp_exit).or(plan.tp_trim) {
        let range = (runner - sl).abs();
        if range > 0.0 {
            let progress = direction.sign() * (price - sl);
            plan.completion = round_to(clamp(progress / range, 0.0, 1.0), 3);
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plan_without_price() {
        let plan = build_risk_plan(10.0, 0.0, &BundleMap::new(), VolatilityTier::Low);
        assert_eq!(plan, RiskPlan::empty(Side::Long));
    }

    #[test]
    fn test_no_atr_is_low_tier() {
        let (tier, pct) = volatility_tier(&BundleMap::new(), 100.0);
        assert_eq!(tier, VolatilityTier::Low);
        assert_eq!(pct, Decimal::ZERO);
    }

    #[test]
    fn test_to_cents_rounds_half_away() {
        assert_eq!(to_cents(dec!(101.005)), Some(101.01));
        assert_eq!(to_cents(dec!(-3.145)), Some(-3.15));
    }
}
