use crate::application::bundle::MIN_BUNDLE_BARS;
use crate::application::exhaustion::MIN_EXHAUSTION_BARS;
use crate::application::swing::consensus::ConsensusThresholds;
use crate::application::swing::regime::{DAILY_PIVOT_LOOKBACK, WEEKLY_PIVOT_LOOKBACK};
use anyhow::{Context, Result};
use std::env;

/// Tunables of one scoring cycle
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Bars a timeframe needs for a bundle; never below 50
    pub min_bundle_bars: usize,
    /// Bars a D/W/M series needs to join the exhaustion merge
    pub exhaustion_min_bars: usize,
    pub daily_pivot_lookback: usize,
    pub weekly_pivot_lookback: usize,
    pub consensus: ConsensusThresholds,
    /// Overrides the session derived from the as-of timestamp
    pub force_rth: Option<bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bundle_bars: MIN_BUNDLE_BARS,
            exhaustion_min_bars: MIN_EXHAUSTION_BARS,
            daily_pivot_lookback: DAILY_PIVOT_LOOKBACK,
            weekly_pivot_lookback: WEEKLY_PIVOT_LOOKBACK,
            consensus: ConsensusThresholds::default(),
            force_rth: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let force_rth = match env::var("MTF_FORCE_RTH") {
            Ok(raw) if !raw.trim().is_empty() => {
                Some(parse_bool(&raw).context("Failed to parse MTF_FORCE_RTH")?)
            }
            _ => None,
        };

        Ok(Self {
            min_bundle_bars: Self::parse_usize("MTF_MIN_BUNDLE_BARS", defaults.min_bundle_bars)?
                .max(MIN_BUNDLE_BARS),
            exhaustion_min_bars: Self::parse_usize(
                "MTF_EXHAUSTION_MIN_BARS",
                defaults.exhaustion_min_bars,
            )?,
            daily_pivot_lookback: Self::parse_usize(
                "MTF_DAILY_PIVOT_LOOKBACK",
                defaults.daily_pivot_lookback,
            )?,
            weekly_pivot_lookback: Self::parse_usize(
                "MTF_WEEKLY_PIVOT_LOOKBACK",
                defaults.weekly_pivot_lookback,
            )?,
            consensus: ConsensusThresholds {
                strong: Self::parse_f64("MTF_CONSENSUS_STRONG", defaults.consensus.strong)?,
                weak: Self::parse_f64("MTF_CONSENSUS_WEAK", defaults.consensus.weak)?,
                label: Self::parse_f64("MTF_CONSENSUS_LABEL", defaults.consensus.label)?,
            },
            force_rth,
        })
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean: '{}'", other),
    }
}
