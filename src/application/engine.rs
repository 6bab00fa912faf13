use crate::application::assembler::{InstrumentInput, assemble_from, build_bundles};
use crate::config::EngineConfig;
use crate::domain::errors::EngineError;
use crate::domain::scoring::payload::ScorePayload;
use crate::infrastructure::observability::EngineMetrics;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

/// Result of one instrument in a universe run
#[derive(Debug)]
pub struct InstrumentResult {
    pub symbol: String,
    pub payload: Result<ScorePayload, EngineError>,
}

/// Scores instruments independently; nothing is shared between them.
pub struct ScoringEngine {
    config: EngineConfig,
    metrics: Option<EngineMetrics>,
}

impl ScoringEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&EngineMetrics> {
        self.metrics.as_ref()
    }

    /// Scores one instrument
    pub fn score(&self, input: &InstrumentInput) -> Result<ScorePayload, EngineError> {
        let started = Instant::now();
        let set = build_bundles(input, &self.config);
        let payload = assemble_from(input, &set, &self.config);

        if let Some(metrics) = &self.metrics {
            metrics.observe_compute(started.elapsed().as_secs_f64());
            for degraded in &set.degraded {
                metrics.inc_degraded(degraded.timeframe, &degraded.reason);
            }
            match &payload {
                Ok(_) => metrics.inc_payloads("ok"),
                Err(err) => metrics.inc_payloads(err.reason_label()),
            }
        }

        if let Err(err) = &payload {
            warn!(symbol = %input.symbol, "{}", err);
        }
        payload
    }

    /// Scores every instrument on the rayon pool, returning results in input order
    pub fn score_universe(&self, inputs: &[InstrumentInput]) -> Vec<InstrumentResult> {
        let started = Instant::now();
        let results: Vec<InstrumentResult> = inputs
            .par_iter()
            .map(|input| InstrumentResult {
                symbol: input.symbol.clone(),
                payload: self.score(input),
            })
            .collect();

        info!(
            instruments = inputs.len(),
            scored = results.iter().filter(|r| r.payload.is_ok()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Universe scored"
        );
        results
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
