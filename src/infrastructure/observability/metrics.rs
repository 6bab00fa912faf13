//! Prometheus metrics definitions for the scoring engine
//!
//! All metrics use the `mtf_` prefix and are read-only.

use crate::domain::market::timeframe::Timeframe;
use prometheus::{CounterVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics for scoring cycles
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Arc<Registry>,
    /// Payloads by outcome (`ok`, `no_timeframes`)
    pub payloads_total: CounterVec,
    /// Timeframes left out of a payload, by timeframe and reason
    pub timeframes_degraded_total: CounterVec,
    /// Wall time of one instrument's computation in seconds
    pub compute_seconds: Histogram,
}

impl EngineMetrics {
    /// Create a new EngineMetrics instance with all counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let payloads_total = CounterVec::new(
            Opts::new("mtf_payloads_total", "Payloads computed by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(payloads_total.clone()))?;

        let timeframes_degraded_total = CounterVec::new(
            Opts::new(
                "mtf_timeframes_degraded_total",
                "Timeframes left out of a payload",
            ),
            &["timeframe", "reason"],
        )?;
        registry.register(Box::new(timeframes_degraded_total.clone()))?;

        let compute_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "mtf_compute_seconds",
                "Per-instrument computation time in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )?;
        registry.register(Box::new(compute_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            payloads_total,
            timeframes_degraded_total,
            compute_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_payloads(&self, outcome: &str) {
        self.payloads_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_degraded(&self, timeframe: Timeframe, reason: &str) {
        self.timeframes_degraded_total
            .with_label_values(&[timeframe.key(), reason])
            .inc();
    }

    pub fn observe_compute(&self, seconds: f64) {
        self.compute_seconds.observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = EngineMetrics::new().expect("Failed to create metrics");
        metrics.observe_compute(0.002);
        assert!(metrics.render().contains("mtf_compute_seconds"));
    }

    #[test]
    fn test_payload_counter() {
        let metrics = EngineMetrics::new().expect("Failed to create metrics");
        metrics.inc_payloads("ok");
        metrics.inc_payloads("ok");
        let output = metrics.render();
        assert!(output.contains("mtf_payloads_total{outcome=\"ok\"} 2"));
    }

    #[test]
    fn test_degraded_counter_labels() {
        let metrics = EngineMetrics::new().expect("Failed to create metrics");
        metrics.inc_degraded(Timeframe::OneDay, "data_quality");
        let output = metrics.render();
        assert!(output.contains("mtf_timeframes_degraded_total"));
        assert!(output.contains("reason=\"data_quality\""));
        assert!(output.contains("timeframe=\"D\""));
    }
}
