//! Pull-free observability for the scoring engine
//!
//! Metrics live in an in-process Prometheus registry and are rendered as
//! text on demand; nothing listens for requests.

pub mod metrics;

pub use metrics::EngineMetrics;
