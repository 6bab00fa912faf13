//! Configuration for the scoring engine.
//!
//! Engine tunables come from environment variables; learned weight
//! overrides come from a TOML or JSON file.

mod engine_config;
mod weights_config;

pub use engine_config::EngineConfig;
pub use weights_config::{load_learned_weights, parse_learned_weights};
