// Per-timeframe indicator bundles and the primitives behind them
pub mod bundle;
pub mod indicators;

// HTF/LTF scoring and blending
pub mod scoring;

// Swing regime and multi-timeframe consensus
pub mod entry_quality;
pub mod swing;

// Exhaustion counters
pub mod exhaustion;

// Auxiliary maps, event flags and per-timeframe snapshots
pub mod flags;
pub mod levels;
pub mod snapshot;

// Payload assembly and universe scoring
pub mod assembler;
pub mod engine;

// Pattern conditions evaluated against payloads
pub mod conditions;
