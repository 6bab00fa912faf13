// Market data domain
pub mod market;

// Scoring domain
pub mod scoring;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
