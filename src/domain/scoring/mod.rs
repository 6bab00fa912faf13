// Scoring domain: bundle snapshots, states and payload shapes
pub mod bundle;
pub mod levels;
pub mod payload;
pub mod signals;
pub mod state;
pub mod weights;
