pub mod primitives;
pub mod squeeze;
pub mod supertrend;
