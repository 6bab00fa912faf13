// Auxiliary level maps
pub mod atr_levels;
pub mod fuel;
pub mod risk_plan;
pub mod support_map;
