pub mod blender;
pub mod timeframe_scores;
