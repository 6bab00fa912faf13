// Bars, sessions and timeframes
pub mod bar;
pub mod market_regime;
pub mod session;
pub mod timeframe;
