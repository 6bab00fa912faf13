use crate::domain::market::bar::Bar;
use crate::domain::market::timeframe::Timeframe;
use anyhow::Result;

/// Supplier of raw bar series, one per (symbol, timeframe).
///
/// `Ok(None)` means the series does not exist; the engine then treats that
/// timeframe as absent rather than failing the instrument.
pub trait BarSource: Send + Sync {
    fn load_bars(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<Vec<Bar>>>;

    /// Symbols this source can serve, sorted
    fn symbols(&self) -> Result<Vec<String>>;
}
