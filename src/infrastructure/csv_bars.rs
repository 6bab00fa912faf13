//! Bar series stored as CSV files, one file per symbol and timeframe.
//!
//! Files are named `<SYMBOL>_<TF>.csv` where `<TF>` is the payload key
//! (`5`, `10`, `30`, `60`, `240`, `D`, `W`, `M`) and carry the header
//! `timestamp,open,high,low,close,volume` with Unix-millisecond timestamps.

use crate::domain::market::bar::{Bar, deduplicate_by_period};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::BarSource;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

impl From<BarRecord> for Bar {
    fn from(record: BarRecord) -> Self {
        Bar::new(
            record.timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume.unwrap_or(0.0),
        )
    }
}

/// Directory of CSV bar files
#[derive(Debug, Clone)]
pub struct CsvBarStore {
    root: PathBuf,
}

impl CsvBarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.root
            .join(format!("{}_{}.csv", symbol.to_uppercase(), timeframe.key()))
    }

    fn read_file(path: &Path) -> Result<Vec<Bar>> {
        let file = File::open(path).context(format!("Failed to open {}", path.display()))?;
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<BarRecord>().enumerate() {
            let record =
                result.context(format!("Invalid bar at row {} of {}", line + 1, path.display()))?;
            bars.push(Bar::from(record));
        }
        Ok(bars)
    }
}

/// Splits `AAPL_D.csv` into its symbol and timeframe
fn parse_file_name(name: &str) -> Option<(String, Timeframe)> {
    let stem = name.strip_suffix(".csv")?;
    let (symbol, tf) = stem.rsplit_once('_')?;
    if symbol.is_empty() {
        return None;
    }
    let timeframe = Timeframe::from_str(tf).ok()?;
    Some((symbol.to_uppercase(), timeframe))
}

impl BarSource for CsvBarStore {
    fn load_bars(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<Vec<Bar>>> {
        let path = self.path_for(symbol, timeframe);
        if !path.exists() {
            return Ok(None);
        }

        let raw = Self::read_file(&path)?;
        let bars = deduplicate_by_period(&raw, timeframe);
        debug!(
            symbol,
            timeframe = %timeframe,
            rows = raw.len(),
            bars = bars.len(),
            "Loaded bar file"
        );
        Ok(Some(bars))
    }

    fn symbols(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root)
            .context(format!("Failed to read data dir: {}", self.root.display()))?;

        let mut symbols = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            if let Some((symbol, _)) = entry.file_name().to_str().and_then(parse_file_name) {
                symbols.insert(symbol);
            }
        }
        Ok(symbols.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mtf_csv_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("AAPL_D.csv"),
            Some(("AAPL".to_string(), Timeframe::OneDay))
        );
        assert_eq!(
            parse_file_name("brk_b_240.csv"),
            Some(("BRK_B".to_string(), Timeframe::FourHour))
        );
        assert_eq!(parse_file_name("notes.txt"), None);
        assert_eq!(parse_file_name("AAPL_X.csv"), None);
    }

    #[test]
    fn test_load_bars_deduplicates_daily() {
        let dir = temp_dir("dedup");
        let mut file = File::create(dir.join("SPY_D.csv")).unwrap();
        writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
        // Same UTC date twice; the later row wins
        writeln!(file, "1704067200000,10,11,9,10.5,100").unwrap();
        writeln!(file, "1704070800000,10,12,9,11.5,200").unwrap();
        writeln!(file, "1704153600000,11,12,10,11,").unwrap();
        drop(file);

        let store = CsvBarStore::new(&dir);
        let bars = store.load_bars("spy", Timeframe::OneDay).unwrap().unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 11.5);
        assert_eq!(bars[1].volume, 0.0);

        assert!(store.load_bars("spy", Timeframe::OneWeek).unwrap().is_none());
        assert_eq!(store.symbols().unwrap(), vec!["SPY".to_string()]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_row_is_an_error() {
        let dir = temp_dir("bad");
        std::fs::write(
            dir.join("QQQ_30.csv"),
            "timestamp,open,high,low,close,volume\nabc,1,1,1,1,1\n",
        )
        .unwrap();

        let store = CsvBarStore::new(&dir);
        let err = store.load_bars("QQQ", Timeframe::ThirtyMin).unwrap_err();
        assert!(format!("{:#}", err).contains("row 1"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
