//! mtf-state - multi-timeframe technical state for a universe of symbols
//!
//! Reads CSV bar files, computes one payload per symbol and prints it as
//! JSON on stdout. Logs go to stderr.
//!
//! # Usage
//! ```sh
//! RUST_LOG=debug mtf-state --data-dir data/bars --symbols AAPL,MSFT --pretty
//! ```
//!
//! # Environment Variables
//! - `MTF_MIN_BUNDLE_BARS` - Minimum bars per timeframe bundle (default: 50)
//! - `MTF_DAILY_PIVOT_LOOKBACK` / `MTF_WEEKLY_PIVOT_LOOKBACK` - Swing pivot windows
//! - `MTF_FORCE_RTH` - Force the LTF session flag instead of deriving it

use anyhow::{Context, Result};
use clap::Parser;
use mtf_state::application::assembler::InstrumentInput;
use mtf_state::application::engine::ScoringEngine;
use mtf_state::config::{EngineConfig, load_learned_weights};
use mtf_state::domain::market::timeframe::Timeframe;
use mtf_state::domain::ports::BarSource;
use mtf_state::domain::scoring::payload::merge_with_previous;
use mtf_state::domain::scoring::weights::LearnedWeights;
use mtf_state::infrastructure::CsvBarStore;
use mtf_state::infrastructure::observability::EngineMetrics;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of `<SYMBOL>_<TF>.csv` bar files
    #[arg(long, default_value = "data/bars")]
    data_dir: PathBuf,

    /// Comma-separated symbols (default: every symbol found in the data dir)
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Learned weight overrides (TOML, or JSON by extension)
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Directory of previous payloads named `<SYMBOL>.json` to merge under the new ones
    #[arg(long)]
    previous: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Print Prometheus metrics to stderr after scoring
    #[arg(long)]
    metrics: bool,
}

fn load_input(store: &CsvBarStore, symbol: &str, weights: &LearnedWeights) -> Result<InstrumentInput> {
    let mut input = InstrumentInput::new(symbol).with_weights(weights.clone());
    // Monthly bars feed the exhaustion merge only
    for tf in Timeframe::SCORED.iter().chain([Timeframe::OneMonth].iter()) {
        if let Some(bars) = store
            .load_bars(symbol, *tf)
            .context(format!("Failed to load {} bars for {}", tf, symbol))?
        {
            input = input.with_series(*tf, bars);
        }
    }
    Ok(input)
}

fn load_previous(dir: &Path, symbol: &str) -> Result<Option<Value>> {
    let path = dir.join(format!("{}.json", symbol.to_uppercase()));
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .context(format!("Failed to read previous payload: {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .context(format!("Failed to parse previous payload: {}", path.display()))?;
    Ok(Some(value))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let args = Args::parse();
    info!("mtf-state {} starting...", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::from_env()?;
    let weights = match &args.weights {
        Some(path) => load_learned_weights(path)?,
        None => LearnedWeights::default(),
    };

    let store = CsvBarStore::new(&args.data_dir);
    let symbols = if args.symbols.is_empty() {
        store.symbols()?
    } else {
        args.symbols.iter().map(|s| s.trim().to_uppercase()).collect()
    };
    info!(
        "Configuration loaded: DataDir={}, Symbols={:?}",
        args.data_dir.display(),
        symbols
    );

    let inputs = symbols
        .iter()
        .map(|symbol| load_input(&store, symbol, &weights))
        .collect::<Result<Vec<_>>>()?;

    let mut engine = ScoringEngine::new(config);
    if args.metrics {
        engine = engine.with_metrics(EngineMetrics::new()?);
    }

    for result in engine.score_universe(&inputs) {
        let payload = match result.payload {
            Ok(payload) => payload,
            Err(err) => {
                warn!(symbol = %result.symbol, "Skipped: {}", err);
                continue;
            }
        };

        let previous = match &args.previous {
            Some(dir) => load_previous(dir, &result.symbol)?,
            None => None,
        };
        let merged = merge_with_previous(&payload, previous.as_ref())?;

        let line = if args.pretty {
            serde_json::to_string_pretty(&merged)?
        } else {
            serde_json::to_string(&merged)?
        };
        println!("{}", line);
    }

    if let Some(metrics) = engine.metrics() {
        eprintln!("{}", metrics.render());
    }

    Ok(())
}
