pub mod csv_bars;
pub mod observability;

pub use csv_bars::CsvBarStore;
