use crate::domain::market::timeframe::Timeframe;
use thiserror::Error;

/// Errors surfaced by the scoring pipeline
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Insufficient data on {timeframe}: {have} bars < {need}")]
    InsufficientData {
        timeframe: Timeframe,
        have: usize,
        need: usize,
    },

    #[error("Data quality rejected on {timeframe}: {reason}")]
    DataQuality { timeframe: Timeframe, reason: String },

    #[error("No usable timeframe for {symbol}")]
    NoUsableTimeframes { symbol: String },
}

impl EngineError {
    /// Short label used for metrics and payload bookkeeping
    pub fn reason_label(&self) -> &'static str {
        match self {
            EngineError::InsufficientData { .. } => "insufficient_data",
            EngineError::DataQuality { .. } => "data_quality",
            EngineError::NoUsableTimeframes { .. } => "no_timeframes",
        }
    }
}

/// Errors raised while compiling a pattern condition
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConditionError {
    #[error("Condition field path is empty")]
    EmptyPath,

    #[error("Unknown condition operator: {op}")]
    UnknownOperator { op: String },

    #[error("Operator {op} requires a value")]
    MissingValue { op: String },

    #[error("Invalid operand for {op}: {reason}")]
    InvalidOperand { op: String, reason: String },
}
