use std::fmt;

use thiserror::Error;

/// Errors raised by market data collaborators
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data source not found: {0}")]
    SourceNotFound(String),

    #[error("Symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("Data loading failed: {message}")]
    LoadingFailed { message: String },

    #[error("Data parsing error: {message}")]
    ParseError { message: String },

    #[error("Market data fetch timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which field of a sample failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleField {
    Timestamp,
    Price,
    Volume,
}

impl fmt::Display for SampleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SampleField::Timestamp => "timestamp",
            SampleField::Price => "price",
            SampleField::Volume => "volume",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised by the risk scoring engine.
///
/// Every variant aborts the whole scoring call; no partial metrics are
/// ever produced alongside one of these.
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Insufficient data for {symbol}: {samples} samples, at least {required} required")]
    InsufficientData {
        symbol: String,
        samples: usize,
        required: usize,
    },

    #[error("Invalid sample for {symbol} at index {index}: {field} = {value}")]
    InvalidSample {
        symbol: String,
        index: usize,
        field: SampleField,
        value: f64,
    },

    #[error("Market data unavailable: {0}")]
    DataUnavailable(#[from] DataError),

    #[error("Invalid risk configuration: {message}")]
    InvalidConfig { message: String },

    #[error("No symbols specified for risk scoring")]
    NoSymbols,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RiskError {
    /// Symbol the error is attributed to, when there is one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            RiskError::InsufficientData { symbol, .. } | RiskError::InvalidSample { symbol, .. } => {
                Some(symbol)
            }
            RiskError::DataUnavailable(DataError::SymbolNotFound { symbol }) => Some(symbol),
            _ => None,
        }
    }
}

/// Result type alias for data collaborator operations
pub type DataResult<T> = Result<T, DataError>;

/// Result type alias for risk scoring operations
pub type RiskResult<T> = Result<T, RiskError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::RiskError::InvalidConfig { message: format!($($arg)*) }
    };
}
