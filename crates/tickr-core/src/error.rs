use thiserror::Error;

/// Validation errors for symbols, prices and alert thresholds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("low price alert {threshold} must be below the current price {price}")]
    LowAlertNotBelowPrice { threshold: f64, price: f64 },
    #[error("high price alert {threshold} must be at or above the current price {price}")]
    HighAlertBelowPrice { threshold: f64, price: f64 },

    #[error("symbol '{symbol}' is not on the watch list")]
    UnknownSymbol { symbol: String },
}

/// Failure of a whole quote refresh or symbol search call.
///
/// None of these abort the process: the scheduler treats every variant as
/// a no-op tick and tries again on the next interval.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure (DNS, timeout, refused connection) or a non-2xx status.
    #[error("network error: {0}")]
    Network(String),

    /// The body is not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// The body is JSON but lacks the expected structure.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl FetchError {
    /// `UnexpectedShape` means "the upstream had no data for us", not a fault.
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::UnexpectedShape(_))
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "fetch.network",
            Self::Decode(_) => "fetch.decode",
            Self::UnexpectedShape(_) => "fetch.unexpected_shape",
        }
    }
}

/// A single response record could not be turned into a domain value.
///
/// Scoped to that record: sibling records in the same batch are unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is corrupt: field '{field}' {reason}")]
    Corrupt { field: &'static str, reason: String },
}

impl RecordError {
    pub fn missing(field: &'static str) -> Self {
        Self::Corrupt {
            field,
            reason: String::from("is missing"),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            field,
            reason: reason.into(),
        }
    }
}

/// Invalid runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("refresh interval {actual_ms}ms is below the minimum of {min_ms}ms")]
    IntervalTooShort { actual_ms: u64, min_ms: u64 },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("event channel capacity must be greater than zero")]
    ZeroEventCapacity,

    #[error("endpoint '{name}' must not be empty")]
    EmptyEndpoint { name: &'static str },

    #[error("environment variable {key} has invalid value '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("invalid configuration document: {0}")]
    Document(#[from] serde_json::Error),
}
