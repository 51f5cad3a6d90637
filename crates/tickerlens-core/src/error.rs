use thiserror::Error;

/// Validation and contract errors exposed by `tickerlens-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptySymbol,
    #[error("ticker length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("lookback must cover at least one day")]
    EmptyLookback,
    #[error("lookback start {start} is after end {end}")]
    InvertedRange { start: String, end: String },
    #[error("lookback of {days} days reaches before the supported calendar")]
    LookbackOutOfRange { days: u32 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,

    #[error("moving average window must be greater than zero")]
    ZeroWindow,
}

/// Configuration errors raised while reading environment overrides.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidInteger { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    ZeroValue { var: &'static str },
    #[error("{var} cannot be empty")]
    EmptyValue { var: &'static str },
}
