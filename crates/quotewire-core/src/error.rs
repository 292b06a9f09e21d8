use thiserror::Error;

/// Parameter validation errors raised before any upstream call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid period '{value}'. Valid periods: {valid}")]
    InvalidPeriod { value: String, valid: String },
    #[error("invalid interval '{value}'. Valid intervals: {valid}")]
    InvalidInterval { value: String, valid: String },

    #[error("compare requires between {min} and {max} symbols, got {count}")]
    SymbolCount { count: usize, min: usize, max: usize },
}

/// Configuration loading errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value '{value}': {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("base url must start with http:// or https://: '{value}'")]
    InvalidBaseUrl { value: String },
}
