//! Error types for the fx_seasonality crate

use fx_stats::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised anywhere in the seasonality pipeline
#[derive(Debug, Error)]
pub enum SeasonalityError {
    /// Malformed input series, invalid session layout or a session map missing a required entry
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A currency/session sample is too small for the requested test
    #[error("Insufficient data for {currency} in session {session}: {observations} observation(s), need at least 2")]
    InsufficientData {
        currency: String,
        session: String,
        observations: usize,
    },

    /// A statistic table and its p-value table disagree in shape or labels
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// The sample has no variance, so the test statistic is undefined
    #[error("Degenerate sample for {currency} in session {session}: zero variance")]
    DegenerateSample { currency: String, session: String },

    /// Error from the numeric routines
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from CSV writing of result tables
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from the polars data frame layer
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a field of an input file
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<chrono::ParseError> for SeasonalityError {
    fn from(err: chrono::ParseError) -> Self {
        SeasonalityError::Parse(err.to_string())
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, SeasonalityError>;
