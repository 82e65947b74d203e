//! # FX Stats
//!
//! Numeric building blocks for the session seasonality toolkit.
//! This crate provides sample summaries, classical location tests
//! (one-sample t, Welch t, Welch and classic one-way ANOVA) and the small
//! optimization helpers needed to fit a GARCH(1,1) by maximum likelihood.

use thiserror::Error;

pub mod descriptive;
pub mod hypothesis;
pub mod linalg;
pub mod optimize;

pub use descriptive::{sharpe_ratio, SampleSummary};
pub use hypothesis::{
    classic_anova, one_sample_t_test, welch_anova, welch_t_test, FTestResult, TTestResult,
};

/// Errors that can occur in statistical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Zero variance: {0}")]
    ZeroVariance(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

impl From<statrs::StatsError> for MathError {
    fn from(err: statrs::StatsError) -> Self {
        MathError::CalculationError(err.to_string())
    }
}

/// Result type for statistical operations
pub type Result<T> = std::result::Result<T, MathError>;
