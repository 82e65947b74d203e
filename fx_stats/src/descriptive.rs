//! Sample summaries
//!
//! Mean and unbiased variance of a sample, the inputs every location test
//! in [`crate::hypothesis`] starts from.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Size, mean and unbiased (n - 1) variance of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    /// Number of observations
    pub n: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample variance with Bessel's correction
    pub variance: f64,
}

impl SampleSummary {
    /// Summarize a sample of at least two finite observations
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(MathError::InsufficientData(format!(
                "Need at least 2 observations, have {}.",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Sample contains non-finite values".to_string(),
            ));
        }

        Ok(Self {
            n: values.len(),
            mean: values.iter().mean(),
            variance: values.iter().variance(),
        })
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Standard error of the mean
    pub fn standard_error(&self) -> f64 {
        (self.variance / self.n as f64).sqrt()
    }

    /// Whether the sample has no dispersion beyond floating-point rounding
    ///
    /// A constant non-zero sample leaves a residual variance of order
    /// `(EPSILON * mean)^2`, so the cut-off scales with the squared mean.
    pub fn is_degenerate(&self) -> bool {
        self.variance <= f64::EPSILON * self.mean.powi(2)
    }
}

/// Mean over sample standard deviation, without annualization
pub fn sharpe_ratio(values: &[f64]) -> Result<f64> {
    let summary = SampleSummary::from_slice(values)?;
    if summary.is_degenerate() {
        return Err(MathError::ZeroVariance(
            "Sharpe ratio is undefined for a constant sample".to_string(),
        ));
    }

    Ok(summary.mean / summary.std_dev())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_matches_hand_computation() {
        let summary = SampleSummary::from_slice(&[1.0, 2.0, 3.0, 4.0]).unwrap();

        assert_eq!(summary.n, 4);
        assert_relative_eq!(summary.mean, 2.5);
        // ((1.5^2 + 0.5^2) * 2) / 3
        assert_relative_eq!(summary.variance, 5.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(summary.standard_error(), (5.0 / 12.0_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_summary_rejects_short_samples() {
        assert!(matches!(
            SampleSummary::from_slice(&[1.0]),
            Err(MathError::InsufficientData(_))
        ));
        assert!(matches!(
            SampleSummary::from_slice(&[]),
            Err(MathError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_summary_rejects_nan() {
        assert!(matches!(
            SampleSummary::from_slice(&[1.0, f64::NAN, 2.0]),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sharpe_ratio() {
        let sr = sharpe_ratio(&[0.01, 0.03, 0.02]).unwrap();
        assert_relative_eq!(sr, 2.0, epsilon = 1e-9);

        assert!(matches!(
            sharpe_ratio(&[0.5, 0.5, 0.5]),
            Err(MathError::ZeroVariance(_))
        ));
    }

    #[test]
    fn test_constant_sample_is_degenerate_despite_rounding() {
        let summary = SampleSummary::from_slice(&[0.2; 20]).unwrap();
        assert!(summary.is_degenerate());
        assert!(SampleSummary::from_slice(&[0.0; 5]).unwrap().is_degenerate());
        assert!(SampleSummary::from_slice(&[-1.0e-4; 250]).unwrap().is_degenerate());

        let spread = SampleSummary::from_slice(&[1.0e-4, 1.1e-4, 0.9e-4]).unwrap();
        assert!(!spread.is_degenerate());
    }
}
