//! Location tests
//!
//! Contains the classical tests used to compare session returns:
//! - One-sample Student t-test against a hypothesized mean
//! - Two-sample t-test with unequal variances (Welch)
//! - One-way ANOVA, both the Welch form and the classic pooled-variance form
//!
//! All p-values are two-sided for t-tests and upper-tail for F-tests, and are
//! clamped to `[0, 1]`.

use crate::descriptive::SampleSummary;
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Outcome of a t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// t statistic
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Degrees of freedom (fractional for Welch)
    pub degrees_of_freedom: f64,
}

/// Outcome of an F-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FTestResult {
    /// F statistic
    pub statistic: f64,
    /// Upper-tail p-value
    pub p_value: f64,
    /// Numerator degrees of freedom
    pub df_between: f64,
    /// Denominator degrees of freedom (fractional for Welch)
    pub df_within: f64,
}

/// One-sample t-test of `H0: mean == hypothesized_mean`
pub fn one_sample_t_test(sample: &[f64], hypothesized_mean: f64) -> Result<TTestResult> {
    let summary = SampleSummary::from_slice(sample)?;
    if summary.is_degenerate() {
        return Err(MathError::ZeroVariance(
            "t statistic is undefined for a constant sample".to_string(),
        ));
    }

    let statistic = (summary.mean - hypothesized_mean) / summary.standard_error();
    let degrees_of_freedom = (summary.n - 1) as f64;

    Ok(TTestResult {
        statistic,
        p_value: two_sided_t_p_value(statistic, degrees_of_freedom)?,
        degrees_of_freedom,
    })
}

/// Welch's two-sample t-test of `H0: mean(a) == mean(b)`
///
/// The statistic is positive when `a` has the larger mean.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TTestResult> {
    let first = SampleSummary::from_slice(a)?;
    let second = SampleSummary::from_slice(b)?;

    if first.is_degenerate() && second.is_degenerate() {
        return Err(MathError::ZeroVariance(
            "both samples are constant".to_string(),
        ));
    }

    let var_a = first.variance / first.n as f64;
    let var_b = second.variance / second.n as f64;
    let pooled = var_a + var_b;

    let statistic = (first.mean - second.mean) / pooled.sqrt();
    // Welch-Satterthwaite
    let degrees_of_freedom = pooled.powi(2)
        / (var_a.powi(2) / (first.n - 1) as f64 + var_b.powi(2) / (second.n - 1) as f64);

    Ok(TTestResult {
        statistic,
        p_value: two_sided_t_p_value(statistic, degrees_of_freedom)?,
        degrees_of_freedom,
    })
}

/// Welch's heteroscedastic one-way ANOVA across two or more groups
///
/// Tolerates unequal variances and unequal group sizes. Every group needs
/// a strictly positive variance since groups are weighted by `n / s^2`.
pub fn welch_anova(groups: &[&[f64]]) -> Result<FTestResult> {
    let summaries = summarize_groups(groups)?;
    if let Some(index) = summaries.iter().position(|s| s.is_degenerate()) {
        return Err(MathError::ZeroVariance(format!(
            "group {} is constant",
            index
        )));
    }

    let k = summaries.len() as f64;
    let weights: Vec<f64> = summaries
        .iter()
        .map(|s| s.n as f64 / s.variance)
        .collect();
    let total_weight: f64 = weights.iter().sum();
    let weighted_mean = summaries
        .iter()
        .zip(&weights)
        .map(|(s, w)| w * s.mean)
        .sum::<f64>()
        / total_weight;

    let between = summaries
        .iter()
        .zip(&weights)
        .map(|(s, w)| w * (s.mean - weighted_mean).powi(2))
        .sum::<f64>()
        / (k - 1.0);

    let lambda = summaries
        .iter()
        .zip(&weights)
        .map(|(s, w)| (1.0 - w / total_weight).powi(2) / (s.n - 1) as f64)
        .sum::<f64>();

    let correction = 1.0 + 2.0 * (k - 2.0) / (k * k - 1.0) * lambda;
    let statistic = between / correction;
    let df_between = k - 1.0;
    let df_within = (k * k - 1.0) / (3.0 * lambda);

    Ok(FTestResult {
        statistic,
        p_value: upper_f_p_value(statistic, df_between, df_within)?,
        df_between,
        df_within,
    })
}

/// Classic pooled-variance one-way ANOVA across two or more groups
pub fn classic_anova(groups: &[&[f64]]) -> Result<FTestResult> {
    let summaries = summarize_groups(groups)?;
    if summaries.iter().all(SampleSummary::is_degenerate) {
        return Err(MathError::ZeroVariance(
            "all groups are constant".to_string(),
        ));
    }

    let total_n: usize = summaries.iter().map(|s| s.n).sum();
    let grand_mean = summaries
        .iter()
        .map(|s| s.n as f64 * s.mean)
        .sum::<f64>()
        / total_n as f64;

    let ss_between: f64 = summaries
        .iter()
        .map(|s| s.n as f64 * (s.mean - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = summaries
        .iter()
        .map(|s| (s.n - 1) as f64 * s.variance)
        .sum();

    let df_between = (summaries.len() - 1) as f64;
    let df_within = (total_n - summaries.len()) as f64;
    let statistic = (ss_between / df_between) / (ss_within / df_within);

    Ok(FTestResult {
        statistic,
        p_value: upper_f_p_value(statistic, df_between, df_within)?,
        df_between,
        df_within,
    })
}

fn summarize_groups(groups: &[&[f64]]) -> Result<Vec<SampleSummary>> {
    if groups.len() < 2 {
        return Err(MathError::InvalidInput(format!(
            "ANOVA needs at least 2 groups, have {}",
            groups.len()
        )));
    }

    groups
        .iter()
        .map(|group| SampleSummary::from_slice(group))
        .collect()
}

fn two_sided_t_p_value(statistic: f64, degrees_of_freedom: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)?;
    // Lower tail of -|t| keeps precision for large statistics
    Ok((2.0 * dist.cdf(-statistic.abs())).clamp(0.0, 1.0))
}

fn upper_f_p_value(statistic: f64, df_between: f64, df_within: f64) -> Result<f64> {
    let dist = FisherSnedecor::new(df_between, df_within)?;
    Ok((1.0 - dist.cdf(statistic)).clamp(0.0, 1.0))
}
