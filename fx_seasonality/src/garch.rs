//! Constant-mean GARCH(1,1) fits per session
//!
//! Checks whether session mean returns survive once volatility clustering
//! is modelled. For each currency the four sessions are aligned on the
//! trading days they all share, and each session's daily return is fitted
//! with
//!
//! ```text
//! r_t      = mu + e_t,          e_t ~ N(0, sigma2_t)
//! sigma2_t = omega + alpha * e_{t-1}^2 + beta * sigma2_{t-1}
//! ```
//!
//! by Gaussian maximum likelihood. The reported statistic is `mu`, tested
//! against zero with its Hessian-based standard error.

use crate::config::GarchConfig;
use crate::error::{Result, SeasonalityError};
use crate::sessions::{Session, SessionMap};
use crate::tables::{TestCell, TestOutcome};
use chrono::NaiveDate;
use fx_stats::linalg::invert;
use fx_stats::optimize::{nelder_mead, numerical_hessian, NelderMeadOptions};
use fx_stats::{MathError, SampleSummary};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use tracing::{debug, info, warn};

/// Fitted constant-mean GARCH(1,1)
#[derive(Debug, Clone, PartialEq)]
pub struct GarchFit {
    /// Constant mean of the return equation
    pub mu: f64,
    /// Variance intercept
    pub omega: f64,
    /// ARCH coefficient
    pub alpha: f64,
    /// GARCH coefficient
    pub beta: f64,
    pub log_likelihood: f64,
    /// Standard error of `mu`
    pub mu_std_error: f64,
    /// Two-sided p-value of `mu == 0`
    pub mu_p_value: f64,
    pub converged: bool,
    pub iterations: usize,
}

impl GarchFit {
    /// `alpha + beta`; below one for a covariance-stationary fit
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Unconditional variance implied by the fit
    pub fn long_run_variance(&self) -> Option<f64> {
        let persistence = self.persistence();
        (persistence < 1.0).then(|| self.omega / (1.0 - persistence))
    }
}

/// Constant-mean GARCH(1,1) model
pub struct GarchModel {
    options: NelderMeadOptions,
}

impl GarchModel {
    /// Create a new GARCH(1,1) model
    pub fn new(max_iterations: usize) -> Self {
        Self {
            options: NelderMeadOptions {
                max_iterations,
                ..NelderMeadOptions::default()
            },
        }
    }

    /// Model name
    pub fn name(&self) -> &str {
        "GARCH(1,1)"
    }

    /// Fit the model to a return series by maximum likelihood
    pub fn fit(&self, returns: &[f64]) -> Result<GarchFit> {
        let summary = SampleSummary::from_slice(returns)?;
        if summary.is_degenerate() {
            return Err(MathError::ZeroVariance(
                "cannot fit GARCH to a constant series".to_string(),
            )
            .into());
        }

        let objective = |params: &[f64]| negative_log_likelihood(params, returns);
        // Typical daily persistence as a starting point
        let start = [summary.mean, 0.1 * summary.variance, 0.1, 0.8];
        let minimum = nelder_mead(&objective, &start, self.options)?;

        let mu_std_error = self.mu_std_error(&objective, &minimum.point, &summary);
        let z = minimum.point[0] / mu_std_error;
        let standard_normal = Normal::new(0.0, 1.0).map_err(MathError::from)?;
        let mu_p_value = (2.0 * standard_normal.cdf(-z.abs())).clamp(0.0, 1.0);

        Ok(GarchFit {
            mu: minimum.point[0],
            omega: minimum.point[1],
            alpha: minimum.point[2],
            beta: minimum.point[3],
            log_likelihood: -minimum.value,
            mu_std_error,
            mu_p_value,
            converged: minimum.converged,
            iterations: minimum.iterations,
        })
    }

    /// Standard error of `mu` from the inverse Hessian, falling back to the
    /// i.i.d. standard error when the Hessian is unusable at the optimum
    fn mu_std_error<F>(&self, objective: &F, point: &[f64], summary: &SampleSummary) -> f64
    where
        F: Fn(&[f64]) -> f64,
    {
        let from_hessian = numerical_hessian(objective, point)
            .and_then(|hessian| invert(&hessian))
            .ok()
            .map(|covariance| covariance[0][0])
            .filter(|variance| variance.is_finite() && *variance > 0.0)
            .map(f64::sqrt);

        match from_hessian {
            Some(se) => se,
            None => {
                warn!("GARCH Hessian not invertible at optimum, using i.i.d. standard error");
                summary.standard_error()
            }
        }
    }
}

/// Gaussian negative log-likelihood; infinite outside the stationary region
fn negative_log_likelihood(params: &[f64], returns: &[f64]) -> f64 {
    let (mu, omega, alpha, beta) = (params[0], params[1], params[2], params[3]);
    if omega <= 0.0 || alpha < 0.0 || beta < 0.0 || alpha + beta >= 1.0 {
        return f64::INFINITY;
    }

    // Backcast the initial variance with the mean squared residual
    let backcast =
        returns.iter().map(|r| (r - mu).powi(2)).sum::<f64>() / returns.len() as f64;

    let mut variance = backcast;
    let mut previous_sq = backcast;
    let mut nll = 0.0;
    for &r in returns {
        variance = omega + alpha * previous_sq + beta * variance;
        let residual = r - mu;
        nll += 0.5 * ((2.0 * PI).ln() + variance.ln() + residual * residual / variance);
        previous_sq = residual * residual;
    }

    if nll.is_finite() {
        nll
    } else {
        f64::INFINITY
    }
}

/// Dates on which every session has an observation
fn common_dates(sessions: &SessionMap) -> Result<Vec<NaiveDate>> {
    let mut common: Option<BTreeSet<NaiveDate>> = None;
    for session in Session::ALL {
        let dates: BTreeSet<NaiveDate> = sessions.require(session)?.dates().iter().copied().collect();
        common = Some(match common {
            Some(existing) => existing.intersection(&dates).copied().collect(),
            None => dates,
        });
    }
    Ok(common.unwrap_or_default().into_iter().collect())
}

/// Fit a constant-mean GARCH(1,1) to every currency and session
///
/// The statistic table holds `mu` in return units; the p-value table holds
/// the two-sided p-value of `mu == 0`.
pub fn garch_session_means(sessions: &SessionMap, config: &GarchConfig) -> Result<TestOutcome> {
    if !(config.scale.is_finite() && config.scale > 0.0) {
        return Err(SeasonalityError::Configuration(format!(
            "GARCH scale must be positive, got {}",
            config.scale
        )));
    }

    let dates = common_dates(sessions)?;
    info!(common_days = dates.len(), "fitting constant-mean GARCH(1,1) per session");

    let model = GarchModel::new(config.max_iterations);
    let mut cells = Vec::with_capacity(sessions.currencies().len() * Session::ALL.len());

    for currency in sessions.currencies() {
        if dates.len() < config.min_observations.max(2) {
            return Err(SeasonalityError::InsufficientData {
                currency: currency.clone(),
                session: "all sessions".to_string(),
                observations: dates.len(),
            });
        }

        for session in Session::ALL {
            let series = sessions.require(session)?;
            let scaled = dates
                .iter()
                .map(|date| {
                    series.value(currency, *date).map(|v| v * config.scale).ok_or_else(|| {
                        SeasonalityError::Configuration(format!(
                            "session {} has no {} value on {}",
                            session, currency, date
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            let fit = model.fit(&scaled).map_err(|err| match err {
                SeasonalityError::Math(MathError::ZeroVariance(_)) => {
                    SeasonalityError::DegenerateSample {
                        currency: currency.clone(),
                        session: session.name().to_string(),
                    }
                }
                other => other,
            })?;

            if !fit.converged {
                warn!(%currency, %session, iterations = fit.iterations, "GARCH fit did not converge");
            }
            debug!(%currency, %session, mu = fit.mu / config.scale, p_value = fit.mu_p_value, persistence = fit.persistence(), "GARCH fit");

            cells.push(TestCell {
                statistic: fit.mu / config.scale,
                p_value: fit.mu_p_value,
            });
        }
    }

    TestOutcome::from_cells(
        sessions.currencies().to_vec(),
        Session::ALL.iter().map(|s| s.name().to_string()).collect(),
        cells,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal as NormalDist};

    fn simulated_garch(n: usize, mu: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let shock = NormalDist::new(0.0, 1.0).unwrap();
        let (omega, alpha, beta) = (0.1, 0.1, 0.8);

        let mut variance = omega / (1.0 - alpha - beta);
        let mut previous = 0.0_f64;
        (0..n)
            .map(|_| {
                variance = omega + alpha * previous * previous + beta * variance;
                let e = variance.sqrt() * shock.sample(&mut rng);
                previous = e;
                mu + e
            })
            .collect()
    }

    #[test]
    fn test_likelihood_rejects_non_stationary_parameters() {
        let returns = [0.1, -0.2, 0.3];
        assert!(negative_log_likelihood(&[0.0, 0.1, 0.5, 0.6], &returns).is_infinite());
        assert!(negative_log_likelihood(&[0.0, -0.1, 0.1, 0.6], &returns).is_infinite());
        assert!(negative_log_likelihood(&[0.0, 0.1, 0.1, 0.6], &returns).is_finite());
    }

    #[test]
    fn test_fit_recovers_positive_mean() {
        let returns = simulated_garch(2000, 0.5, 11);
        let fit = GarchModel::new(5000).fit(&returns).unwrap();

        assert!((fit.mu - 0.5).abs() < 0.1, "mu = {}", fit.mu);
        assert!(fit.persistence() < 1.0);
        assert!(fit.mu_std_error > 0.0);
        assert!(fit.mu_p_value < 0.01);
    }

    #[test]
    fn test_fit_rejects_constant_series() {
        let result = GarchModel::new(100).fit(&[0.2; 20]);
        assert!(matches!(
            result,
            Err(SeasonalityError::Math(MathError::ZeroVariance(_)))
        ));
    }
}
