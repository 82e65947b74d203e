//! Trading-day bootstrap of session Sharpe ratios
//!
//! Each iteration resamples whole trading days (with replacement) inside
//! every session, so all currencies of a session share the same draw, and
//! records the per-currency Sharpe ratio `mean / std` of the resample. The
//! share of negative draws tells how robust a session's sign is.

use crate::config::BootstrapConfig;
use crate::error::{Result, SeasonalityError};
use crate::sessions::{Session, SessionMap, SessionSeries};
use crate::tables::ResultTable;
use fx_stats::{sharpe_ratio, MathError};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Outcome of [`bootstrap_sharpe`]
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    iterations: usize,
    sample_size: usize,
    negative_share: ResultTable,
    draws: BTreeMap<Session, ResultTable>,
}

impl BootstrapReport {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Share of iterations with a negative Sharpe ratio, currency x session
    pub fn negative_share(&self) -> &ResultTable {
        &self.negative_share
    }

    /// Raw Sharpe draws of one session, iteration x currency
    pub fn draws(&self, session: Session) -> Option<&ResultTable> {
        self.draws.get(&session)
    }

    /// Empirical quantile of one currency's draws in one session
    pub fn quantile(&self, session: Session, currency: &str, q: f64) -> Option<f64> {
        let mut values = self.draws(session)?.column(currency)?;
        values.sort_by(|a, b| a.total_cmp(b));
        quantile_sorted(&values, q)
    }

    /// Quantile `q` of every currency and session, currency x session
    pub fn quantile_table(&self, q: f64) -> Result<ResultTable> {
        if !(0.0..=1.0).contains(&q) {
            return Err(SeasonalityError::Configuration(format!(
                "quantile must be in [0, 1], got {}",
                q
            )));
        }
        ResultTable::try_from_fn(
            self.negative_share.rows().to_vec(),
            self.negative_share.columns().to_vec(),
            |currency, column| {
                let session: Session = column.parse()?;
                self.quantile(session, currency, q).ok_or_else(|| {
                    SeasonalityError::Alignment(format!(
                        "no bootstrap draws for {} in {}",
                        currency, session
                    ))
                })
            },
        )
    }
}

/// Linear interpolation between closest ranks
fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sharpe ratios of one resample of a session, one per currency
fn resample_sharpe(
    series: &SessionSeries,
    currencies: &[String],
    days: &[usize],
) -> Result<Vec<f64>> {
    let mut sharpes = Vec::with_capacity(currencies.len());
    let mut sample = Vec::with_capacity(days.len());
    for currency in currencies {
        let column = series.column(currency).ok_or_else(|| {
            SeasonalityError::Configuration(format!(
                "session {} has no column for {}",
                series.session(),
                currency
            ))
        })?;
        sample.clear();
        sample.extend(days.iter().map(|&day| column[day]));

        let sharpe = sharpe_ratio(&sample).map_err(|err| match err {
            MathError::ZeroVariance(_) => SeasonalityError::DegenerateSample {
                currency: currency.clone(),
                session: series.session().name().to_string(),
            },
            other => other.into(),
        })?;
        sharpes.push(sharpe);
    }
    Ok(sharpes)
}

/// Bootstrap the per-session Sharpe ratio of every currency
pub fn bootstrap_sharpe(sessions: &SessionMap, config: &BootstrapConfig) -> Result<BootstrapReport> {
    if config.iterations == 0 || config.sample_size < 2 {
        return Err(SeasonalityError::Configuration(format!(
            "bootstrap needs at least one iteration and two days per draw, got {} and {}",
            config.iterations, config.sample_size
        )));
    }

    let currencies = sessions.currencies();
    if currencies.is_empty() {
        return Err(SeasonalityError::Configuration(
            "bootstrap needs at least one currency".to_string(),
        ));
    }

    let mut pickers = Vec::with_capacity(Session::ALL.len());
    for session in Session::ALL {
        let series = sessions.require(session)?;
        for currency in currencies {
            let observations = series.column(currency).map_or(0, <[f64]>::len);
            if observations < 2 {
                return Err(SeasonalityError::InsufficientData {
                    currency: currency.clone(),
                    session: session.name().to_string(),
                    observations,
                });
            }
        }
        pickers.push((session, series, Uniform::new(0, series.len())));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!(
        iterations = config.iterations,
        sample_size = config.sample_size,
        seeded = config.seed.is_some(),
        "bootstrapping session Sharpe ratios"
    );

    let mut negatives: BTreeMap<Session, Vec<usize>> = Session::ALL
        .iter()
        .map(|s| (*s, vec![0; currencies.len()]))
        .collect();
    let mut raw: BTreeMap<Session, Vec<f64>> = Session::ALL
        .iter()
        .map(|s| (*s, Vec::with_capacity(config.iterations * currencies.len())))
        .collect();
    let mut days = Vec::with_capacity(config.sample_size);

    for iteration in 0..config.iterations {
        for (session, series, picker) in &pickers {
            days.clear();
            days.extend((0..config.sample_size).map(|_| picker.sample(&mut rng)));

            let sharpes = resample_sharpe(series, currencies, &days)?;
            if let Some(counts) = negatives.get_mut(session) {
                for (count, sharpe) in counts.iter_mut().zip(&sharpes) {
                    if *sharpe < 0.0 {
                        *count += 1;
                    }
                }
            }
            if let Some(values) = raw.get_mut(session) {
                values.extend(sharpes);
            }
        }
        if (iteration + 1) % 100 == 0 {
            debug!(completed = iteration + 1, "bootstrap progress");
        }
    }

    let n = config.iterations as f64;
    let negative_share = ResultTable::try_from_fn(
        currencies.to_vec(),
        Session::ALL.iter().map(|s| s.name().to_string()).collect(),
        |currency, column| {
            let session: Session = column.parse()?;
            let count = currencies
                .iter()
                .position(|c| c == currency)
                .zip(negatives.get(&session))
                .and_then(|(index, counts)| counts.get(index))
                .ok_or_else(|| {
                    SeasonalityError::Alignment(format!(
                        "no negative-share count for {} in {}",
                        currency, session
                    ))
                })?;
            Ok(*count as f64 / n)
        },
    )?;

    let iteration_labels: Vec<String> = (0..config.iterations).map(|i| i.to_string()).collect();
    let mut draws = BTreeMap::new();
    for (session, values) in raw {
        draws.insert(
            session,
            ResultTable::new(iteration_labels.clone(), currencies.to_vec(), values)?,
        );
    }

    Ok(BootstrapReport {
        iterations: config.iterations,
        sample_size: config.sample_size,
        negative_share,
        draws,
    })
}
