//! Hour-of-day return profile
//!
//! Exploratory view used to pick session boundaries: returns are grouped by
//! hour of day across all dates. Row labels are the hours present in the
//! data, in ascending order.

use crate::data::{float_values, optional_float_values, u32_values, ReturnSeries, HOUR_COLUMN};
use crate::error::{Result, SeasonalityError};
use crate::tables::ResultTable;
use fx_stats::SampleSummary;
use polars::prelude::*;
use statrs::statistics::Statistics;

/// Leading column of [`sharpe_by_hour`]
pub const CROSS_CURRENCY_COLUMN: &str = "Mean across ccys";

/// Group returns by hour of day and aggregate, one row per hour, ascending
fn by_hour(returns: &ReturnSeries, aggregations: Vec<Expr>) -> Result<(Vec<u32>, DataFrame)> {
    let profile = returns
        .with_calendar()
        .groupby([col(HOUR_COLUMN)])
        .agg(aggregations)
        .sort(HOUR_COLUMN, SortOptions::default())
        .collect()?;

    let hours = u32_values(profile.column(HOUR_COLUMN)?)?;
    Ok((hours, profile))
}

fn hour_labels(hours: &[u32]) -> Vec<String> {
    hours.iter().map(|h| h.to_string()).collect()
}

fn stat_column(currency: &str, stat: &str) -> String {
    format!("{}:{}", currency, stat)
}

/// Running sum over the day of the mean return of each hour, hour x currency
pub fn cumulative_mean_by_hour(returns: &ReturnSeries) -> Result<ResultTable> {
    let means = returns.currencies().iter().map(|c| col(c).mean()).collect();
    let (hours, profile) = by_hour(returns, means)?;

    let mut columns = Vec::with_capacity(returns.currencies().len());
    for currency in returns.currencies() {
        let mut total = 0.0;
        let running: Vec<f64> = float_values(profile.column(currency)?)?
            .into_iter()
            .map(|mean| {
                total += mean;
                total
            })
            .collect();
        columns.push(running);
    }

    let values = (0..hours.len())
        .flat_map(|row| columns.iter().map(move |column| column[row]))
        .collect();
    ResultTable::new(hour_labels(&hours), returns.currencies().to_vec(), values)
}

/// Per-hour Sharpe ratio (mean / std) of each currency, hour x currency
///
/// The first column averages the Sharpe ratios across currencies.
pub fn sharpe_by_hour(returns: &ReturnSeries) -> Result<ResultTable> {
    let mut aggregations = Vec::with_capacity(returns.currencies().len() * 3);
    for currency in returns.currencies() {
        aggregations.push(col(currency).count().alias(&stat_column(currency, "n")));
        aggregations.push(col(currency).mean().alias(&stat_column(currency, "mean")));
        aggregations.push(col(currency).std(1).alias(&stat_column(currency, "std")));
    }
    let (hours, profile) = by_hour(returns, aggregations)?;

    let mut stats = Vec::with_capacity(returns.currencies().len());
    for currency in returns.currencies() {
        stats.push((
            u32_values(profile.column(&stat_column(currency, "n"))?)?,
            float_values(profile.column(&stat_column(currency, "mean"))?)?,
            optional_float_values(profile.column(&stat_column(currency, "std"))?)?,
        ));
    }

    let mut columns = Vec::with_capacity(returns.currencies().len() + 1);
    columns.push(CROSS_CURRENCY_COLUMN.to_string());
    columns.extend(returns.currencies().iter().cloned());

    let mut values = Vec::with_capacity(hours.len() * columns.len());
    for (row, hour) in hours.iter().enumerate() {
        let mut sharpes = Vec::with_capacity(returns.currencies().len());
        for (currency, (counts, means, stds)) in returns.currencies().iter().zip(&stats) {
            let session = format!("hour {}", hour);
            let n = counts[row] as usize;
            let std_dev = match stds[row] {
                Some(std_dev) if n >= 2 => std_dev,
                _ => {
                    return Err(SeasonalityError::InsufficientData {
                        currency: currency.clone(),
                        session,
                        observations: n,
                    })
                }
            };

            let summary = SampleSummary {
                n,
                mean: means[row],
                variance: std_dev * std_dev,
            };
            if summary.is_degenerate() {
                return Err(SeasonalityError::DegenerateSample {
                    currency: currency.clone(),
                    session,
                });
            }
            sharpes.push(summary.mean / summary.std_dev());
        }
        values.push(sharpes.iter().mean());
        values.extend(sharpes);
    }

    ResultTable::new(hour_labels(&hours), columns, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn two_day_returns() -> ReturnSeries {
        let mut timestamps = Vec::new();
        for day in [4, 5] {
            for hour in [1, 2] {
                timestamps.push(
                    NaiveDate::from_ymd_opt(2024, 3, day)
                        .unwrap()
                        .and_hms_opt(hour, 0, 0)
                        .unwrap(),
                );
            }
        }
        ReturnSeries::new(
            timestamps,
            vec!["EUR".to_string(), "JPY".to_string()],
            vec![vec![1.0, 2.0, 3.0, 6.0], vec![-1.0, 1.0, -3.0, 2.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_cumulative_mean_accumulates_over_hours() {
        let table = cumulative_mean_by_hour(&two_day_returns()).unwrap();

        assert_eq!(table.rows(), &["1", "2"]);
        // EUR: hour 1 mean 2, hour 2 mean 4
        assert_relative_eq!(table.get("1", "EUR").unwrap(), 2.0);
        assert_relative_eq!(table.get("2", "EUR").unwrap(), 6.0);
        assert_relative_eq!(table.get("2", "JPY").unwrap(), -0.5);
    }

    #[test]
    fn test_sharpe_by_hour_leads_with_cross_currency_mean() {
        let table = sharpe_by_hour(&two_day_returns()).unwrap();

        assert_eq!(table.columns()[0], CROSS_CURRENCY_COLUMN);
        // EUR hour 1: [1, 3] -> mean 2, std sqrt(2)
        let eur = 2.0 / 2.0_f64.sqrt();
        // JPY hour 1: [-1, -3] -> mean -2, std sqrt(2)
        let jpy = -2.0 / 2.0_f64.sqrt();
        assert_relative_eq!(table.get("1", "EUR").unwrap(), eur);
        assert_relative_eq!(table.get("1", CROSS_CURRENCY_COLUMN).unwrap(), (eur + jpy) / 2.0);
    }

    #[test]
    fn test_single_observation_hour_is_insufficient() {
        let returns = ReturnSeries::new(
            vec![NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(5, 0, 0)
                .unwrap()],
            vec!["EUR".to_string()],
            vec![vec![0.1]],
        )
        .unwrap();

        assert!(matches!(
            sharpe_by_hour(&returns),
            Err(SeasonalityError::InsufficientData { observations: 1, .. })
        ));
    }

    #[test]
    fn test_constant_hour_is_degenerate() {
        let timestamps = (4..8)
            .map(|day| {
                NaiveDate::from_ymd_opt(2024, 3, day)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap()
            })
            .collect();
        let returns =
            ReturnSeries::new(timestamps, vec!["EUR".to_string()], vec![vec![0.2; 4]]).unwrap();

        assert!(matches!(
            sharpe_by_hour(&returns),
            Err(SeasonalityError::DegenerateSample { .. })
        ));
    }
}
