//! Hourly price and return series
//!
//! Both series wrap a polars [`DataFrame`]: a `timestamp` column of
//! millisecond datetimes followed by one `Float64` column per currency.
//! Constructors normalize and validate the frame so the rest of the
//! pipeline can read columns as contiguous slices without further checks.

use crate::error::{Result, SeasonalityError};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// Timestamp layout used for CSV input and output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the index column in CSV files
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Hour of day derived by [`ReturnSeries::with_calendar`]
pub const HOUR_COLUMN: &str = "_hour";

/// Calendar date derived by [`ReturnSeries::with_calendar`]
pub const DATE_COLUMN: &str = "_date";

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Hourly prices, one column per currency
#[derive(Debug, Clone)]
pub struct PriceSeries {
    frame: DataFrame,
    currencies: Vec<String>,
}

/// Hourly log returns, one column per currency
#[derive(Debug, Clone)]
pub struct ReturnSeries {
    frame: DataFrame,
    currencies: Vec<String>,
}

impl PriceSeries {
    /// Create a price series; prices must be strictly positive and finite
    pub fn new(
        timestamps: Vec<NaiveDateTime>,
        currencies: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        Self::from_frame(build_frame(&timestamps, &currencies, columns, "price")?)
    }

    /// Wrap an existing frame whose first column is the timestamp index
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let (frame, currencies) = normalize_frame(frame, "price")?;

        for currency in &currencies {
            let prices = frame.column(currency)?.f64()?;
            if let Some(bad) = prices.into_no_null_iter().find(|p| *p <= 0.0) {
                return Err(SeasonalityError::Configuration(format!(
                    "price series for {} contains a non-positive price ({})",
                    currency, bad
                )));
            }
        }

        Ok(Self { frame, currencies })
    }

    /// Load prices from a CSV file with a `timestamp` column followed by one column per currency
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_frame(read_frame(path.as_ref())?)
    }

    /// Write prices to CSV in the layout accepted by [`PriceSeries::from_csv`]
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_frame(path.as_ref(), &self.frame)
    }

    /// Convert to log returns `ln(p[t] / p[t-1])`
    ///
    /// The first timestamp has no predecessor and is dropped.
    pub fn log_returns(&self) -> Result<ReturnSeries> {
        let n = self.frame.height();
        if n < 2 {
            return Err(SeasonalityError::Configuration(
                "at least two prices are needed to compute returns".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(self.currencies.len() + 1);
        columns.push(self.frame.column(TIMESTAMP_COLUMN)?.slice(1, n - 1));
        for currency in &self.currencies {
            let prices = self.frame.column(currency)?.f64()?.cont_slice()?;
            let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
            columns.push(Series::new(currency, returns));
        }

        ReturnSeries::from_frame(DataFrame::new(columns)?)
    }

    /// Underlying frame
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        timestamps_of(&self.frame)
    }

    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    /// Prices for one currency
    pub fn column(&self, currency: &str) -> Option<&[f64]> {
        column_of(&self.frame, currency)
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

impl ReturnSeries {
    /// Create a return series; returns must be finite
    pub fn new(
        timestamps: Vec<NaiveDateTime>,
        currencies: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        Self::from_frame(build_frame(&timestamps, &currencies, columns, "return")?)
    }

    /// Wrap an existing frame whose first column is the timestamp index
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let (frame, currencies) = normalize_frame(frame, "return")?;
        Ok(Self { frame, currencies })
    }

    /// Load returns from CSV in the same layout as prices
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_frame(read_frame(path.as_ref())?)
    }

    /// Underlying frame
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Lazy view with [`HOUR_COLUMN`] and [`DATE_COLUMN`] derived from the timestamp
    pub fn with_calendar(&self) -> LazyFrame {
        self.frame.clone().lazy().with_columns([
            col(TIMESTAMP_COLUMN)
                .dt()
                .hour()
                .cast(DataType::UInt32)
                .alias(HOUR_COLUMN),
            col(TIMESTAMP_COLUMN).cast(DataType::Date).alias(DATE_COLUMN),
        ])
    }

    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        timestamps_of(&self.frame)
    }

    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    /// Returns for one currency
    pub fn column(&self, currency: &str) -> Option<&[f64]> {
        column_of(&self.frame, currency)
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

impl PartialEq for PriceSeries {
    fn eq(&self, other: &Self) -> bool {
        self.currencies == other.currencies && self.frame.frame_equal_missing(&other.frame)
    }
}

impl PartialEq for ReturnSeries {
    fn eq(&self, other: &Self) -> bool {
        self.currencies == other.currencies && self.frame.frame_equal_missing(&other.frame)
    }
}

/// Values of a float column, failing on nulls
pub(crate) fn float_values(series: &Series) -> Result<Vec<f64>> {
    optional_float_values(series)?
        .into_iter()
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| {
            SeasonalityError::Configuration(format!("column {} has missing values", series.name()))
        })
}

/// Values of a column cast to `Float64`, nulls kept
pub(crate) fn optional_float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    let values = cast.f64()?.into_iter().collect();
    Ok(values)
}

/// Values of an integer column such as [`HOUR_COLUMN`]
pub(crate) fn u32_values(series: &Series) -> Result<Vec<u32>> {
    let cast = series.cast(&DataType::UInt32)?;
    let values = cast.u32()?.into_iter().collect::<Option<Vec<u32>>>();
    values.ok_or_else(|| {
        SeasonalityError::Configuration(format!("column {} has missing values", series.name()))
    })
}

/// Values of a `Date` column such as [`DATE_COLUMN`]
pub(crate) fn date_values(series: &Series) -> Result<Vec<NaiveDate>> {
    let days = series.cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .map(|day| {
            day.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
                .ok_or_else(|| {
                    SeasonalityError::Parse(format!("invalid date in column {}", series.name()))
                })
        })
        .collect()
}

fn column_of<'a>(frame: &'a DataFrame, currency: &str) -> Option<&'a [f64]> {
    if currency == TIMESTAMP_COLUMN {
        return None;
    }
    frame.column(currency).ok()?.f64().ok()?.cont_slice().ok()
}

fn timestamps_of(frame: &DataFrame) -> Result<Vec<NaiveDateTime>> {
    frame
        .column(TIMESTAMP_COLUMN)?
        .datetime()?
        .into_iter()
        .map(|ms| {
            ms.and_then(NaiveDateTime::from_timestamp_millis).ok_or_else(|| {
                SeasonalityError::Parse("timestamp column holds an invalid value".to_string())
            })
        })
        .collect()
}

fn timestamp_series(timestamps: &[NaiveDateTime]) -> Result<Series> {
    let millis: Vec<i64> = timestamps.iter().map(|ts| ts.timestamp_millis()).collect();
    let series = Series::new(TIMESTAMP_COLUMN, millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(series)
}

fn build_frame(
    timestamps: &[NaiveDateTime],
    currencies: &[String],
    columns: Vec<Vec<f64>>,
    kind: &str,
) -> Result<DataFrame> {
    if currencies.len() != columns.len() {
        return Err(SeasonalityError::Configuration(format!(
            "{} series has {} currency labels but {} columns",
            kind,
            currencies.len(),
            columns.len()
        )));
    }
    for (currency, column) in currencies.iter().zip(&columns) {
        if column.len() != timestamps.len() {
            return Err(SeasonalityError::Configuration(format!(
                "{} column {} has {} values for {} timestamps",
                kind,
                currency,
                column.len(),
                timestamps.len()
            )));
        }
    }
    check_labels(currencies, kind)?;

    let mut series = Vec::with_capacity(columns.len() + 1);
    series.push(timestamp_series(timestamps)?);
    for (currency, column) in currencies.iter().zip(columns) {
        series.push(Series::new(currency, column));
    }
    Ok(DataFrame::new(series)?)
}

fn check_labels(currencies: &[String], kind: &str) -> Result<()> {
    if currencies.is_empty() {
        return Err(SeasonalityError::Configuration(format!(
            "{} series has no currency columns",
            kind
        )));
    }

    let reserved = [TIMESTAMP_COLUMN, HOUR_COLUMN, DATE_COLUMN];
    let mut seen = HashSet::new();
    for currency in currencies {
        if reserved.contains(&currency.as_str()) {
            return Err(SeasonalityError::Configuration(format!(
                "{} cannot be used as a currency label",
                currency
            )));
        }
        if !seen.insert(currency.as_str()) {
            return Err(SeasonalityError::Configuration(format!(
                "duplicate currency column {}",
                currency
            )));
        }
    }
    Ok(())
}

/// Bring a frame into canonical shape: millisecond timestamp index first,
/// then finite single-chunk `Float64` currency columns
fn normalize_frame(frame: DataFrame, kind: &str) -> Result<(DataFrame, Vec<String>)> {
    let names: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    match names.first() {
        Some(first) if first.trim().eq_ignore_ascii_case(TIMESTAMP_COLUMN) => {}
        _ => {
            return Err(SeasonalityError::Configuration(format!(
                "first column must be '{}'",
                TIMESTAMP_COLUMN
            )))
        }
    }

    let currencies: Vec<String> = names[1..].iter().map(|n| n.trim().to_string()).collect();
    check_labels(&currencies, kind)?;
    if frame.height() == 0 {
        return Err(SeasonalityError::Configuration(format!(
            "{} series has an empty index",
            kind
        )));
    }

    let timestamps = parse_timestamps(frame.column(&names[0])?)?;
    if let Some(w) = timestamps.windows(2).find(|w| w[1] < w[0]) {
        return Err(SeasonalityError::Configuration(format!(
            "timestamps must be non-decreasing, found {} after {}",
            w[1], w[0]
        )));
    }

    let mut columns = Vec::with_capacity(names.len());
    columns.push(timestamp_series(&timestamps)?);
    for (name, currency) in names[1..].iter().zip(&currencies) {
        let values = float_values(frame.column(name)?).map_err(|_| {
            SeasonalityError::Configuration(format!(
                "{} series for {} has missing values",
                kind, currency
            ))
        })?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SeasonalityError::Configuration(format!(
                "{} series for {} contains non-finite values",
                kind, currency
            )));
        }
        columns.push(Series::new(currency, values));
    }

    Ok((DataFrame::new(columns)?, currencies))
}

fn parse_timestamps(series: &Series) -> Result<Vec<NaiveDateTime>> {
    match series.dtype() {
        DataType::Utf8 => series
            .utf8()?
            .into_iter()
            .map(|raw| {
                let raw = raw.ok_or_else(|| {
                    SeasonalityError::Parse("timestamp column has missing values".to_string())
                })?;
                Ok(NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)?)
            })
            .collect(),
        dtype if dtype.is_temporal() => {
            let mut cast = series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
            cast.rename(TIMESTAMP_COLUMN);
            timestamps_of(&DataFrame::new(vec![cast])?)
        }
        other => Err(SeasonalityError::Configuration(format!(
            "timestamp column has unsupported type {}",
            other
        ))),
    }
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    let frame = CsvReader::new(file)
        .infer_schema(None)
        .has_header(true)
        .finish()?;
    Ok(frame)
}

fn write_frame(path: &Path, frame: &DataFrame) -> Result<()> {
    let formatted: Vec<String> = timestamps_of(frame)?
        .iter()
        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
        .collect();

    let mut out = frame.clone();
    out.replace(TIMESTAMP_COLUMN, Series::new(TIMESTAMP_COLUMN, formatted))?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).has_header(true).finish(&mut out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_log_returns_drop_first_row() {
        let prices = PriceSeries::new(
            vec![ts(2, 0), ts(2, 1), ts(2, 2)],
            vec!["EUR".to_string()],
            vec![vec![1.0, 1.1, 1.0]],
        )
        .unwrap();

        let returns = prices.log_returns().unwrap();
        assert_eq!(returns.len(), 2);
        assert_eq!(returns.timestamps().unwrap()[0], ts(2, 1));

        let column = returns.column("EUR").unwrap();
        assert_relative_eq!(column[0], 1.1_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(column[0] + column[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_prices() {
        let result = PriceSeries::new(
            vec![ts(2, 0), ts(2, 1)],
            vec!["EUR".to_string()],
            vec![vec![1.0, 0.0]],
        );
        assert!(matches!(result, Err(SeasonalityError::Configuration(_))));
    }

    #[test]
    fn test_rejects_decreasing_timestamps() {
        let result = ReturnSeries::new(
            vec![ts(2, 5), ts(2, 4)],
            vec!["EUR".to_string()],
            vec![vec![0.0, 0.0]],
        );
        assert!(matches!(result, Err(SeasonalityError::Configuration(_))));
    }

    #[test]
    fn test_rejects_ragged_and_duplicate_columns() {
        let ragged = ReturnSeries::new(
            vec![ts(2, 0), ts(2, 1)],
            vec!["EUR".to_string(), "GBP".to_string()],
            vec![vec![0.0, 0.0], vec![0.0]],
        );
        assert!(matches!(ragged, Err(SeasonalityError::Configuration(_))));

        let duplicate = ReturnSeries::new(
            vec![ts(2, 0)],
            vec!["EUR".to_string(), "EUR".to_string()],
            vec![vec![0.0], vec![0.0]],
        );
        assert!(matches!(duplicate, Err(SeasonalityError::Configuration(_))));
    }

    #[test]
    fn test_single_price_has_no_returns() {
        let prices =
            PriceSeries::new(vec![ts(2, 0)], vec!["EUR".to_string()], vec![vec![1.0]]).unwrap();
        assert!(prices.log_returns().is_err());
    }

    #[test]
    fn test_frame_holds_datetime_index_and_float_columns() {
        let returns = ReturnSeries::new(
            vec![ts(2, 0), ts(2, 1)],
            vec!["EUR".to_string()],
            vec![vec![0.1, -0.1]],
        )
        .unwrap();

        let frame = returns.frame();
        assert_eq!(frame.get_column_names(), vec![TIMESTAMP_COLUMN, "EUR"]);
        assert!(frame.column(TIMESTAMP_COLUMN).unwrap().dtype().is_temporal());
        assert_eq!(frame.column("EUR").unwrap().dtype(), &DataType::Float64);
        assert_eq!(returns.column(TIMESTAMP_COLUMN), None);
    }

    #[test]
    fn test_from_frame_casts_integer_prices() {
        let frame = DataFrame::new(vec![
            Series::new(TIMESTAMP_COLUMN, vec!["2024-01-02 00:00:00", "2024-01-02 01:00:00"]),
            Series::new("EUR", vec![1i64, 2]),
        ])
        .unwrap();

        let prices = PriceSeries::from_frame(frame).unwrap();
        assert_eq!(prices.column("EUR"), Some(&[1.0, 2.0][..]));
        assert_eq!(prices.timestamps().unwrap(), vec![ts(2, 0), ts(2, 1)]);
    }

    #[test]
    fn test_calendar_columns() {
        let returns = ReturnSeries::new(
            vec![ts(2, 23), ts(3, 0)],
            vec!["EUR".to_string()],
            vec![vec![0.1, -0.1]],
        )
        .unwrap();

        let frame = returns.with_calendar().collect().unwrap();
        assert_eq!(u32_values(frame.column(HOUR_COLUMN).unwrap()).unwrap(), vec![23, 0]);
        assert_eq!(
            date_values(frame.column(DATE_COLUMN).unwrap()).unwrap(),
            vec![ts(2, 0).date(), ts(3, 0).date()]
        );
    }
}
