use chrono::{Duration, NaiveDate, NaiveDateTime};
use fx_seasonality::{ReturnSeries, Session, SessionLayout};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

pub const CURRENCIES: [&str; 2] = ["EUR", "JPY"];

pub fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

pub fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).unwrap()
}

/// Hourly returns with a constant per-hour return in the Domestic hours,
/// zero elsewhere, plus small Gaussian noise in every hour
pub fn domestic_drift_returns(days: i64, domestic_return: f64, seed: u64) -> ReturnSeries {
    let layout = SessionLayout::default();
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1e-5).unwrap();

    let mut timestamps = Vec::new();
    let mut columns = vec![Vec::new(); CURRENCIES.len()];
    for d in 0..days {
        for hour in 0..24 {
            timestamps.push(at(day(d), hour));
            let base = if layout.session_of(hour) == Some(Session::Domestic) {
                domestic_return
            } else {
                0.0
            };
            for column in columns.iter_mut() {
                column.push(base + noise.sample(&mut rng));
            }
        }
    }

    ReturnSeries::new(
        timestamps,
        CURRENCIES.iter().map(|c| c.to_string()).collect(),
        columns,
    )
    .unwrap()
}
