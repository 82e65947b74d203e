//! Synthetic hourly FX prices
//!
//! Prices follow a geometric Brownian motion whose drift depends on the hour
//! of day, quoted as CCYUSD so a positive return means the currency
//! appreciates against USD:
//!
//! - 07:00-17:59 negative drift (`-sigma / 4` per hour)
//! - 18:00-21:59 positive drift, scaled so the day nets out to zero
//! - 22:00-06:59 no drift
//!
//! The price at hour `h` is the close of the previous hour, so the return
//! attributed to `h` is the move from `h` to `h + 1`. Hour 23 is simulated
//! but not emitted.

use crate::config::SimulationConfig;
use crate::data::PriceSeries;
use crate::error::{Result, SeasonalityError};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};
use tracing::info;

/// Last hour of the day present in generated price data
pub const LAST_EMITTED_HOUR: u32 = 22;

/// Hours of negative drift per day
const NEGATIVE_HOURS: f64 = 11.0;
/// Hours of positive drift per day
const POSITIVE_HOURS: f64 = 4.0;

/// Mean hourly log return before the Ito correction
pub fn hourly_drift(hour: u32, hourly_vol: f64) -> f64 {
    let negative = -hourly_vol / 4.0;
    match hour {
        7..=17 => negative,
        18..=21 => -negative * NEGATIVE_HOURS / POSITIVE_HOURS,
        _ => 0.0,
    }
}

/// Weekdays between two dates, inclusive
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Seeded generator of synthetic FX price paths
pub struct SyntheticFxGenerator {
    rng: StdRng,
}

impl SyntheticFxGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate hourly prices for `config.n_currencies` currencies named `ccy_0..`
    pub fn generate(&mut self, config: &SimulationConfig) -> Result<PriceSeries> {
        config.validate()?;

        let dates = business_days(config.start, config.end);
        if dates.is_empty() {
            return Err(SeasonalityError::Configuration(format!(
                "no business days between {} and {}",
                config.start, config.end
            )));
        }

        let vol_draw = Uniform::new(config.min_daily_vol, config.max_daily_vol);
        let hourly_vols: Vec<f64> = (0..config.n_currencies)
            .map(|_| vol_draw.sample(&mut self.rng) / 24.0_f64.sqrt())
            .collect();

        // One shock distribution per currency and drift regime
        let mut shocks = Vec::with_capacity(config.n_currencies);
        for &sigma in &hourly_vols {
            let mut by_hour = Vec::with_capacity(24);
            for hour in 0..24 {
                let mean = hourly_drift(hour, sigma) - sigma.powi(2) / 2.0;
                let normal = Normal::new(mean, sigma).map_err(|e| {
                    SeasonalityError::Configuration(format!("invalid return distribution: {}", e))
                })?;
                by_hour.push(normal);
            }
            shocks.push(by_hour);
        }

        let capacity = dates.len() * (LAST_EMITTED_HOUR as usize + 1);
        let mut timestamps: Vec<NaiveDateTime> = Vec::with_capacity(capacity);
        let mut columns = vec![Vec::with_capacity(capacity); config.n_currencies];
        let mut cumulative = vec![0.0_f64; config.n_currencies];

        for date in &dates {
            for hour in 0..24u32 {
                let Some(ts) = date.and_hms_opt(hour, 0, 0) else {
                    continue;
                };
                if hour <= LAST_EMITTED_HOUR {
                    timestamps.push(ts);
                    for (column, log_price) in columns.iter_mut().zip(&cumulative) {
                        column.push(log_price.exp());
                    }
                }
                for (log_price, by_hour) in cumulative.iter_mut().zip(&shocks) {
                    *log_price += by_hour[hour as usize].sample(&mut self.rng);
                }
            }
        }

        info!(
            currencies = config.n_currencies,
            trading_days = dates.len(),
            observations = timestamps.len(),
            "simulated hourly FX prices"
        );

        let currencies = (0..config.n_currencies).map(|i| format!("ccy_{}", i)).collect();
        PriceSeries::new(timestamps, currencies, columns)
    }
}

/// Generate prices with the seed carried by the config
pub fn simulate_fx_prices(config: &SimulationConfig) -> Result<PriceSeries> {
    SyntheticFxGenerator::new(config.seed).generate(config)
}
