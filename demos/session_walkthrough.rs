// Walk through the session analysis on a few years of synthetic prices
use chrono::NaiveDate;
use fx_seasonality::{
    bootstrap_sharpe, garch_session_means, partition, simulate_fx_prices, BootstrapConfig,
    GarchConfig, SeasonalityAnalysis, SimulationConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let simulation = SimulationConfig {
        n_currencies: 5,
        start: NaiveDate::from_ymd_opt(2021, 1, 1).ok_or("invalid start date")?,
        end: NaiveDate::from_ymd_opt(2023, 12, 31).ok_or("invalid end date")?,
        ..SimulationConfig::default()
    };
    let prices = simulate_fx_prices(&simulation)?;
    println!(
        "Simulated {} hourly prices for {} currencies\n",
        prices.len(),
        prices.currencies().len()
    );

    // 1. The three session tests
    let result = SeasonalityAnalysis::default().analyze(&prices)?;
    for (styled, _) in result.outcomes() {
        println!("{}", styled);
    }

    // 2. Session means once volatility clustering is modelled
    let sessions = partition(&prices.log_returns()?, &Default::default())?;
    let garch = garch_session_means(&sessions, &GarchConfig::default())?;
    println!(
        "{}",
        fx_seasonality::annotate("GARCH(1,1) session means", &garch, 0.05)
    );

    // 3. How often a resampled session Sharpe ratio comes out negative
    let report = bootstrap_sharpe(
        &sessions,
        &BootstrapConfig {
            iterations: 200,
            sample_size: 500,
            seed: Some(7),
        },
    )?;
    println!("Share of negative Sharpe ratios");
    print!("{}", report.negative_share());

    Ok(())
}
