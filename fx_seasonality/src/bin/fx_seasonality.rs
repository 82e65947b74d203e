use anyhow::Context;
use clap::{Parser, Subcommand};
use fx_seasonality::{
    bootstrap_sharpe, cumulative_mean_by_hour, garch_session_means, partition, sharpe_by_hour,
    simulate_fx_prices, PriceSeries, SeasonalityAnalysis, ToolkitConfig,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fx-seasonality")]
#[command(about = "Intraday session seasonality analysis for FX returns", long_about = None)]
struct Cli {
    /// JSON config file; defaults apply to every omitted field
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic hourly prices
    Simulate {
        /// Output CSV file path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run the three session tests
    Analyze {
        /// Hourly price CSV; simulated prices are used when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Write the raw tables as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write every statistic and p-value table as CSV into this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Estimate session means with constant-mean GARCH(1,1) fits
    Garch {
        /// Hourly price CSV; simulated prices are used when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Bootstrap session Sharpe ratios over trading days
    Bootstrap {
        /// Hourly price CSV; simulated prices are used when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Write the negative Sharpe share table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show cumulative mean return and Sharpe ratio by hour of day
    Hourly {
        /// Hourly price CSV; simulated prices are used when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ToolkitConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ToolkitConfig::default(),
    };

    match cli.command {
        Commands::Simulate { output } => {
            let prices = simulate_fx_prices(&config.simulation)?;
            prices
                .to_csv(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(path = %output.display(), rows = prices.len(), "wrote simulated prices");
        }
        Commands::Analyze {
            input,
            json,
            output_dir,
        } => {
            let prices = load_prices(input.as_deref(), &config)?;
            let analysis = SeasonalityAnalysis::new(config.analysis.clone())?;
            let result = analysis.analyze(&prices)?;

            for (styled, _) in result.outcomes() {
                println!("{}", styled);
            }

            if let Some(path) = json {
                std::fs::write(&path, result.to_json()?)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), "wrote JSON summary");
            }

            if let Some(dir) = output_dir {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                let named = [
                    ("mean_by_session", &result.mean_by_session),
                    ("two_sample_ttest", &result.two_sample_ttest),
                    ("simultaneous_test", &result.simultaneous_test),
                ];
                for (name, outcome) in named {
                    outcome
                        .statistic()
                        .to_csv(dir.join(format!("{}_statistic.csv", name)))?;
                    outcome
                        .p_value()
                        .to_csv(dir.join(format!("{}_p_value.csv", name)))?;
                }
                tracing::info!(dir = %dir.display(), "wrote result tables");
            }
        }
        Commands::Garch { input } => {
            let prices = load_prices(input.as_deref(), &config)?;
            let sessions = partition(&prices.log_returns()?, &config.analysis.layout)?;
            let outcome = garch_session_means(&sessions, &config.garch)?;
            let styled = fx_seasonality::annotate(
                "GARCH(1,1) session means",
                &outcome,
                config.analysis.significance,
            );
            println!("{}", styled);
        }
        Commands::Bootstrap { input, output } => {
            let prices = load_prices(input.as_deref(), &config)?;
            let sessions = partition(&prices.log_returns()?, &config.analysis.layout)?;
            let report = bootstrap_sharpe(&sessions, &config.bootstrap)?;

            println!("Share of negative Sharpe ratios over {} draws", report.iterations());
            print!("{}", report.negative_share());

            for q in [0.05, 0.5, 0.95] {
                println!("Sharpe ratio quantile {}", q);
                print!("{}", report.quantile_table(q)?);
            }

            if let Some(path) = output {
                report.negative_share().to_csv(&path)?;
                tracing::info!(path = %path.display(), "wrote negative Sharpe share");
            }
        }
        Commands::Hourly { input } => {
            let prices = load_prices(input.as_deref(), &config)?;
            let returns = prices.log_returns()?;

            println!("Cumulative mean return by hour");
            print!("{}", cumulative_mean_by_hour(&returns)?);
            println!("Sharpe ratio by hour");
            print!("{}", sharpe_by_hour(&returns)?);
        }
    }

    Ok(())
}

fn load_prices(input: Option<&Path>, config: &ToolkitConfig) -> anyhow::Result<PriceSeries> {
    match input {
        Some(path) => PriceSeries::from_csv(path)
            .with_context(|| format!("failed to read prices from {}", path.display())),
        None => {
            tracing::info!("no input given, simulating prices");
            Ok(simulate_fx_prices(&config.simulation)?)
        }
    }
}
