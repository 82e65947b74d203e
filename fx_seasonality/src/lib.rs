//! # FX Seasonality
//!
//! Statistical analysis of intraday seasonality in FX returns.
//!
//! Hourly prices are turned into log returns, split into four trading
//! sessions relative to the currency's home market, aggregated per trading
//! day and tested for session effects.
//!
//! ## Features
//!
//! - Session partitioning with a configurable hour layout
//! - One-sample t-tests of mean session returns
//! - Welch t-tests of the Domestic session against each foreign session
//! - Welch (or classic) one-way F-tests of equal session means
//! - Significance annotation and plain-text rendering of result tables
//! - Synthetic price generation, hour-of-day profiles, GARCH(1,1) mean
//!   estimates and a trading-day bootstrap of session Sharpe ratios
//!
//! ## Sessions
//!
//! | Session  | Hours         | Nominal length |
//! |----------|---------------|----------------|
//! | Domestic | 8-14          | 7              |
//! | LDN-NY   | 15-18         | 4              |
//! | US       | 19-22         | 4              |
//! | Non US   | 0-7 and 23    | 7              |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fx_seasonality::{simulate_fx_prices, SeasonalityAnalysis, SimulationConfig};
//!
//! # fn main() -> fx_seasonality::Result<()> {
//! let prices = simulate_fx_prices(&SimulationConfig::default())?;
//!
//! let analysis = SeasonalityAnalysis::default();
//! let result = analysis.analyze(&prices)?;
//!
//! println!("{}", result.styled_mean_by_session);
//! println!("{}", result.styled_two_sample_ttest);
//! println!("{}", result.styled_simultaneous_test);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod bootstrap;
pub mod config;
pub mod data;
pub mod error;
pub mod garch;
pub mod hourly;
pub mod hypothesis;
pub mod presenter;
pub mod sessions;
pub mod simulate;
pub mod tables;

// Re-export commonly used types
pub use crate::analysis::{AnalysisResult, SeasonalityAnalysis};
pub use crate::bootstrap::{bootstrap_sharpe, BootstrapReport};
pub use crate::config::{
    AnalysisConfig, BootstrapConfig, GarchConfig, SimulationConfig, ToolkitConfig,
};
pub use crate::data::{PriceSeries, ReturnSeries};
pub use crate::error::{Result, SeasonalityError};
pub use crate::garch::garch_session_means;
pub use crate::hourly::{cumulative_mean_by_hour, sharpe_by_hour};
pub use crate::hypothesis::{one_sample_test, simultaneous_test, two_sample_test, MultiGroupMethod};
pub use crate::presenter::{annotate, AnnotatedTable, Significance};
pub use crate::sessions::{partition, Session, SessionLayout, SessionLengths, SessionMap};
pub use crate::simulate::simulate_fx_prices;
pub use crate::tables::{ResultTable, TestOutcome};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
