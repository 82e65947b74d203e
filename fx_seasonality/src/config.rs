//! Configuration for analyses, simulation, GARCH fits and the bootstrap
//!
//! Every section has a `Default` that reproduces the standard study, and
//! every field may be omitted from a JSON config file.

use crate::error::{Result, SeasonalityError};
use crate::hypothesis::MultiGroupMethod;
use crate::presenter::DEFAULT_SIGNIFICANCE;
use crate::sessions::{SessionLayout, SessionLengths};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings of the core session analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Hour-of-day sets per session
    pub layout: SessionLayout,
    /// Nominal session lengths used for normalization
    pub lengths: SessionLengths,
    /// Significance level for annotation
    pub significance: f64,
    /// F-test flavour of the simultaneous test
    pub multi_group: MultiGroupMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            layout: SessionLayout::default(),
            lengths: SessionLengths::default(),
            significance: DEFAULT_SIGNIFICANCE,
            multi_group: MultiGroupMethod::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(SeasonalityError::Configuration(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        Ok(())
    }
}

/// Settings of the synthetic price generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub n_currencies: usize,
    /// First calendar day (inclusive); weekends are skipped
    pub start: NaiveDate,
    /// Last calendar day (inclusive)
    pub end: NaiveDate,
    /// Lower bound of the daily volatility draw
    pub min_daily_vol: f64,
    /// Upper bound of the daily volatility draw
    pub max_daily_vol: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_currencies: 20,
            start: NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid calendar date"),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid calendar date"),
            min_daily_vol: 0.002,
            max_daily_vol: 0.01,
            seed: 1,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_currencies == 0 {
            return Err(SeasonalityError::Configuration(
                "n_currencies must be at least 1".to_string(),
            ));
        }
        if self.end < self.start {
            return Err(SeasonalityError::Configuration(format!(
                "simulation end {} is before start {}",
                self.end, self.start
            )));
        }
        if !(self.min_daily_vol > 0.0 && self.min_daily_vol < self.max_daily_vol) {
            return Err(SeasonalityError::Configuration(format!(
                "daily volatility range [{}, {}) is invalid",
                self.min_daily_vol, self.max_daily_vol
            )));
        }
        Ok(())
    }
}

/// Settings of the constant-mean GARCH(1,1) fits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarchConfig {
    /// Returns are multiplied by this factor before fitting
    pub scale: f64,
    /// Iteration cap of the likelihood optimizer
    pub max_iterations: usize,
    /// Fewest common trading days a currency needs
    pub min_observations: usize,
}

impl Default for GarchConfig {
    fn default() -> Self {
        Self {
            scale: 1000.0,
            max_iterations: 5000,
            min_observations: 10,
        }
    }
}

/// Settings of the trading-day bootstrap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub iterations: usize,
    /// Trading days drawn per session and iteration
    pub sample_size: usize,
    /// Fixed seed for reproducible draws; entropy when absent
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            sample_size: 1000,
            seed: None,
        }
    }
}

/// All configuration sections, as loaded from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub analysis: AnalysisConfig,
    pub simulation: SimulationConfig,
    pub garch: GarchConfig,
    pub bootstrap: BootstrapConfig,
}

impl ToolkitConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ToolkitConfig = serde_json::from_str(json)?;
        config.analysis.validate()?;
        config.simulation.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::Session;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = ToolkitConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ToolkitConfig::default());
        assert_eq!(config.analysis.significance, 0.05);
        assert_eq!(config.simulation.n_currencies, 20);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "analysis": {
                "lengths": {"Domestic": 6, "LDN-NY": 4, "US": 4, "Non US": 8},
                "multi_group": "classic"
            },
            "bootstrap": {"iterations": 50, "seed": 7}
        }"#;
        let config = ToolkitConfig::from_json_str(json).unwrap();

        assert_eq!(config.analysis.lengths.hours(Session::Domestic), 6.0);
        assert_eq!(config.analysis.lengths.hours(Session::NonUs), 8.0);
        assert_eq!(config.analysis.multi_group, MultiGroupMethod::Classic);
        assert_eq!(config.bootstrap.iterations, 50);
        assert_eq!(config.bootstrap.seed, Some(7));
        assert_eq!(config.bootstrap.sample_size, 1000);
    }

    #[test]
    fn test_invalid_layout_is_rejected() {
        let json = r#"{"analysis": {"layout": {"Domestic": [8], "LDN-NY": [9], "US": [10], "Non US": [11]}}}"#;
        assert!(ToolkitConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_invalid_significance_is_rejected() {
        let json = r#"{"analysis": {"significance": 1.5}}"#;
        assert!(matches!(
            ToolkitConfig::from_json_str(json),
            Err(SeasonalityError::Configuration(_))
        ));
    }
}
