//! Session seasonality analysis: prices in, annotated test tables out

use crate::config::AnalysisConfig;
use crate::data::{PriceSeries, ReturnSeries};
use crate::error::Result;
use crate::hypothesis::{one_sample_test, simultaneous_test, two_sample_test};
use crate::presenter::{annotate, AnnotatedTable};
use crate::sessions::{partition, SessionMap};
use crate::tables::TestOutcome;
use serde::Serialize;
use tracing::info;

/// Raw and annotated outcomes of the three session tests
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Partitioned sessions the tests ran on
    pub sessions: SessionMap,
    /// Mean daily return per session against zero
    pub mean_by_session: TestOutcome,
    /// Domestic vs foreign sessions, Welch t
    pub two_sample_ttest: TestOutcome,
    /// All sessions jointly, F-test
    pub simultaneous_test: TestOutcome,
    pub styled_mean_by_session: AnnotatedTable,
    pub styled_two_sample_ttest: AnnotatedTable,
    pub styled_simultaneous_test: AnnotatedTable,
}

/// Serializable view of an [`AnalysisResult`] without the session data
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary<'a> {
    pub significance: f64,
    pub mean_by_session: &'a TestOutcome,
    pub two_sample_ttest: &'a TestOutcome,
    pub simultaneous_test: &'a TestOutcome,
}

impl AnalysisResult {
    /// The three outcomes with their display titles, in presentation order
    pub fn outcomes(&self) -> [(&AnnotatedTable, &TestOutcome); 3] {
        [
            (&self.styled_mean_by_session, &self.mean_by_session),
            (&self.styled_two_sample_ttest, &self.two_sample_ttest),
            (&self.styled_simultaneous_test, &self.simultaneous_test),
        ]
    }

    pub fn summary(&self) -> AnalysisSummary<'_> {
        AnalysisSummary {
            significance: self.styled_mean_by_session.threshold(),
            mean_by_session: &self.mean_by_session,
            two_sample_ttest: &self.two_sample_ttest,
            simultaneous_test: &self.simultaneous_test,
        }
    }

    /// JSON export of the raw tables
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }
}

/// Entry point composing partitioning, testing and annotation
#[derive(Debug, Clone, Default)]
pub struct SeasonalityAnalysis {
    config: AnalysisConfig,
}

impl SeasonalityAnalysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze hourly prices
    pub fn analyze(&self, prices: &PriceSeries) -> Result<AnalysisResult> {
        info!(
            currencies = prices.currencies().len(),
            observations = prices.len(),
            "converting prices to log returns"
        );
        let returns = prices.log_returns()?;
        self.analyze_returns(&returns)
    }

    /// Analyze hourly log returns
    pub fn analyze_returns(&self, returns: &ReturnSeries) -> Result<AnalysisResult> {
        let sessions = partition(returns, &self.config.layout)?;
        self.analyze_sessions(sessions)
    }

    /// Run the three tests on an already partitioned session map
    pub fn analyze_sessions(&self, sessions: SessionMap) -> Result<AnalysisResult> {
        let config = &self.config;

        let mean_by_session = one_sample_test(&sessions)?;
        let two_sample_ttest = two_sample_test(&sessions, &config.lengths)?;
        let simultaneous = simultaneous_test(&sessions, &config.lengths, config.multi_group)?;

        for outcome in [&mean_by_session, &two_sample_ttest, &simultaneous] {
            outcome.check_alignment()?;
        }

        let threshold = config.significance;
        let result = AnalysisResult {
            styled_mean_by_session: annotate("Mean return by session", &mean_by_session, threshold),
            styled_two_sample_ttest: annotate(
                "Domestic vs foreign sessions (Welch t)",
                &two_sample_ttest,
                threshold,
            ),
            styled_simultaneous_test: annotate(
                "Equality of session means (F)",
                &simultaneous,
                threshold,
            ),
            sessions,
            mean_by_session,
            two_sample_ttest,
            simultaneous_test: simultaneous,
        };

        info!(
            significant_means = result.styled_mean_by_session.significant_count(),
            significant_comparisons = result.styled_two_sample_ttest.significant_count(),
            significant_joint = result.styled_simultaneous_test.significant_count(),
            "session analysis complete"
        );

        Ok(result)
    }
}
