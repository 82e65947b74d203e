//! Session hypothesis tests
//!
//! Three independent tests over a partitioned [`SessionMap`]:
//!
//! - [`one_sample_test`]: is each session's mean daily return different from zero?
//! - [`two_sample_test`]: does the Domestic session differ from each foreign session?
//! - [`simultaneous_test`]: are all four session means equal?
//!
//! The two comparative tests divide summed session returns by the nominal
//! session length first, so that sessions of different duration are compared
//! as per-hour rates. Every test aborts on the first currency/session that
//! cannot be tested; no cell is ever filled with a placeholder.

use crate::error::{Result, SeasonalityError};
use crate::sessions::{Session, SessionLengths, SessionMap};
use crate::tables::{TestCell, TestOutcome, JOINT_COLUMN};
use fx_stats::{MathError, SampleSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Flavour of the multi-group F-test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiGroupMethod {
    /// Welch's heteroscedastic one-way ANOVA
    #[default]
    Welch,
    /// Pooled-variance one-way ANOVA
    Classic,
}

/// Mean daily return per currency and session, tested against zero
///
/// Columns are all four sessions in canonical order. Means are in raw
/// session-aggregate units (no length normalization).
pub fn one_sample_test(sessions: &SessionMap) -> Result<TestOutcome> {
    require_all(sessions, &Session::ALL)?;
    info!(currencies = sessions.currencies().len(), "running one-sample t-tests");

    let mut cells = Vec::with_capacity(sessions.currencies().len() * Session::ALL.len());
    for currency in sessions.currencies() {
        for session in Session::ALL {
            let sample = session_sample(sessions, session, currency)?;
            let result = fx_stats::one_sample_t_test(sample, 0.0)
                .map_err(|err| with_context(err, currency, session.name()))?;
            let mean = SampleSummary::from_slice(sample)
                .map_err(|err| with_context(err, currency, session.name()))?
                .mean;

            debug!(%currency, %session, mean, p_value = result.p_value, "one-sample cell");
            cells.push(TestCell {
                statistic: mean,
                p_value: result.p_value,
            });
        }
    }

    TestOutcome::from_cells(
        sessions.currencies().to_vec(),
        column_labels(&Session::ALL),
        cells,
    )
}

/// Welch t-test of the Domestic session against each foreign session
///
/// Columns are "LDN-NY", "US" and "Non US"; Domestic is the reference group.
/// Positive statistics mean the Domestic per-hour return is higher.
pub fn two_sample_test(sessions: &SessionMap, lengths: &SessionLengths) -> Result<TestOutcome> {
    require_all(sessions, &Session::ALL)?;
    info!(currencies = sessions.currencies().len(), "running two-sample Welch t-tests");

    let mut cells = Vec::with_capacity(sessions.currencies().len() * Session::FOREIGN.len());
    for currency in sessions.currencies() {
        let domestic = lengths.normalize(
            Session::Domestic,
            session_sample(sessions, Session::Domestic, currency)?,
        );

        for session in Session::FOREIGN {
            let comparison = lengths.normalize(session, session_sample(sessions, session, currency)?);
            let result = fx_stats::welch_t_test(&domestic, &comparison).map_err(|err| {
                with_context(err, currency, &format!("{} vs {}", Session::Domestic, session))
            })?;

            debug!(%currency, %session, t = result.statistic, p_value = result.p_value, "two-sample cell");
            cells.push(TestCell {
                statistic: result.statistic,
                p_value: result.p_value,
            });
        }
    }

    TestOutcome::from_cells(
        sessions.currencies().to_vec(),
        column_labels(&Session::FOREIGN),
        cells,
    )
}

/// One-way F-test of equal per-hour means across all four sessions
///
/// Produces a single column ([`JOINT_COLUMN`]) per currency.
pub fn simultaneous_test(
    sessions: &SessionMap,
    lengths: &SessionLengths,
    method: MultiGroupMethod,
) -> Result<TestOutcome> {
    require_all(sessions, &Session::ALL)?;
    info!(currencies = sessions.currencies().len(), ?method, "running multi-group F-tests");

    let mut cells = Vec::with_capacity(sessions.currencies().len());
    for currency in sessions.currencies() {
        let mut groups = Vec::with_capacity(Session::ALL.len());
        for session in Session::ALL {
            let normalized = lengths.normalize(session, session_sample(sessions, session, currency)?);
            if method == MultiGroupMethod::Welch
                && SampleSummary::from_slice(&normalized)
                    .map_err(|err| with_context(err, currency, session.name()))?
                    .is_degenerate()
            {
                return Err(SeasonalityError::DegenerateSample {
                    currency: currency.clone(),
                    session: session.name().to_string(),
                });
            }
            groups.push(normalized);
        }

        let views: Vec<&[f64]> = groups.iter().map(Vec::as_slice).collect();
        let result = match method {
            MultiGroupMethod::Welch => fx_stats::welch_anova(&views),
            MultiGroupMethod::Classic => fx_stats::classic_anova(&views),
        }
        .map_err(|err| with_context(err, currency, JOINT_COLUMN))?;

        debug!(%currency, f = result.statistic, p_value = result.p_value, "multi-group cell");
        cells.push(TestCell {
            statistic: result.statistic,
            p_value: result.p_value,
        });
    }

    TestOutcome::from_cells(
        sessions.currencies().to_vec(),
        vec![JOINT_COLUMN.to_string()],
        cells,
    )
}

fn require_all(sessions: &SessionMap, required: &[Session]) -> Result<()> {
    for &session in required {
        sessions.require(session)?;
    }
    Ok(())
}

fn column_labels(sessions: &[Session]) -> Vec<String> {
    sessions.iter().map(|s| s.name().to_string()).collect()
}

/// Daily returns of one currency in one session, with at least two observations
fn session_sample<'a>(sessions: &'a SessionMap, session: Session, currency: &str) -> Result<&'a [f64]> {
    let values = sessions
        .require(session)?
        .column(currency)
        .ok_or_else(|| {
            SeasonalityError::Configuration(format!(
                "session {} has no column for {}",
                session, currency
            ))
        })?;

    if values.len() < 2 {
        return Err(SeasonalityError::InsufficientData {
            currency: currency.to_string(),
            session: session.name().to_string(),
            observations: values.len(),
        });
    }

    Ok(values)
}

fn with_context(err: MathError, currency: &str, session: &str) -> SeasonalityError {
    match err {
        MathError::ZeroVariance(_) => SeasonalityError::DegenerateSample {
            currency: currency.to_string(),
            session: session.to_string(),
        },
        other => SeasonalityError::Math(other),
    }
}
