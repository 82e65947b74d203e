//! Trading sessions and the session partitioner
//!
//! A trading day is split into four sessions by hour of day. Partitioning a
//! [`ReturnSeries`] sums each day's returns within every session, giving one
//! row per trading day and session.
//!
//! | Session  | Hours        | Nominal length |
//! |----------|--------------|----------------|
//! | Domestic | 08-14        | 7              |
//! | LDN-NY   | 15-18        | 4              |
//! | US       | 19-22        | 4              |
//! | Non US   | 00-07, 23    | 7              |

use crate::data::{date_values, float_values, ReturnSeries, DATE_COLUMN, HOUR_COLUMN};
use crate::error::{Result, SeasonalityError};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Hours in a day
pub const HOURS_PER_DAY: u32 = 24;

/// Named partition of the trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Session {
    #[serde(rename = "Domestic")]
    Domestic,
    #[serde(rename = "LDN-NY")]
    LdnNy,
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "Non US")]
    NonUs,
}

impl Session {
    /// All sessions in canonical order
    pub const ALL: [Session; 4] = [
        Session::Domestic,
        Session::LdnNy,
        Session::Us,
        Session::NonUs,
    ];

    /// Sessions compared against the Domestic reference group
    pub const FOREIGN: [Session; 3] = [Session::LdnNy, Session::Us, Session::NonUs];

    /// Display name used as a table column label
    pub fn name(&self) -> &'static str {
        match self {
            Session::Domestic => "Domestic",
            Session::LdnNy => "LDN-NY",
            Session::Us => "US",
            Session::NonUs => "Non US",
        }
    }

    /// Position in [`Session::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Session::Domestic => 0,
            Session::LdnNy => 1,
            Session::Us => 2,
            Session::NonUs => 3,
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Session {
    type Err = SeasonalityError;

    fn from_str(s: &str) -> Result<Self> {
        Session::ALL
            .into_iter()
            .find(|session| session.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SeasonalityError::Configuration(format!("unknown session '{}'", s)))
    }
}

/// Hour-of-day sets for every session
///
/// A valid layout assigns each of the 24 hours to exactly one session and
/// leaves no session empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Session, Vec<u32>>",
    into = "BTreeMap<Session, Vec<u32>>"
)]
pub struct SessionLayout {
    hours: BTreeMap<Session, Vec<u32>>,
}

impl SessionLayout {
    /// Build and validate a layout
    pub fn new(hours: BTreeMap<Session, Vec<u32>>) -> Result<Self> {
        let mut owner: [Option<Session>; HOURS_PER_DAY as usize] = [None; HOURS_PER_DAY as usize];

        for session in Session::ALL {
            let session_hours = hours.get(&session).ok_or_else(|| {
                SeasonalityError::Configuration(format!("session layout is missing {}", session))
            })?;
            if session_hours.is_empty() {
                return Err(SeasonalityError::Configuration(format!(
                    "session {} has no hours",
                    session
                )));
            }

            for &hour in session_hours {
                if hour >= HOURS_PER_DAY {
                    return Err(SeasonalityError::Configuration(format!(
                        "hour {} of session {} is outside 0-23",
                        hour, session
                    )));
                }
                if let Some(other) = owner[hour as usize].replace(session) {
                    return Err(SeasonalityError::Configuration(format!(
                        "hour {} is assigned to both {} and {}",
                        hour, other, session
                    )));
                }
            }
        }

        if let Some(hour) = owner.iter().position(Option::is_none) {
            return Err(SeasonalityError::Configuration(format!(
                "hour {} is not assigned to any session",
                hour
            )));
        }

        let hours = hours
            .into_iter()
            .map(|(session, mut h)| {
                h.sort_unstable();
                (session, h)
            })
            .collect();

        Ok(Self { hours })
    }

    /// Hours of one session, ascending
    pub fn hours(&self, session: Session) -> &[u32] {
        self.hours.get(&session).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Session owning an hour of day
    pub fn session_of(&self, hour: u32) -> Option<Session> {
        self.hours
            .iter()
            .find(|(_, hours)| hours.contains(&hour))
            .map(|(session, _)| *session)
    }
}

impl Default for SessionLayout {
    fn default() -> Self {
        let mut non_us: Vec<u32> = (0..=7).collect();
        non_us.push(23);

        Self {
            hours: BTreeMap::from([
                (Session::Domestic, (8..=14).collect()),
                (Session::LdnNy, (15..=18).collect()),
                (Session::Us, (19..=22).collect()),
                (Session::NonUs, non_us),
            ]),
        }
    }
}

impl TryFrom<BTreeMap<Session, Vec<u32>>> for SessionLayout {
    type Error = SeasonalityError;

    fn try_from(hours: BTreeMap<Session, Vec<u32>>) -> Result<Self> {
        Self::new(hours)
    }
}

impl From<SessionLayout> for BTreeMap<Session, Vec<u32>> {
    fn from(layout: SessionLayout) -> Self {
        layout.hours
    }
}

/// Nominal session lengths in hours, used to normalize summed returns
///
/// Lengths are configuration, independent of how many hours the layout
/// assigns to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Session, f64>", into = "BTreeMap<Session, f64>")]
pub struct SessionLengths {
    lengths: [f64; 4],
}

impl SessionLengths {
    /// Build and validate a length table covering every session
    pub fn new(lengths: BTreeMap<Session, f64>) -> Result<Self> {
        let mut validated = [0.0; 4];
        for session in Session::ALL {
            match lengths.get(&session) {
                Some(&hours) if hours.is_finite() && hours > 0.0 => {
                    validated[session.index()] = hours;
                }
                Some(&hours) => {
                    return Err(SeasonalityError::Configuration(format!(
                        "length of session {} must be positive, got {}",
                        session, hours
                    )))
                }
                None => {
                    return Err(SeasonalityError::Configuration(format!(
                        "session length table is missing {}",
                        session
                    )))
                }
            }
        }

        Ok(Self {
            lengths: validated,
        })
    }

    /// Nominal length of a session in hours
    pub fn hours(&self, session: Session) -> f64 {
        self.lengths[session.index()]
    }

    /// Divide summed session returns by the session length
    pub fn normalize(&self, session: Session, values: &[f64]) -> Vec<f64> {
        let hours = self.hours(session);
        values.iter().map(|v| v / hours).collect()
    }
}

impl Default for SessionLengths {
    fn default() -> Self {
        // Domestic, LDN-NY, US, Non US
        Self {
            lengths: [7.0, 4.0, 4.0, 7.0],
        }
    }
}

impl TryFrom<BTreeMap<Session, f64>> for SessionLengths {
    type Error = SeasonalityError;

    fn try_from(lengths: BTreeMap<Session, f64>) -> Result<Self> {
        Self::new(lengths)
    }
}

impl From<SessionLengths> for BTreeMap<Session, f64> {
    fn from(lengths: SessionLengths) -> Self {
        Session::ALL
            .into_iter()
            .map(|session| (session, lengths.hours(session)))
            .collect()
    }
}

/// Daily aggregated returns of one session
///
/// One row per calendar date on which the session had at least one
/// observation; dates missing from the session are simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSeries {
    session: Session,
    dates: Vec<NaiveDate>,
    currencies: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SessionSeries {
    /// Create a session series with one column per currency, each with one value per date
    pub fn new(
        session: Session,
        dates: Vec<NaiveDate>,
        currencies: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if currencies.len() != columns.len() {
            return Err(SeasonalityError::Configuration(format!(
                "session {} has {} currency labels but {} columns",
                session,
                currencies.len(),
                columns.len()
            )));
        }
        if let Some((currency, _)) = currencies
            .iter()
            .zip(&columns)
            .find(|(_, column)| column.len() != dates.len())
        {
            return Err(SeasonalityError::Configuration(format!(
                "session {} column {} does not match its {} dates",
                session,
                currency,
                dates.len()
            )));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SeasonalityError::Configuration(format!(
                "session {} dates must be strictly increasing",
                session
            )));
        }

        Ok(Self {
            session,
            dates,
            currencies,
            columns,
        })
    }

    pub fn session(&self) -> Session {
        self.session
    }

    /// Trading days present in this session
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    /// Daily returns of one currency
    pub fn column(&self, currency: &str) -> Option<&[f64]> {
        self.currencies
            .iter()
            .position(|c| c == currency)
            .map(|i| self.columns[i].as_slice())
    }

    /// Return of one currency on one date
    pub fn value(&self, currency: &str, date: NaiveDate) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        self.column(currency).map(|column| column[row])
    }

    /// Number of trading days
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Partitioned sessions keyed by session, plus the shared currency list
///
/// This is the hand-off shape for the hypothesis tests and for the GARCH and
/// bootstrap collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMap {
    currencies: Vec<String>,
    sessions: BTreeMap<Session, SessionSeries>,
}

impl SessionMap {
    /// Assemble a session map; every series must carry every currency
    pub fn new(currencies: Vec<String>, series: Vec<SessionSeries>) -> Result<Self> {
        let mut sessions = BTreeMap::new();
        for s in series {
            if let Some(missing) = currencies.iter().find(|c| s.column(c).is_none()) {
                return Err(SeasonalityError::Configuration(format!(
                    "session {} has no column for {}",
                    s.session(),
                    missing
                )));
            }
            if sessions.insert(s.session(), s).is_some() {
                return Err(SeasonalityError::Configuration(
                    "session map contains a session twice".to_string(),
                ));
            }
        }

        Ok(Self {
            currencies,
            sessions,
        })
    }

    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    pub fn get(&self, session: Session) -> Option<&SessionSeries> {
        self.sessions.get(&session)
    }

    /// Look up a session that a computation cannot proceed without
    pub fn require(&self, session: Session) -> Result<&SessionSeries> {
        self.get(session).ok_or_else(|| {
            SeasonalityError::Configuration(format!("session map has no {} session", session))
        })
    }

    /// Sessions present, in canonical order
    pub fn sessions(&self) -> impl Iterator<Item = Session> + '_ {
        self.sessions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Session, &SessionSeries)> {
        self.sessions.iter().map(|(s, series)| (*s, series))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Copy of this map without one session
    pub fn without(&self, session: Session) -> Self {
        let mut sessions = self.sessions.clone();
        sessions.remove(&session);
        Self {
            currencies: self.currencies.clone(),
            sessions,
        }
    }
}

/// Split a return series into daily aggregated session series
///
/// Rows are assigned to a session by hour of day and summed per calendar
/// date. Always yields all four sessions; a session with no matching rows
/// is present but empty.
pub fn partition(returns: &ReturnSeries, layout: &SessionLayout) -> Result<SessionMap> {
    let calendar = returns.with_calendar();
    let sums: Vec<Expr> = returns.currencies().iter().map(|c| col(c).sum()).collect();

    let mut series = Vec::with_capacity(Session::ALL.len());
    for session in Session::ALL {
        let hours = Series::new("hours", layout.hours(session).to_vec());
        let daily = calendar
            .clone()
            .filter(col(HOUR_COLUMN).is_in(lit(hours)))
            .groupby_stable([col(DATE_COLUMN)])
            .agg(sums.clone())
            .collect()?;

        let dates = date_values(daily.column(DATE_COLUMN)?)?;
        let columns = returns
            .currencies()
            .iter()
            .map(|currency| float_values(daily.column(currency)?))
            .collect::<Result<Vec<_>>>()?;

        debug!(session = %session, trading_days = dates.len(), "partitioned session");
        series.push(SessionSeries::new(
            session,
            dates,
            returns.currencies().to_vec(),
            columns,
        )?);
    }

    SessionMap::new(returns.currencies().to_vec(), series)
}

/// Partition with the standard four-session layout
pub fn partition_default(returns: &ReturnSeries) -> Result<SessionMap> {
    partition(returns, &SessionLayout::default())
}
