mod common;

use approx::assert_relative_eq;
use common::{at, day, domestic_drift_returns, CURRENCIES};
use fx_seasonality::sessions::SessionSeries;
use fx_seasonality::tables::JOINT_COLUMN;
use fx_seasonality::{
    one_sample_test, partition, simultaneous_test, two_sample_test, MultiGroupMethod,
    ReturnSeries, SeasonalityAnalysis, SeasonalityError, Session, SessionLayout, SessionLengths,
    SessionMap, TestOutcome,
};
use rstest::rstest;
use std::collections::BTreeSet;

#[test]
fn test_partition_covers_every_hour_once() {
    let layout = SessionLayout::default();
    let mut seen = BTreeSet::new();
    for session in Session::ALL {
        for hour in layout.hours(session) {
            assert!(seen.insert(*hour), "hour {} assigned twice", hour);
        }
    }
    assert_eq!(seen, (0..24).collect::<BTreeSet<u32>>());

    let returns = domestic_drift_returns(5, 0.001, 1);
    let sessions = partition(&returns, &layout).unwrap();
    assert_eq!(sessions.sessions().collect::<Vec<_>>(), Session::ALL.to_vec());
}

#[test]
fn test_partition_conserves_total_return() {
    let returns = domestic_drift_returns(6, 0.002, 2);
    let sessions = partition(&returns, &SessionLayout::default()).unwrap();

    for currency in CURRENCIES {
        let total: f64 = returns.column(currency).unwrap().iter().sum();
        let by_session: f64 = sessions
            .iter()
            .map(|(_, series)| series.column(currency).unwrap().iter().sum::<f64>())
            .sum();
        assert_relative_eq!(total, by_session, epsilon = 1e-12);
    }
}

#[test]
fn test_outcomes_are_aligned_with_valid_p_values() {
    let sessions = partition(&domestic_drift_returns(10, 0.001, 3), &SessionLayout::default()).unwrap();
    let lengths = SessionLengths::default();

    let outcomes = [
        one_sample_test(&sessions).unwrap(),
        two_sample_test(&sessions, &lengths).unwrap(),
        simultaneous_test(&sessions, &lengths, MultiGroupMethod::Welch).unwrap(),
        simultaneous_test(&sessions, &lengths, MultiGroupMethod::Classic).unwrap(),
    ];

    for outcome in &outcomes {
        assert!(outcome.statistic().is_aligned_with(outcome.p_value()));
        assert_eq!(outcome.rows(), &CURRENCIES);
        for (row, column, cell) in outcome.cells() {
            assert!(
                (0.0..=1.0).contains(&cell.p_value),
                "p-value {} out of range at {}/{}",
                cell.p_value,
                row,
                column
            );
        }
    }

    assert_eq!(outcomes[0].columns(), &["Domestic", "LDN-NY", "US", "Non US"]);
    assert_eq!(outcomes[1].columns(), &["LDN-NY", "US", "Non US"]);
    assert_eq!(outcomes[2].columns(), &[JOINT_COLUMN]);
}

#[rstest]
#[case(MultiGroupMethod::Welch)]
#[case(MultiGroupMethod::Classic)]
fn test_comparisons_are_deterministic(#[case] method: MultiGroupMethod) {
    let lengths = SessionLengths::default();
    let run = || {
        let sessions =
            partition(&domestic_drift_returns(8, 0.001, 4), &SessionLayout::default()).unwrap();
        (
            two_sample_test(&sessions, &lengths).unwrap(),
            simultaneous_test(&sessions, &lengths, method).unwrap(),
        )
    };

    assert_eq!(run(), run());
}

#[test]
fn test_constant_domestic_drift_is_detected() {
    let per_hour = 0.001;
    let sessions = partition(&domestic_drift_returns(10, per_hour, 5), &SessionLayout::default()).unwrap();
    let outcome = one_sample_test(&sessions).unwrap();

    let domestic_hours = SessionLayout::default().hours(Session::Domestic).len() as f64;
    for currency in CURRENCIES {
        let cell = outcome.cell(currency, "Domestic").unwrap();
        assert_relative_eq!(cell.statistic, per_hour * domestic_hours, epsilon = 1e-4);
        assert!(cell.p_value < 0.05);
    }

    let comparison = two_sample_test(&sessions, &SessionLengths::default()).unwrap();
    for currency in CURRENCIES {
        for session in Session::FOREIGN {
            let cell = comparison.cell(currency, session.name()).unwrap();
            assert!(cell.statistic > 0.0);
            assert!(cell.p_value < 0.05);
        }
    }
}

/// Every session test, so error paths can be checked across all of them
#[derive(Debug, Clone, Copy)]
enum SessionTest {
    OneSample,
    TwoSample,
    WelchF,
    ClassicF,
}

impl SessionTest {
    fn run(self, sessions: &SessionMap) -> Result<TestOutcome, SeasonalityError> {
        let lengths = SessionLengths::default();
        match self {
            SessionTest::OneSample => one_sample_test(sessions),
            SessionTest::TwoSample => two_sample_test(sessions, &lengths),
            SessionTest::WelchF => simultaneous_test(sessions, &lengths, MultiGroupMethod::Welch),
            SessionTest::ClassicF => {
                simultaneous_test(sessions, &lengths, MultiGroupMethod::Classic)
            }
        }
    }
}

/// Five days of hourly returns where only the first day trades US hours
fn single_us_day_returns() -> ReturnSeries {
    let layout = SessionLayout::default();
    let mut timestamps = Vec::new();
    for d in 0..5 {
        for hour in 0..24 {
            if d > 0 && layout.session_of(hour) == Some(Session::Us) {
                continue;
            }
            timestamps.push(at(day(d), hour));
        }
    }
    let columns: Vec<Vec<f64>> = (0..CURRENCIES.len())
        .map(|c| {
            (0..timestamps.len())
                .map(|i| ((i * 7 + c * 3) % 13) as f64 * 1e-4 - 6e-4)
                .collect()
        })
        .collect();

    ReturnSeries::new(
        timestamps,
        CURRENCIES.iter().map(|c| c.to_string()).collect(),
        columns,
    )
    .unwrap()
}

/// Session map whose sessions are each a constant non-zero daily return
fn constant_sessions() -> SessionMap {
    let dates: Vec<_> = (0..10).map(day).collect();
    let constants = [0.2, 0.1, -0.3, 0.05];
    let series = Session::ALL
        .iter()
        .zip(constants)
        .map(|(session, value)| {
            SessionSeries::new(
                *session,
                dates.clone(),
                vec!["EUR".to_string()],
                vec![vec![value; dates.len()]],
            )
            .unwrap()
        })
        .collect();
    SessionMap::new(vec!["EUR".to_string()], series).unwrap()
}

#[rstest]
#[case(SessionTest::OneSample)]
#[case(SessionTest::TwoSample)]
#[case(SessionTest::WelchF)]
#[case(SessionTest::ClassicF)]
fn test_single_us_day_is_insufficient(#[case] test: SessionTest) {
    let sessions = partition(&single_us_day_returns(), &SessionLayout::default()).unwrap();

    match test.run(&sessions).unwrap_err() {
        SeasonalityError::InsufficientData {
            currency,
            session,
            observations,
        } => {
            assert_eq!(currency, "EUR");
            assert_eq!(session, "US");
            assert_eq!(observations, 1);
        }
        other => panic!("{:?}: expected InsufficientData, got {:?}", test, other),
    }
}

#[rstest]
fn test_missing_session_is_a_configuration_error(
    #[values(
        SessionTest::OneSample,
        SessionTest::TwoSample,
        SessionTest::WelchF,
        SessionTest::ClassicF
    )]
    test: SessionTest,
    #[values(Session::Domestic, Session::LdnNy, Session::Us, Session::NonUs)] missing: Session,
) {
    let sessions = partition(&domestic_drift_returns(6, 0.001, 6), &SessionLayout::default())
        .unwrap()
        .without(missing);

    let result = test.run(&sessions);
    assert!(
        matches!(result, Err(SeasonalityError::Configuration(_))),
        "{:?} without {}: {:?}",
        test,
        missing,
        result
    );
}

#[rstest]
#[case(SessionTest::OneSample, "Domestic")]
#[case(SessionTest::TwoSample, "Domestic vs LDN-NY")]
#[case(SessionTest::WelchF, "Domestic")]
#[case(SessionTest::ClassicF, JOINT_COLUMN)]
fn test_constant_sessions_are_degenerate(#[case] test: SessionTest, #[case] expected: &str) {
    match test.run(&constant_sessions()).unwrap_err() {
        SeasonalityError::DegenerateSample { currency, session } => {
            assert_eq!(currency, "EUR");
            assert_eq!(session, expected);
        }
        other => panic!("{:?}: expected DegenerateSample, got {:?}", test, other),
    }
}

#[test]
fn test_analysis_surfaces_currency_and_session() {
    let analysis = SeasonalityAnalysis::default();

    match analysis.analyze_returns(&single_us_day_returns()).unwrap_err() {
        SeasonalityError::InsufficientData {
            currency, session, ..
        } => {
            assert_eq!(currency, "EUR");
            assert_eq!(session, "US");
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }

    match analysis.analyze_sessions(constant_sessions()).unwrap_err() {
        SeasonalityError::DegenerateSample { currency, session } => {
            assert_eq!(currency, "EUR");
            assert_eq!(session, "Domestic");
        }
        other => panic!("expected DegenerateSample, got {:?}", other),
    }
}

#[rstest]
#[case(50)]
#[case(500)]
fn test_matched_domestic_and_non_us_are_indistinguishable(#[case] n: usize) {
    let dates: Vec<_> = (0..n as i64).map(day).collect();
    // Per-hour rates identical once divided by the seven-hour session length
    let per_hour: Vec<f64> = (0..n).map(|i| ((i * 37) % 101) as f64 * 1e-5 - 5e-4).collect();
    let seven_hours: Vec<f64> = per_hour.iter().map(|r| r * 7.0).collect();
    let other: Vec<f64> = per_hour.iter().map(|r| r * 4.0 + 1e-4).collect();

    let series = |session: Session, values: &Vec<f64>| {
        SessionSeries::new(session, dates.clone(), vec!["EUR".to_string()], vec![values.clone()])
            .unwrap()
    };
    let sessions = SessionMap::new(
        vec!["EUR".to_string()],
        vec![
            series(Session::Domestic, &seven_hours),
            series(Session::LdnNy, &other),
            series(Session::Us, &other),
            series(Session::NonUs, &seven_hours),
        ],
    )
    .unwrap();

    let outcome = two_sample_test(&sessions, &SessionLengths::default()).unwrap();
    let cell = outcome.cell("EUR", "Non US").unwrap();
    assert_relative_eq!(cell.statistic, 0.0, epsilon = 1e-9);
    assert!(cell.p_value > 0.99);
}
