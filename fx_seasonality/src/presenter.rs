//! Significance annotation and plain-text rendering of test outcomes

use crate::tables::{ResultTable, TestOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default significance level
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Pass/fail label of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Significant,
    NotSignificant,
}

impl Significance {
    /// `p <= threshold` is significant
    pub fn classify(p_value: f64, threshold: f64) -> Self {
        if p_value <= threshold {
            Significance::Significant
        } else {
            Significance::NotSignificant
        }
    }

    pub fn is_significant(&self) -> bool {
        matches!(self, Significance::Significant)
    }
}

/// A statistic table with a significance label per cell
///
/// Only built by [`annotate`]; it serializes for reports but is never read back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedTable {
    title: String,
    threshold: f64,
    values: ResultTable,
    labels: Vec<Significance>,
}

impl AnnotatedTable {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Underlying statistic values
    pub fn values(&self) -> &ResultTable {
        &self.values
    }

    /// Significance of one labelled cell
    pub fn significance(&self, row: &str, column: &str) -> Option<Significance> {
        let r = self.values.rows().iter().position(|l| l == row)?;
        let c = self.values.columns().iter().position(|l| l == column)?;
        self.labels.get(r * self.values.columns().len() + c).copied()
    }

    /// Number of significant cells
    pub fn significant_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_significant()).count()
    }
}

/// Label every cell of `outcome` against `threshold`
pub fn annotate(title: &str, outcome: &TestOutcome, threshold: f64) -> AnnotatedTable {
    let labels = outcome
        .p_value()
        .values()
        .iter()
        .map(|&p| Significance::classify(p, threshold))
        .collect();

    AnnotatedTable {
        title: title.to_string(),
        threshold,
        values: outcome.statistic().clone(),
        labels,
    }
}

impl fmt::Display for AnnotatedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell_width = 14;

        writeln!(f, "{} (* p <= {})", self.title, self.threshold)?;

        let label_width = self
            .values
            .rows()
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(8);

        write!(f, "{:label_width$}", "")?;
        for column in self.values.columns() {
            write!(f, "{:>cell_width$}", column)?;
        }
        writeln!(f)?;

        let n_columns = self.values.columns().len();
        for (r, row) in self.values.rows().iter().enumerate() {
            write!(f, "{:label_width$}", row)?;
            for c in 0..n_columns {
                let index = r * n_columns + c;
                let marker = if self.labels[index].is_significant() { "*" } else { " " };
                let cell = format!("{:.6}{}", self.values.values()[index], marker);
                write!(f, "{:>cell_width$}", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::TestCell;

    fn outcome() -> TestOutcome {
        TestOutcome::from_cells(
            vec!["EUR".to_string()],
            vec!["US".to_string(), "Non US".to_string()],
            vec![
                TestCell {
                    statistic: -0.0021,
                    p_value: 0.05,
                },
                TestCell {
                    statistic: 0.0004,
                    p_value: 0.3,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let annotated = annotate("Means", &outcome(), DEFAULT_SIGNIFICANCE);

        assert_eq!(
            annotated.significance("EUR", "US"),
            Some(Significance::Significant)
        );
        assert_eq!(
            annotated.significance("EUR", "Non US"),
            Some(Significance::NotSignificant)
        );
        assert_eq!(annotated.significant_count(), 1);
    }

    #[test]
    fn test_display_marks_significant_cells() {
        let rendered = annotate("Means", &outcome(), DEFAULT_SIGNIFICANCE).to_string();

        assert!(rendered.starts_with("Means (* p <= 0.05)"));
        assert!(rendered.contains("-0.002100*"));
        assert!(rendered.contains("0.000400 "));
    }
}
