//! Labelled result tables
//!
//! A [`ResultTable`] is a dense row-major matrix of `f64` with currency row
//! labels and column labels (session names, or [`JOINT_COLUMN`] for tests
//! that collapse all sessions). A [`TestOutcome`] pairs a statistic table
//! with its p-value table and refuses to exist unless both share the same
//! labels in the same order.

use crate::error::{Result, SeasonalityError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// Column label for statistics computed across all sessions jointly
pub const JOINT_COLUMN: &str = "All sessions";

/// Numeric table indexed by row and column labels
///
/// Deserialization goes through [`ResultTable::new`], so a table read back
/// from JSON has the same cell-count guarantee as one built in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct ResultTable {
    rows: Vec<String>,
    columns: Vec<String>,
    values: Vec<f64>,
}

impl ResultTable {
    /// Create a table from row-major values
    pub fn new(rows: Vec<String>, columns: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if values.len() != rows.len() * columns.len() {
            return Err(SeasonalityError::Alignment(format!(
                "{} values cannot fill a {}x{} table",
                values.len(),
                rows.len(),
                columns.len()
            )));
        }

        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    /// Fill a table cell by cell, stopping at the first error
    pub fn try_from_fn<F>(rows: Vec<String>, columns: Vec<String>, mut cell: F) -> Result<Self>
    where
        F: FnMut(&str, &str) -> Result<f64>,
    {
        let mut values = Vec::with_capacity(rows.len() * columns.len());
        for row in &rows {
            for column in &columns {
                values.push(cell(row, column)?);
            }
        }
        Self::new(rows, columns, values)
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Value at a labelled cell
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|label| label == row)?;
        let c = self.columns.iter().position(|label| label == column)?;
        Some(self.values[r * self.columns.len() + c])
    }

    /// All values of one row, in column order
    pub fn row(&self, row: &str) -> Option<&[f64]> {
        let r = self.rows.iter().position(|label| label == row)?;
        let width = self.columns.len();
        Some(&self.values[r * width..(r + 1) * width])
    }

    /// All values of one column, in row order
    pub fn column(&self, column: &str) -> Option<Vec<f64>> {
        let c = self.columns.iter().position(|label| label == column)?;
        Some(
            self.values
                .iter()
                .skip(c)
                .step_by(self.columns.len())
                .copied()
                .collect(),
        )
    }

    /// Row-major values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Whether another table has identical row and column labels
    pub fn is_aligned_with(&self, other: &ResultTable) -> bool {
        self.rows == other.rows && self.columns == other.columns
    }

    /// Write the table as CSV with a leading label column
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.clone()];
            if let Some(values) = self.row(row) {
                record.extend(values.iter().map(|v| v.to_string()));
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

#[derive(Deserialize)]
struct TableParts {
    rows: Vec<String>,
    columns: Vec<String>,
    values: Vec<f64>,
}

impl TryFrom<TableParts> for ResultTable {
    type Error = SeasonalityError;

    fn try_from(parts: TableParts) -> Result<Self> {
        Self::new(parts.rows, parts.columns, parts.values)
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self.rows.iter().map(String::len).max().unwrap_or(0).max(4);
        let cell_width = self
            .columns
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(12)
            + 2;

        write!(f, "{:label_width$}", "")?;
        for column in &self.columns {
            write!(f, "{:>cell_width$}", column)?;
        }
        writeln!(f)?;

        for (row, values) in self.rows.iter().zip(self.values.chunks(self.columns.len().max(1))) {
            write!(f, "{:label_width$}", row)?;
            for value in values {
                write!(f, "{:>cell_width$.6}", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Statistic and p-value of one labelled cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestCell {
    pub statistic: f64,
    pub p_value: f64,
}

/// Index-aligned statistic and p-value tables of one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OutcomeParts")]
pub struct TestOutcome {
    statistic: ResultTable,
    p_value: ResultTable,
}

#[derive(Deserialize)]
struct OutcomeParts {
    statistic: ResultTable,
    p_value: ResultTable,
}

impl TryFrom<OutcomeParts> for TestOutcome {
    type Error = SeasonalityError;

    fn try_from(parts: OutcomeParts) -> Result<Self> {
        Self::new(parts.statistic, parts.p_value)
    }
}

impl TestOutcome {
    /// Pair two tables, failing unless their labels match exactly
    pub fn new(statistic: ResultTable, p_value: ResultTable) -> Result<Self> {
        let outcome = Self { statistic, p_value };
        outcome.check_alignment()?;
        Ok(outcome)
    }

    /// Build both tables from row-major cells
    pub fn from_cells(rows: Vec<String>, columns: Vec<String>, cells: Vec<TestCell>) -> Result<Self> {
        let (statistics, p_values): (Vec<f64>, Vec<f64>) = cells.iter().map(|c| (c.statistic, c.p_value)).unzip();
        Self::new(
            ResultTable::new(rows.clone(), columns.clone(), statistics)?,
            ResultTable::new(rows, columns, p_values)?,
        )
    }

    /// Verify that the two tables still share row and column labels
    pub fn check_alignment(&self) -> Result<()> {
        if !self.statistic.is_aligned_with(&self.p_value) {
            return Err(SeasonalityError::Alignment(format!(
                "statistic table is {:?} but p-value table is {:?}",
                self.statistic.shape(),
                self.p_value.shape()
            )));
        }
        if self.statistic.values().len() != self.p_value.values().len() {
            return Err(SeasonalityError::Alignment(
                "statistic and p-value tables hold different cell counts".to_string(),
            ));
        }
        Ok(())
    }

    pub fn statistic(&self) -> &ResultTable {
        &self.statistic
    }

    pub fn p_value(&self) -> &ResultTable {
        &self.p_value
    }

    /// Currencies, in row order
    pub fn rows(&self) -> &[String] {
        self.statistic.rows()
    }

    pub fn columns(&self) -> &[String] {
        self.statistic.columns()
    }

    /// Statistic and p-value at one cell
    pub fn cell(&self, row: &str, column: &str) -> Option<TestCell> {
        Some(TestCell {
            statistic: self.statistic.get(row, column)?,
            p_value: self.p_value.get(row, column)?,
        })
    }

    /// Every cell with its labels, row-major
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, TestCell)> + '_ {
        let width = self.columns().len();
        self.statistic
            .values()
            .iter()
            .zip(self.p_value.values())
            .enumerate()
            .map(move |(i, (&statistic, &p_value))| {
                (
                    self.rows()[i / width].as_str(),
                    self.columns()[i % width].as_str(),
                    TestCell { statistic, p_value },
                )
            })
    }

    pub fn into_parts(self) -> (ResultTable, ResultTable) {
        (self.statistic, self.p_value)
    }
}
