//! Dense matrix helpers for small parameter covariance matrices

use crate::{MathError, Result};

/// Invert a square matrix with Gauss-Jordan elimination and partial pivoting
pub fn invert(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();
    if n == 0 || matrix.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Matrix must be square and non-empty".to_string(),
        ));
    }

    // Augment with the identity
    let mut work: Vec<Vec<f64>> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut augmented = row.clone();
            augmented.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            augmented
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| work[a][col].abs().total_cmp(&work[b][col].abs()))
            .unwrap_or(col);
        let pivot = work[pivot_row][col];
        if pivot.abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "Matrix is singular".to_string(),
            ));
        }
        work.swap(col, pivot_row);

        for value in work[col].iter_mut() {
            *value /= pivot;
        }

        let pivot_values = work[col].clone();
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = work[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..2 * n {
                work[row][j] -= factor * pivot_values[j];
            }
        }
    }

    Ok(work.into_iter().map(|row| row[n..].to_vec()).collect())
}
