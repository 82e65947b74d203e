//! Derivative-free minimization
//!
//! Nelder-Mead simplex search plus a central-difference Hessian, enough to
//! fit low-dimensional likelihoods such as GARCH(1,1).

use crate::{MathError, Result};

/// Stopping rules for [`nelder_mead`]
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    /// Hard cap on simplex iterations
    pub max_iterations: usize,
    /// Spread of objective values across the simplex at convergence
    pub f_tolerance: f64,
    /// Largest vertex distance from the best vertex at convergence
    pub x_tolerance: f64,
    /// Relative size of the initial simplex
    pub initial_step: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            f_tolerance: 1e-8,
            x_tolerance: 1e-8,
            initial_step: 0.05,
        }
    }
}

/// Best point found by a minimizer
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize `objective` starting from `start`
///
/// Infeasible regions can be expressed by returning `f64::INFINITY`; the
/// starting point itself must evaluate to a finite value.
pub fn nelder_mead<F>(objective: F, start: &[f64], options: NelderMeadOptions) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let dim = start.len();
    if dim == 0 {
        return Err(MathError::InvalidInput(
            "Cannot minimize over zero parameters".to_string(),
        ));
    }
    let start_value = objective(start);
    if !start_value.is_finite() {
        return Err(MathError::InvalidInput(
            "Objective is not finite at the starting point".to_string(),
        ));
    }

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dim + 1);
    simplex.push((start.to_vec(), start_value));
    for i in 0..dim {
        let mut vertex = start.to_vec();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * (1.0 + options.initial_step)
        } else {
            0.00025
        };
        let value = objective(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        let best = simplex[0].1;
        let worst = simplex[dim].1;
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|(v, _)| v.iter().zip(&simplex[0].0).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        if (worst - best).abs() <= options.f_tolerance && x_spread <= options.x_tolerance {
            converged = true;
            break;
        }
        iterations += 1;

        // Centroid of all vertices but the worst
        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..dim].iter().map(|(v, _)| v[j]).sum::<f64>() / dim as f64)
            .collect();
        let worst_vertex = simplex[dim].0.clone();
        let toward = |coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&worst_vertex)
                .map(|(c, w)| c + coef * (c - w))
                .collect()
        };

        let reflected = toward(1.0);
        let reflected_value = objective(&reflected);

        if reflected_value < simplex[0].1 {
            let expanded = toward(2.0);
            let expanded_value = objective(&expanded);
            simplex[dim] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < simplex[dim - 1].1 {
            simplex[dim] = (reflected, reflected_value);
            continue;
        }

        let contracted = if reflected_value < simplex[dim].1 {
            toward(0.5)
        } else {
            toward(-0.5)
        };
        let contracted_value = objective(&contracted);
        if contracted_value < simplex[dim].1.min(reflected_value) {
            simplex[dim] = (contracted, contracted_value);
            continue;
        }

        // Shrink toward the best vertex
        let best_vertex = simplex[0].0.clone();
        for (vertex, value) in simplex.iter_mut().skip(1) {
            for (x, b) in vertex.iter_mut().zip(&best_vertex) {
                *x = b + 0.5 * (*x - b);
            }
            *value = objective(vertex);
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (point, value) = simplex.swap_remove(0);

    Ok(Minimum {
        point,
        value,
        iterations,
        converged,
    })
}

/// Central-difference Hessian of `objective` at `point`
pub fn numerical_hessian<F>(objective: F, point: &[f64]) -> Result<Vec<Vec<f64>>>
where
    F: Fn(&[f64]) -> f64,
{
    let dim = point.len();
    let steps: Vec<f64> = point.iter().map(|x| 1e-4 * x.abs().max(1e-2)).collect();
    let eval = |shifts: &[(usize, f64)]| -> f64 {
        let mut shifted = point.to_vec();
        for &(i, delta) in shifts {
            shifted[i] += delta;
        }
        objective(&shifted)
    };

    let center = objective(point);
    let mut hessian = vec![vec![0.0; dim]; dim];
    for i in 0..dim {
        let hi = steps[i];
        hessian[i][i] = (eval(&[(i, hi)]) - 2.0 * center + eval(&[(i, -hi)])) / (hi * hi);
        for j in (i + 1)..dim {
            let hj = steps[j];
            let value = (eval(&[(i, hi), (j, hj)]) - eval(&[(i, hi), (j, -hj)])
                - eval(&[(i, -hi), (j, hj)])
                + eval(&[(i, -hi), (j, -hj)]))
                / (4.0 * hi * hj);
            hessian[i][j] = value;
            hessian[j][i] = value;
        }
    }

    if hessian.iter().flatten().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Hessian has non-finite entries".to_string(),
        ));
    }

    Ok(hessian)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nelder_mead_quadratic() {
        let objective = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let minimum = nelder_mead(objective, &[0.0, 0.0], NelderMeadOptions::default()).unwrap();

        assert!(minimum.converged);
        assert_relative_eq!(minimum.point[0], 3.0, epsilon = 1e-3);
        assert_relative_eq!(minimum.point[1], -1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_nelder_mead_respects_infeasible_region() {
        // Minimum at x = -2 is excluded; the constrained optimum sits at the boundary
        let objective = |x: &[f64]| {
            if x[0] < 0.0 {
                f64::INFINITY
            } else {
                (x[0] + 2.0).powi(2)
            }
        };
        let minimum = nelder_mead(objective, &[1.0], NelderMeadOptions::default()).unwrap();
        assert!(minimum.point[0] >= 0.0);
        assert!(minimum.point[0] < 1e-3);
    }

    #[test]
    fn test_nelder_mead_rejects_infinite_start() {
        let objective = |_: &[f64]| f64::INFINITY;
        assert!(nelder_mead(objective, &[1.0], NelderMeadOptions::default()).is_err());
    }

    #[test]
    fn test_numerical_hessian_of_quadratic() {
        let objective = |x: &[f64]| x[0] * x[0] + 3.0 * x[0] * x[1] + 5.0 * x[1] * x[1];
        let hessian = numerical_hessian(objective, &[1.0, 2.0]).unwrap();

        assert_relative_eq!(hessian[0][0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(hessian[0][1], 3.0, epsilon = 1e-4);
        assert_relative_eq!(hessian[1][0], 3.0, epsilon = 1e-4);
        assert_relative_eq!(hessian[1][1], 10.0, epsilon = 1e-4);
    }
}
