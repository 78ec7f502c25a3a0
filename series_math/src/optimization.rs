//! Derivative-free minimization for model parameter estimation
//!
//! Nelder-Mead simplex search with optional box bounds. Every candidate point
//! is clamped into the bounds before the objective is evaluated.

use crate::{MathError, Result};

/// Settings for the simplex search
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations before giving up
    pub max_iterations: usize,
    /// Stop once the spread of objective values across the simplex drops below this
    pub tolerance: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
    /// Offset used to build the initial simplex around the starting point
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a simplex search
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the tolerance was met before the iteration limit
    pub converged: bool,
}

/// Minimize `objective` starting from `initial`
///
/// `bounds`, when given, must hold one `(min, max)` pair per dimension.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Cannot optimize over zero parameters".to_string(),
        ));
    }
    if let Some(b) = bounds {
        if b.len() != n {
            return Err(MathError::InvalidInput(format!(
                "Expected {} bounds, got {}",
                n,
                b.len()
            )));
        }
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial, bounds));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(clamp(&vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| score(&objective, v)).collect();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if (values[worst] - values[best]).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);
        let collapsed = simplex
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max)
            < config.tolerance;
        if collapsed {
            converged = true;
            break;
        }

        let reflected = clamp(&along(&centroid, &simplex[worst], -config.alpha), bounds);
        let reflected_value = score(&objective, &reflected);

        if reflected_value < values[best] {
            let expanded = clamp(&along(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = score(&objective, &expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (contracted, threshold) = if reflected_value < values[worst] {
            (along(&centroid, &reflected, config.rho), reflected_value)
        } else {
            (along(&centroid, &simplex[worst], config.rho), values[worst])
        };
        let contracted = clamp(&contracted, bounds);
        let contracted_value = score(&objective, &contracted);
        if contracted_value < threshold {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // shrink towards the best vertex
        let anchor = simplex[best].clone();
        for idx in 0..=n {
            if idx == best {
                continue;
            }
            let shrunk = clamp(&along(&anchor, &simplex[idx], config.sigma), bounds);
            values[idx] = score(&objective, &shrunk);
            simplex[idx] = shrunk;
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    Ok(Minimum {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    })
}

/// Non-finite objective values are treated as infinitely bad
fn score<F: Fn(&[f64]) -> f64>(objective: &F, point: &[f64]) -> f64 {
    let value = objective(point);
    if value.is_finite() {
        value
    } else {
        f64::INFINITY
    }
}

/// `origin + coefficient * (point - origin)`
fn along(origin: &[f64], point: &[f64], coefficient: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + coefficient * (p - o))
        .collect()
}

fn centroid_without(simplex: &[Vec<f64>], excluded: usize) -> Vec<f64> {
    let dims = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; dims];

    for (idx, vertex) in simplex.iter().enumerate() {
        if idx == excluded {
            continue;
        }
        for (c, v) in centroid.iter_mut().zip(vertex) {
            *c += v / count;
        }
    }

    centroid
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        Some(bounds) => point
            .iter()
            .zip(bounds)
            .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
            .collect(),
        None => point.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_minimum() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
            &[0.0, 0.0],
            None,
            &NelderMeadConfig::default(),
        )
        .unwrap();

        assert!(result.converged);
        assert!((result.point[0] - 2.0).abs() < 1e-3);
        assert!((result.point[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_bounds_are_respected() {
        let bounds = [(-0.5, 0.5)];
        let result = nelder_mead(
            |x| (x[0] - 3.0).powi(2),
            &[0.0],
            Some(&bounds),
            &NelderMeadConfig::default(),
        )
        .unwrap();

        assert!(result.point[0] <= 0.5);
        assert!((result.point[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_iteration_limit_reports_no_convergence() {
        let config = NelderMeadConfig {
            max_iterations: 2,
            ..Default::default()
        };
        let result = nelder_mead(
            |x| (x[0] - 100.0).powi(2) + (x[1] - 100.0).powi(2),
            &[0.0, 0.0],
            None,
            &config,
        )
        .unwrap();

        assert!(!result.converged);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn test_rejects_empty_and_mismatched_input() {
        let config = NelderMeadConfig::default();
        assert!(nelder_mead(|_| 0.0, &[], None, &config).is_err());
        assert!(nelder_mead(|_| 0.0, &[1.0], Some(&[(0.0, 1.0), (0.0, 1.0)]), &config).is_err());
    }
}
