//! Derivative-free minimisation used for ARIMA parameter estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the best point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex converged before `max_iter`.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Relative step used to build the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Minimise `objective` starting from `initial`, optionally clamping each
/// coordinate to `bounds`.
///
/// Non-finite objective values are treated as worse than any finite one,
/// so a region where the objective blows up is simply walked away from.
///
/// ```
/// use cashflow_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] + 1.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let dim = initial.len();
    if dim == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |point: Vec<f64>| {
        let point = clamp(point, bounds);
        let value = objective(&point);
        Vertex {
            value: if value.is_finite() { value } else { f64::MAX },
            point,
        }
    };

    let mut simplex: Vec<Vertex> = Vec::with_capacity(dim + 1);
    simplex.push(eval(initial.to_vec()));
    for axis in 0..dim {
        let mut point = initial.to_vec();
        point[axis] += if initial[axis].abs() > 1e-10 {
            config.initial_step * initial[axis].abs()
        } else {
            config.initial_step
        };
        simplex.push(eval(point));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

        let best = simplex[0].value;
        let worst = simplex[dim].value;
        if (worst - best).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_without_last(&simplex);
        let reflected = eval(towards(&centroid, &simplex[dim].point, -config.alpha));

        if reflected.value < best {
            let expanded = eval(towards(&centroid, &reflected.point, config.gamma));
            simplex[dim] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < simplex[dim - 1].value {
            simplex[dim] = reflected;
            continue;
        }

        let contracted = if reflected.value < worst {
            let outside = eval(towards(&centroid, &reflected.point, config.rho));
            (outside.value <= reflected.value).then_some(outside)
        } else {
            let inside = eval(towards(&centroid, &simplex[dim].point, config.rho));
            (inside.value < worst).then_some(inside)
        };

        if let Some(vertex) = contracted {
            simplex[dim] = vertex;
            continue;
        }

        let anchor = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk = towards(&anchor, &vertex.point, config.sigma);
            *vertex = eval(shrunk);
        }
    }

    let best = simplex
        .into_iter()
        .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
        .map(|v| (v.point, v.value))
        .unwrap_or_else(|| (initial.to_vec(), f64::NAN));

    NelderMeadResult {
        optimal_point: best.0,
        optimal_value: best.1,
        iterations,
        converged,
    }
}

/// Centroid of every vertex but the (sorted) worst one.
fn centroid_without_last(simplex: &[Vertex]) -> Vec<f64> {
    let kept = &simplex[..simplex.len() - 1];
    let mut centroid = vec![0.0; kept[0].point.len()];
    for vertex in kept {
        for (c, x) in centroid.iter_mut().zip(&vertex.point) {
            *c += x;
        }
    }
    let count = kept.len() as f64;
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

/// `origin + factor * (target - origin)`.
fn towards(origin: &[f64], target: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, t)| o + factor * (t - o))
        .collect()
}

fn clamp(point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point,
        Some(bounds) => point
            .into_iter()
            .enumerate()
            .map(|(i, x)| match bounds.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect(),
    }
}
