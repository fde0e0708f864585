//! Levenberg-Marquardt for two-parameter curve fits
//!
//! Minimizes `sum(((y_i - f(x_i, p)) / sigma_i)^2)` over `p = (p0, p1)` with
//! Marquardt's diagonal scaling of the damping term.

use nalgebra::{Matrix2, Vector2};

use crate::error::FitError;

/// Relative step tolerance
const XTOL: f64 = 1.49e-8;

/// Relative cost reduction tolerance
const FTOL: f64 = 1.49e-8;

const INITIAL_DAMPING: f64 = 1e-3;
const MAX_DAMPING: f64 = 1e16;

/// Two-parameter model: value and gradient with respect to the parameters
pub trait TwoParamModel {
    /// Model value and `[df/dp0, df/dp1]` at `x`
    fn eval(&self, x: f64, params: &Vector2<f64>) -> (f64, Vector2<f64>);
}

impl<F> TwoParamModel for F
where
    F: Fn(f64, &Vector2<f64>) -> (f64, Vector2<f64>),
{
    fn eval(&self, x: f64, params: &Vector2<f64>) -> (f64, Vector2<f64>) {
        self(x, params)
    }
}

/// Converged solution
#[derive(Debug, Clone)]
pub struct LmSolution {
    /// Best-fit parameters
    pub params: Vector2<f64>,
    /// Weighted normal matrix `J^T J` at the solution
    pub normal_matrix: Matrix2<f64>,
    /// Weighted sum of squared residuals
    pub chi_squared: f64,
    /// Iterations performed
    pub iterations: usize,
}

struct Linearization {
    normal: Matrix2<f64>,
    gradient: Vector2<f64>,
    chi_squared: f64,
}

fn linearize<M: TwoParamModel>(
    model: &M,
    x: &[f64],
    y: &[f64],
    sigma: Option<&[f64]>,
    params: &Vector2<f64>,
) -> Option<Linearization> {
    let mut normal = Matrix2::zeros();
    let mut gradient = Vector2::zeros();
    let mut chi_squared = 0.0;
    for i in 0..x.len() {
        let (value, jac) = model.eval(x[i], params);
        let w = sigma.map_or(1.0, |s| 1.0 / s[i]);
        let r = (y[i] - value) * w;
        let j = jac * w;
        if !r.is_finite() || !j[0].is_finite() || !j[1].is_finite() {
            return None;
        }
        normal += j * j.transpose();
        gradient += j * r;
        chi_squared += r * r;
    }
    Some(Linearization {
        normal,
        gradient,
        chi_squared,
    })
}

fn chi_squared<M: TwoParamModel>(
    model: &M,
    x: &[f64],
    y: &[f64],
    sigma: Option<&[f64]>,
    params: &Vector2<f64>,
) -> f64 {
    x.iter()
        .zip(y)
        .enumerate()
        .map(|(i, (&xi, &yi))| {
            let w = sigma.map_or(1.0, |s| 1.0 / s[i]);
            let r = (yi - model.eval(xi, params).0) * w;
            r * r
        })
        .sum()
}

/// Least-squares fit of `model` to `(x, y)` starting from `initial`
///
/// # Errors
///
/// - `FitError::NonFinite` if the model cannot be evaluated at the start point
/// - `FitError::NonConvergence` if `max_iterations` is exhausted
pub fn solve<M: TwoParamModel>(
    model: &M,
    x: &[f64],
    y: &[f64],
    sigma: Option<&[f64]>,
    initial: Vector2<f64>,
    max_iterations: usize,
) -> Result<LmSolution, FitError> {
    let mut params = initial;
    let mut lin = linearize(model, x, y, sigma, &params).ok_or_else(|| {
        FitError::NonFinite(format!("model at initial guess ({}, {})", params[0], params[1]))
    })?;
    let mut damping = INITIAL_DAMPING;

    for iteration in 1..=max_iterations {
        if lin.chi_squared == 0.0 || lin.gradient.norm() == 0.0 {
            return Ok(LmSolution {
                params,
                normal_matrix: lin.normal,
                chi_squared: lin.chi_squared,
                iterations: iteration - 1,
            });
        }

        let mut step_taken = None;
        while damping <= MAX_DAMPING {
            let mut a = lin.normal;
            for k in 0..2 {
                a[(k, k)] += damping * lin.normal[(k, k)].max(f64::EPSILON);
            }
            let Some(step) = a.lu().solve(&lin.gradient) else {
                damping *= 10.0;
                continue;
            };
            let candidate = params + step;
            let cost = chi_squared(model, x, y, sigma, &candidate);
            if cost.is_finite() && cost < lin.chi_squared {
                step_taken = Some((candidate, step, cost));
                damping = (damping * 0.1).max(1e-12);
                break;
            }
            damping *= 10.0;
        }

        // No damping improves the cost: we sit at the minimum to working precision
        let Some((candidate, step, cost)) = step_taken else {
            return Ok(LmSolution {
                params,
                normal_matrix: lin.normal,
                chi_squared: lin.chi_squared,
                iterations: iteration,
            });
        };

        let small_step = step.norm() <= XTOL * (params.norm() + XTOL);
        let small_reduction = lin.chi_squared - cost <= FTOL * lin.chi_squared;
        params = candidate;
        lin = linearize(model, x, y, sigma, &params).ok_or_else(|| {
            FitError::NonFinite(format!("model at ({}, {})", params[0], params[1]))
        })?;

        if small_step || small_reduction {
            return Ok(LmSolution {
                params,
                normal_matrix: lin.normal,
                chi_squared: lin.chi_squared,
                iterations: iteration,
            });
        }
    }

    Err(FitError::NonConvergence {
        iterations: max_iterations,
    })
}
