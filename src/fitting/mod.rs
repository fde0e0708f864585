//! Two-rate kinetic model fit
//!
//! A track ends either because the molecule unbinds (rate `1/t_on`) or
//! because its fluorophore bleaches. Bleaching happens with a fixed
//! probability per exposed frame, so in time units its rate is
//! `1/(c_bleach · Δt)`. The apparent lifetime at frame interval `Δt` is
//!
//! ```text
//! τ_app(Δt) = 1 / (1/t_on + 1/(c_bleach · Δt))
//! ```
//!
//! Inverting gives `1/τ_app = 1/t_on + (1/c_bleach) · (1/Δt)`, a straight
//! line in `1/Δt` that seeds the weighted nonlinear fit.
//!
//! # Example
//!
//! ```
//! use bondtime::estimation::{ApparentLifetimeRow, ApparentLifetimeTable};
//! use bondtime::fitting::{fit_lifetime, lifetime_model};
//! use bondtime::AnalysisConfig;
//!
//! let rows = [0.01, 0.02, 0.05, 0.1, 0.2]
//!     .iter()
//!     .map(|&dt| ApparentLifetimeRow {
//!         interval: dt,
//!         lifetime_app: lifetime_model(dt, 5.0, 50.0),
//!         lifetime_app_err: None,
//!         track_count: 100,
//!     })
//!     .collect();
//! let result = fit_lifetime(&ApparentLifetimeTable::from_rows(rows), &AnalysisConfig::default());
//! assert!((result.lifetime - 5.0).abs() < 1e-4);
//! ```

pub mod levenberg_marquardt;
pub mod linear;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::FitError;
use crate::estimation::{ApparentLifetimeRow, ApparentLifetimeTable};

/// Fitted bound lifetime and bleaching constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifetimeResult {
    /// True mean bound time
    pub lifetime: f64,
    /// Bleaching constant: bleach lifetime per unit frame interval
    pub bleach: f64,
    /// Uncertainty of `lifetime`
    pub lifetime_err: Option<f64>,
    /// Uncertainty of `bleach`
    pub bleach_err: Option<f64>,
}

impl LifetimeResult {
    /// Result carrying no answer
    pub fn nan() -> Self {
        Self {
            lifetime: f64::NAN,
            bleach: f64::NAN,
            lifetime_err: Some(f64::NAN),
            bleach_err: Some(f64::NAN),
        }
    }

    /// Both fitted values are finite
    pub fn is_finite(&self) -> bool {
        self.lifetime.is_finite() && self.bleach.is_finite()
    }

    /// Apparent lifetime predicted at `interval`
    pub fn apparent_lifetime(&self, interval: f64) -> f64 {
        lifetime_model(interval, self.lifetime, self.bleach)
    }
}

/// Apparent lifetime at frame interval `interval`
pub fn lifetime_model(interval: f64, t_on: f64, c_bleach: f64) -> f64 {
    1.0 / (1.0 / t_on + 1.0 / (c_bleach * interval))
}

fn model_with_gradient(interval: f64, params: &Vector2<f64>) -> (f64, Vector2<f64>) {
    let (t_on, c_bleach) = (params[0], params[1]);
    let value = lifetime_model(interval, t_on, c_bleach);
    let v2 = value * value;
    (
        value,
        Vector2::new(v2 / (t_on * t_on), v2 / (c_bleach * c_bleach * interval)),
    )
}

/// Rows usable for the fit
///
/// Drops rows with a non-finite lifetime, with a set but non-finite error,
/// or with fewer than `min_track_count` tracks.
pub fn prepare_apparent_lifetimes(
    table: &ApparentLifetimeTable,
    min_track_count: usize,
) -> Vec<ApparentLifetimeRow> {
    table
        .rows()
        .iter()
        .filter(|r| {
            r.lifetime_app.is_finite()
                && r.lifetime_app_err.map_or(true, f64::is_finite)
                && r.track_count >= min_track_count
        })
        .copied()
        .collect()
}

/// Starting point `(t_on, c_bleach)` from the linearized model
///
/// A straight line through `(1/Δt, 1/τ_app)` gives `k_bleach` (slope) and
/// `k_off` (intercept). Noise can make either negative, so they are clamped
/// to `1/max_init_bleach` and `1/max_init_lifetime` before inverting.
pub fn initial_guess(
    intervals: &[f64],
    lifetimes: &[f64],
    max_init_lifetime: f64,
    max_init_bleach: f64,
) -> (f64, f64) {
    let inv_x: Vec<f64> = intervals.iter().map(|v| 1.0 / v).collect();
    let inv_y: Vec<f64> = lifetimes.iter().map(|v| 1.0 / v).collect();
    let (k_bleach, k_off) = linear::fit_line(&inv_x, &inv_y);
    let k_off = k_off.max(1.0 / max_init_lifetime);
    let k_bleach = k_bleach.max(1.0 / max_init_bleach);
    (1.0 / k_off, 1.0 / k_bleach)
}

/// Fit the two-rate model, reporting why it failed
///
/// Rows are weighted by `1/lifetime_app_err` when every usable row carries a
/// positive error; the covariance is then taken as absolute. Otherwise the
/// fit is unweighted and the covariance is scaled by the residual variance.
/// An inestimable covariance leaves the values intact and sets the errors
/// to NaN.
///
/// # Errors
///
/// - `FitError::InsufficientData` for fewer than two usable rows
/// - `FitError::NonConvergence` / `FitError::NonFinite` from the solver
pub fn try_fit_lifetime(
    table: &ApparentLifetimeTable,
    config: &AnalysisConfig,
) -> Result<LifetimeResult, FitError> {
    let rows = prepare_apparent_lifetimes(table, config.min_track_count);
    if rows.len() < 2 {
        return Err(FitError::InsufficientData {
            available: rows.len(),
            required: 2,
        });
    }

    let intervals: Vec<f64> = rows.iter().map(|r| r.interval).collect();
    let lifetimes: Vec<f64> = rows.iter().map(|r| r.lifetime_app).collect();
    let sigma: Option<Vec<f64>> = rows
        .iter()
        .map(|r| r.lifetime_app_err.filter(|e| *e > 0.0))
        .collect();

    let (t_init, c_init) = initial_guess(
        &intervals,
        &lifetimes,
        config.max_init_lifetime,
        config.max_init_bleach,
    );
    if !t_init.is_finite() || !c_init.is_finite() {
        return Err(FitError::NonFinite(format!(
            "initial guess ({}, {})",
            t_init, c_init
        )));
    }

    let solution = levenberg_marquardt::solve(
        &model_with_gradient,
        &intervals,
        &lifetimes,
        sigma.as_deref(),
        Vector2::new(t_init, c_init),
        config.max_fit_iterations,
    )?;

    let (lifetime, bleach) = (solution.params[0], solution.params[1]);
    if !lifetime.is_finite() || !bleach.is_finite() {
        return Err(FitError::NonFinite(format!(
            "fit result ({}, {})",
            lifetime, bleach
        )));
    }

    let dof = rows.len() - 2;
    let scale = match (&sigma, dof) {
        (Some(_), _) => Some(1.0),
        (None, 0) => None,
        (None, dof) => Some(solution.chi_squared / dof as f64),
    };
    let (lifetime_err, bleach_err) = match (scale, solution.normal_matrix.try_inverse()) {
        (Some(s), Some(cov)) if cov[(0, 0)] >= 0.0 && cov[(1, 1)] >= 0.0 => {
            ((cov[(0, 0)] * s).sqrt(), (cov[(1, 1)] * s).sqrt())
        }
        _ => {
            log::debug!("Covariance of lifetime fit could not be estimated");
            (f64::NAN, f64::NAN)
        }
    };

    log::debug!(
        "Lifetime fit: t_on={:.4} ± {:.4}, c_bleach={:.4} ± {:.4} \
         ({} rows, {} iterations, weighted={})",
        lifetime,
        lifetime_err,
        bleach,
        bleach_err,
        rows.len(),
        solution.iterations,
        sigma.is_some()
    );

    Ok(LifetimeResult {
        lifetime,
        bleach,
        lifetime_err: Some(lifetime_err),
        bleach_err: Some(bleach_err),
    })
}

/// Fit the two-rate model; any failure yields an all-NaN result
pub fn fit_lifetime(table: &ApparentLifetimeTable, config: &AnalysisConfig) -> LifetimeResult {
    try_fit_lifetime(table, config).unwrap_or_else(|err| {
        log::debug!("Lifetime fit failed: {}", err);
        LifetimeResult::nan()
    })
}
