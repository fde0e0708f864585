//! Bootstrap uncertainty of the lifetime fit
//!
//! Each resample draws every interval's track population with replacement
//! (same size), estimates the apparent lifetimes with the survival method
//! and fits the two-rate model. The reported lifetime and bleaching constant
//! are the mean and sample standard deviation over resamples after outlier
//! rejection, not a refit.
//!
//! Resample seeds are drawn up front from the master RNG and resamples are
//! collected in index order, so parallel execution gives the same result as
//! a sequential run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::estimation::{ApparentLifetimeRow, ApparentLifetimeTable, EstimatorMethod};
use crate::fitting::{fit_lifetime, LifetimeResult};
use crate::stats::{mean, nan_quantile, std_dev};
use crate::tracks::{IntervalObservationSet, TrackStats};

/// Resamples with `lifetime > Q3 + OUTLIER_IQR_FACTOR * IQR` are discarded
pub const OUTLIER_IQR_FACTOR: f64 = 20.0;

/// Aggregated bootstrap result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapOutcome {
    /// Mean and standard deviation of the apparent lifetimes across resamples
    pub apparent_lifetimes: ApparentLifetimeTable,
    /// Mean and standard deviation of the fit parameters across accepted resamples
    pub lifetime: LifetimeResult,
    /// Number of resamples drawn
    pub n_resamples: usize,
    /// Resamples discarded as outliers (including failed fits)
    pub n_outliers: usize,
}

struct Resample {
    apparent: Vec<ApparentLifetimeRow>,
    fit: LifetimeResult,
}

fn run_resample(
    population: &[(f64, Vec<TrackStats>)],
    config: &AnalysisConfig,
    seed: u64,
) -> Resample {
    let mut rng = StdRng::seed_from_u64(seed);
    let apparent: Vec<ApparentLifetimeRow> = population
        .iter()
        .map(|(interval, tracks)| {
            let n = tracks.len();
            let sample: Vec<TrackStats> = if n == 0 {
                Vec::new()
            } else {
                (0..n).map(|_| tracks[rng.gen_range(0..n)].clone()).collect()
            };
            let est =
                EstimatorMethod::Survival.estimate(&sample, *interval, config.min_track_length);
            ApparentLifetimeRow {
                interval: *interval,
                lifetime_app: est.lifetime,
                lifetime_app_err: Some(est.error),
                track_count: est.n_used,
            }
        })
        .collect();

    let fit = fit_lifetime(&ApparentLifetimeTable::from_rows(apparent.clone()), config);
    Resample { apparent, fit }
}

/// Boolean mask of resamples kept by the IQR outlier rule
///
/// Quartiles are taken over the finite-or-infinite lifetimes (NaN skipped).
/// A resample is kept if `0 < lifetime <= Q3 + 20·IQR`; NaN lifetimes are
/// never kept.
pub fn outlier_mask(lifetimes: &[f64]) -> Vec<bool> {
    let q1 = nan_quantile(lifetimes, 0.25);
    let q3 = nan_quantile(lifetimes, 0.75);
    let upper = q3 + OUTLIER_IQR_FACTOR * (q3 - q1);
    lifetimes
        .iter()
        .map(|&lt| lt > 0.0 && lt <= upper)
        .collect()
}

/// Bootstrap the full estimation pipeline
///
/// # Arguments
///
/// * `tracks` - Track statistics per interval
/// * `config` - Track selection and fit parameters
/// * `n_resamples` - Number of bootstrap resamples
/// * `seed` - RNG seed; `None` draws one from OS entropy
pub fn bootstrap_lifetime(
    tracks: &IntervalObservationSet,
    config: &AnalysisConfig,
    n_resamples: usize,
    seed: Option<u64>,
) -> BootstrapOutcome {
    // Filtering commutes with resampling, so do it once
    let population = tracks.accepted(config.min_track_length);

    let mut master = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let seeds: Vec<u64> = (0..n_resamples).map(|_| master.gen()).collect();

    log::debug!(
        "Bootstrapping {} resamples over {} intervals",
        n_resamples,
        population.len()
    );

    let resamples: Vec<Resample> = seeds
        .par_iter()
        .map(|&s| run_resample(&population, config, s))
        .collect();

    aggregate(&population, resamples)
}

fn aggregate(population: &[(f64, Vec<TrackStats>)], resamples: Vec<Resample>) -> BootstrapOutcome {
    let n_resamples = resamples.len();

    let rows: Vec<ApparentLifetimeRow> = match resamples.first() {
        None => population
            .iter()
            .map(|(interval, tracks)| ApparentLifetimeRow {
                interval: *interval,
                lifetime_app: f64::NAN,
                lifetime_app_err: Some(f64::NAN),
                track_count: tracks.len(),
            })
            .collect(),
        Some(first) => first
            .apparent
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let values: Vec<f64> =
                    resamples.iter().map(|r| r.apparent[i].lifetime_app).collect();
                ApparentLifetimeRow {
                    interval: row.interval,
                    lifetime_app: mean(&values),
                    lifetime_app_err: Some(std_dev(&values, 1)),
                    track_count: row.track_count,
                }
            })
            .collect(),
    };

    let lifetimes: Vec<f64> = resamples.iter().map(|r| r.fit.lifetime).collect();
    let keep = outlier_mask(&lifetimes);
    let (kept_lt, kept_bl): (Vec<f64>, Vec<f64>) = resamples
        .iter()
        .zip(&keep)
        .filter(|(_, &k)| k)
        .map(|(r, _)| (r.fit.lifetime, r.fit.bleach))
        .unzip();
    let n_outliers = n_resamples - kept_lt.len();

    if kept_lt.is_empty() && n_resamples > 0 {
        log::warn!("All {} bootstrap resamples were rejected", n_resamples);
    } else if n_outliers > 0 {
        log::debug!("Rejected {} of {} bootstrap resamples", n_outliers, n_resamples);
    }

    BootstrapOutcome {
        apparent_lifetimes: ApparentLifetimeTable::from_rows(rows),
        lifetime: LifetimeResult {
            lifetime: mean(&kept_lt),
            bleach: mean(&kept_bl),
            lifetime_err: Some(std_dev(&kept_lt, 1)),
            bleach_err: Some(std_dev(&kept_bl, 1)),
        },
        n_resamples,
        n_outliers,
    }
}
