//! Apparent lifetime estimation per recording interval
//!
//! Two interchangeable estimators turn the track lengths recorded at one
//! frame interval into an apparent lifetime (bound time shortened by
//! bleaching):
//! - Survival: interval-censored exponential maximum likelihood
//! - Basic: sample mean with continuity correction
//!
//! Both first drop tracks rejected by quality filters and tracks shorter
//! than the minimum length.

pub mod basic;
pub mod survival;

use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::tracks::filter::select_tracks;
use crate::tracks::{IntervalObservationSet, TrackStats};

/// Apparent lifetime estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorMethod {
    /// Interval-censored exponential fit with left truncation
    #[default]
    Survival,
    /// Mean track length above the truncation floor
    Basic,
}

/// Apparent lifetime of one interval's tracks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApparentLifetime {
    /// Apparent lifetime in time units (NaN if not estimable)
    pub lifetime: f64,
    /// Standard error in time units (NaN if not estimable)
    pub error: f64,
    /// Number of tracks that entered the estimate
    pub n_used: usize,
}

impl EstimatorMethod {
    /// Short method name
    pub fn name(self) -> &'static str {
        match self {
            EstimatorMethod::Survival => "survival",
            EstimatorMethod::Basic => "basic",
        }
    }

    /// Estimate the apparent lifetime, reporting why it failed
    ///
    /// # Arguments
    ///
    /// * `tracks` - Unfiltered track statistics recorded at `interval`
    /// * `interval` - Time per frame
    /// * `min_track_length` - Shortest track length (frames) that is observable
    ///
    /// # Errors
    ///
    /// `FitError` if no tracks survive the filters or the fit breaks down.
    pub fn try_estimate(
        self,
        tracks: &[TrackStats],
        interval: f64,
        min_track_length: u32,
    ) -> Result<ApparentLifetime, FitError> {
        let selected = select_tracks(tracks, min_track_length);
        let (lifetime, error) = self.estimate_selected(&selected, interval, min_track_length)?;
        Ok(ApparentLifetime {
            lifetime,
            error,
            n_used: selected.len(),
        })
    }

    /// Estimate the apparent lifetime; failures become NaN
    ///
    /// `n_used` is reported even when the estimate fails.
    pub fn estimate(
        self,
        tracks: &[TrackStats],
        interval: f64,
        min_track_length: u32,
    ) -> ApparentLifetime {
        let selected = select_tracks(tracks, min_track_length);
        let n_used = selected.len();
        match self.estimate_selected(&selected, interval, min_track_length) {
            Ok((lifetime, error)) => ApparentLifetime {
                lifetime,
                error,
                n_used,
            },
            Err(err) => {
                log::debug!(
                    "{} estimate at interval {} failed: {}",
                    self.name(),
                    interval,
                    err
                );
                ApparentLifetime {
                    lifetime: f64::NAN,
                    error: f64::NAN,
                    n_used,
                }
            }
        }
    }

    pub(crate) fn estimate_selected(
        self,
        selected: &[TrackStats],
        interval: f64,
        min_track_length: u32,
    ) -> Result<(f64, f64), FitError> {
        match self {
            EstimatorMethod::Survival => survival::estimate(selected, interval, min_track_length),
            EstimatorMethod::Basic => basic::estimate(selected, interval, min_track_length),
        }
    }
}

/// Apparent lifetime at one recording interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApparentLifetimeRow {
    /// Time per frame
    pub interval: f64,
    /// Apparent lifetime
    pub lifetime_app: f64,
    /// Uncertainty of `lifetime_app`; `None` if not provided
    pub lifetime_app_err: Option<f64>,
    /// Tracks used for the estimate
    pub track_count: usize,
}

/// Apparent lifetimes, one row per interval in ascending interval order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApparentLifetimeTable {
    rows: Vec<ApparentLifetimeRow>,
}

impl ApparentLifetimeTable {
    /// Table from rows in any order
    pub fn from_rows(mut rows: Vec<ApparentLifetimeRow>) -> Self {
        rows.sort_by(|a, b| a.interval.total_cmp(&b.interval));
        Self { rows }
    }

    /// Rows in ascending interval order
    pub fn rows(&self) -> &[ApparentLifetimeRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Interval column
    pub fn intervals(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.interval).collect()
    }

    /// Apparent lifetime column
    pub fn lifetimes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.lifetime_app).collect()
    }
}

/// Estimate the apparent lifetime at every interval of `tracks`
pub fn compute_apparent_lifetimes(
    tracks: &IntervalObservationSet,
    method: EstimatorMethod,
    min_track_length: u32,
) -> ApparentLifetimeTable {
    let rows = tracks
        .pooled()
        .into_iter()
        .map(|(interval, pooled)| {
            let est = method.estimate(&pooled, interval, min_track_length);
            log::debug!(
                "Interval {}: apparent lifetime {:.4} ± {:.4} from {} tracks",
                interval,
                est.lifetime,
                est.error,
                est.n_used
            );
            ApparentLifetimeRow {
                interval,
                lifetime_app: est.lifetime,
                lifetime_app_err: Some(est.error),
                track_count: est.n_used,
            }
        })
        .collect();
    ApparentLifetimeTable::from_rows(rows)
}
