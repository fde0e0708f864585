//! Analysis result types

use serde::{Deserialize, Serialize};

use super::metadata::AnalysisMetadata;
use crate::config::AnalysisConfig;
use crate::error::FitError;
use crate::estimation::{ApparentLifetimeRow, ApparentLifetimeTable};
use crate::fitting::{prepare_apparent_lifetimes, LifetimeResult};
use crate::tracks::CensorComposition;

/// Bootstrap bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSummary {
    /// Number of resamples drawn
    pub n_resamples: usize,
    /// Resamples rejected as outliers
    pub n_outliers: usize,
    /// Seed of the resampling RNG, if one was given
    pub seed: Option<u64>,
}

/// Complete analysis result
///
/// Assembled once after every stage ran; nothing is updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeAnalysis {
    /// Configuration the analysis ran with
    pub config: AnalysisConfig,

    /// Apparent lifetime per interval (bootstrap mean ± std if bootstrapped)
    pub apparent_lifetimes: ApparentLifetimeTable,

    /// Bound lifetime and bleaching constant
    pub lifetime: LifetimeResult,

    /// Why the direct fit produced no answer, if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_error: Option<FitError>,

    /// Bootstrap bookkeeping, if the bootstrap ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<BootstrapSummary>,

    /// Censoring composition of the accepted tracks per interval
    pub censor_composition: Vec<CensorComposition>,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

impl LifetimeAnalysis {
    /// Apparent lifetime rows that entered (or would enter) the two-rate fit
    pub fn fitted_rows(&self) -> Vec<ApparentLifetimeRow> {
        prepare_apparent_lifetimes(&self.apparent_lifetimes, self.config.min_track_count)
    }

    /// Bound half-life `ln 2 · lifetime`
    pub fn half_life(&self) -> f64 {
        std::f64::consts::LN_2 * self.lifetime.lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> LifetimeAnalysis {
        let rows = [(0.01, 50), (0.02, 4), (0.04, 50)]
            .iter()
            .map(|&(interval, track_count)| ApparentLifetimeRow {
                interval,
                lifetime_app: 0.5,
                lifetime_app_err: Some(0.05),
                track_count,
            })
            .collect();
        LifetimeAnalysis {
            config: AnalysisConfig::default(),
            apparent_lifetimes: ApparentLifetimeTable::from_rows(rows),
            lifetime: LifetimeResult {
                lifetime: 2.0,
                bleach: 50.0,
                lifetime_err: Some(0.1),
                bleach_err: Some(2.0),
            },
            fit_error: None,
            bootstrap: None,
            censor_composition: vec![],
            metadata: AnalysisMetadata::default(),
        }
    }

    #[test]
    fn test_fitted_rows_drop_sparse_intervals() {
        let rows = analysis().fitted_rows();
        let intervals: Vec<f64> = rows.iter().map(|r| r.interval).collect();
        assert_eq!(intervals, vec![0.01, 0.04]);
    }

    #[test]
    fn test_half_life() {
        let a = analysis();
        assert!((a.half_life() - std::f64::consts::LN_2 * 2.0).abs() < 1e-12);
    }
}
