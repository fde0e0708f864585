//! Analysis metadata structures

use serde::{Deserialize, Serialize};

use crate::estimation::EstimatorMethod;

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Algorithm version
    pub algorithm_version: String,

    /// Apparent lifetime estimator used for the direct fit
    pub estimator: EstimatorMethod,

    /// Number of recording intervals
    pub n_intervals: usize,

    /// Number of tracks before filtering, all intervals
    pub n_tracks: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Conditions worth a second look (sparse intervals, failed fits)
    pub warnings: Vec<String>,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            estimator: EstimatorMethod::default(),
            n_intervals: 0,
            n_tracks: 0,
            processing_time_ms: 0.0,
            warnings: vec![],
        }
    }
}
