//! Configuration parameters for lifetime analysis

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::estimation::EstimatorMethod;

/// Analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Track selection
    /// Minimum track length in frames (default: 2)
    /// Shorter tracks are treated as unobservable and excluded before any statistics
    pub min_track_length: u32,

    /// Minimum number of tracks per interval (default: 10)
    /// Intervals with fewer surviving tracks are left out of the two-rate fit
    pub min_track_count: usize,

    // Apparent lifetime estimation
    /// Estimator for the per-interval apparent lifetime (default: Survival)
    pub estimator: EstimatorMethod,

    // Two-rate fit
    /// Upper bound for the initial lifetime guess (default: 1e7)
    /// Guards against negative or vanishing intercepts of the linearized fit
    pub max_init_lifetime: f64,

    /// Upper bound for the initial bleaching constant guess (default: 1e3)
    pub max_init_bleach: f64,

    /// Iteration limit of the Levenberg-Marquardt solver (default: 200)
    pub max_fit_iterations: usize,

    // Bootstrap
    /// Number of bootstrap resamples (default: 0)
    /// 0 or 1 disables the bootstrap and reports the direct fit
    pub n_boot: usize,

    /// Seed for the resampling RNG (default: None = OS entropy)
    pub random_seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_track_length: 2,
            min_track_count: 10,
            estimator: EstimatorMethod::Survival,
            max_init_lifetime: 1e7,
            max_init_bleach: 1e3,
            max_fit_iterations: 200,
            n_boot: 0,
            random_seed: None,
        }
    }
}

impl AnalysisConfig {
    /// Check parameters for values the pipeline cannot work with
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero minimum track length,
    /// non-positive initial guess ceilings or a zero iteration limit.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.min_track_length == 0 {
            return Err(AnalysisError::InvalidInput(
                "min_track_length must be at least 1".to_string(),
            ));
        }
        if !(self.max_init_lifetime > 0.0) || !(self.max_init_bleach > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Initial guess ceilings must be positive, got lifetime={} bleach={}",
                self.max_init_lifetime, self.max_init_bleach
            )));
        }
        if self.max_fit_iterations == 0 {
            return Err(AnalysisError::InvalidInput(
                "max_fit_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the bootstrap replaces the direct fit
    pub fn bootstrap_enabled(&self) -> bool {
        self.n_boot >= 2
    }

    /// Apply options stored alongside a saved dataset
    ///
    /// Reads `filter_options.min_length` and `fit_options.min_count` from a
    /// metadata document; absent or mistyped keys leave the current values.
    pub fn with_saved_options(mut self, metadata: &serde_json::Value) -> Self {
        if let Some(min_length) = metadata
            .pointer("/filter_options/min_length")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
        {
            self.min_track_length = min_length;
        }
        if let Some(min_count) = metadata
            .pointer("/fit_options/min_count")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
        {
            self.min_track_count = min_count;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.bootstrap_enabled());
    }

    #[test]
    fn test_validate_rejects_zero_min_length() {
        let config = AnalysisConfig {
            min_track_length: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_bootstrap_threshold() {
        let mut config = AnalysisConfig::default();
        config.n_boot = 1;
        assert!(!config.bootstrap_enabled());
        config.n_boot = 2;
        assert!(config.bootstrap_enabled());
    }

    #[test]
    fn test_saved_options() {
        let md = json!({
            "filter_options": {"min_length": 5},
            "fit_options": {"min_count": 25},
            "data_dir": "/data"
        });
        let config = AnalysisConfig::default().with_saved_options(&md);
        assert_eq!(config.min_track_length, 5);
        assert_eq!(config.min_track_count, 25);

        let config = AnalysisConfig::default().with_saved_options(&json!({}));
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_saved_options_out_of_range_are_ignored() {
        let md = json!({
            "filter_options": {"min_length": 5_000_000_000u64},
            "fit_options": {"min_count": -3}
        });
        let config = AnalysisConfig::default().with_saved_options(&md);
        assert_eq!(config.min_track_length, 2);
        assert_eq!(config.min_track_count, 10);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"n_boot": 100, "random_seed": 7}"#).unwrap();
        assert_eq!(config.n_boot, 100);
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.min_track_length, 2);
    }
}
