//! Integration tests for the lifetime analysis pipeline

use bondtime::report::format::{format_value_with_uncertainty, round_value_with_uncertainty};
use bondtime::simulation::simulate_dataset;
use bondtime::tracks::apply_quality_filters;
use bondtime::{
    analyze_lifetimes, build_track_stats, AnalysisConfig, Detection, EstimatorMethod, FitError,
    IntervalObservationSet,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn dataset(
    intervals: &[f64],
    n_tracks: usize,
    t_on: f64,
    c_bleach: f64,
    seed: u64,
) -> IntervalObservationSet {
    let mut rng = StdRng::seed_from_u64(seed);
    simulate_dataset(intervals, n_tracks, t_on, c_bleach, 100_000, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apparent_lifetimes_increase_with_interval() {
        let set = dataset(&[0.01, 0.02, 0.04], 200, 2.0, 0.5, 1);
        let config = AnalysisConfig {
            min_track_length: 1,
            ..Default::default()
        };

        let analysis = analyze_lifetimes(&set, &config).expect("Analysis should succeed");
        let lifetimes = analysis.apparent_lifetimes.lifetimes();

        assert_eq!(lifetimes.len(), 3);
        assert!(lifetimes.iter().all(|&lt| lt > 0.0 && lt < 2.0), "{:?}", lifetimes);
        assert!(lifetimes.windows(2).all(|w| w[0] < w[1]), "{:?}", lifetimes);

        // Bleaching dominates (about half a frame at every interval), so only
        // the bleaching constant is identifiable here, not t_on
        let bleach = analysis.lifetime.bleach;
        assert!((bleach - 0.5).abs() < 0.1, "bleach {}", bleach);
    }

    #[test]
    fn test_recovers_true_lifetime() {
        let set = dataset(&[0.01, 0.02, 0.04, 0.08], 3000, 2.0, 100.0, 2);
        let analysis =
            analyze_lifetimes(&set, &AnalysisConfig::default()).expect("Analysis should succeed");

        assert!(analysis.fit_error.is_none());
        let fit = analysis.lifetime;
        assert!((fit.lifetime - 2.0).abs() < 0.4, "lifetime {}", fit.lifetime);
        assert!((fit.bleach - 100.0).abs() < 20.0, "bleach {}", fit.bleach);
        assert!(fit.lifetime_err.map_or(false, |e| e.is_finite() && e > 0.0));
        assert_eq!(analysis.metadata.n_intervals, 4);
        assert_eq!(analysis.metadata.n_tracks, 12_000);
        assert_eq!(analysis.metadata.estimator, EstimatorMethod::Survival);
        assert_eq!(analysis.censor_composition.len(), 4);
    }

    #[test]
    fn test_estimators_cover_the_same_intervals() {
        let set = dataset(&[0.01, 0.02, 0.04, 0.08], 2000, 2.0, 100.0, 3);
        let survival = analyze_lifetimes(&set, &AnalysisConfig::default()).unwrap();
        let basic = analyze_lifetimes(
            &set,
            &AnalysisConfig {
                estimator: EstimatorMethod::Basic,
                ..Default::default()
            },
        )
        .unwrap();

        for (s, b) in survival
            .apparent_lifetimes
            .rows()
            .iter()
            .zip(basic.apparent_lifetimes.rows())
        {
            assert_eq!(s.interval, b.interval);
            assert!(b.lifetime_app.is_finite());
        }
        assert_eq!(basic.metadata.estimator, EstimatorMethod::Basic);
    }

    #[test]
    fn test_bootstrap_is_deterministic_for_a_seed() {
        let set = dataset(&[0.01, 0.02, 0.04, 0.08], 400, 2.0, 100.0, 4);
        let config = AnalysisConfig {
            n_boot: 20,
            random_seed: Some(42),
            ..Default::default()
        };

        let first = analyze_lifetimes(&set, &config).unwrap();
        let second = analyze_lifetimes(&set, &config).unwrap();

        assert_eq!(first.lifetime, second.lifetime);
        assert_eq!(first.apparent_lifetimes, second.apparent_lifetimes);
        let summary = first.bootstrap.expect("bootstrap should have run");
        assert_eq!(summary.n_resamples, 20);
        assert_eq!(summary.seed, Some(42));
        assert!(first.lifetime.lifetime_err.map_or(false, |e| e > 0.0));
        assert!(first
            .apparent_lifetimes
            .rows()
            .iter()
            .all(|r| r.lifetime_app_err.map_or(false, |e| e.is_finite())));
    }

    #[test]
    fn test_failed_bootstrap_reports_cause() {
        let set = dataset(&[0.02], 300, 2.0, 100.0, 3);
        let config = AnalysisConfig {
            n_boot: 10,
            random_seed: Some(3),
            ..Default::default()
        };
        let analysis = analyze_lifetimes(&set, &config).expect("data problems never abort");

        assert!(analysis.lifetime.lifetime.is_nan());
        assert_eq!(analysis.bootstrap.map(|b| b.n_outliers), Some(10));
        assert_eq!(
            analysis.fit_error,
            Some(FitError::InsufficientData {
                available: 0,
                required: 1
            })
        );
        assert!(analysis
            .metadata
            .warnings
            .iter()
            .any(|w| w.starts_with("Lifetime fit failed")));
    }

    #[test]
    fn test_single_resample_disables_bootstrap() {
        let set = dataset(&[0.01, 0.02, 0.04], 300, 2.0, 100.0, 5);
        let config = AnalysisConfig {
            n_boot: 1,
            ..Default::default()
        };
        let analysis = analyze_lifetimes(&set, &config).unwrap();
        assert!(analysis.bootstrap.is_none());
    }

    #[test]
    fn test_too_few_intervals_gives_nan_without_error() {
        let set = dataset(&[0.02], 300, 2.0, 100.0, 6);
        let analysis =
            analyze_lifetimes(&set, &AnalysisConfig::default()).expect("data problems never abort");

        assert!(analysis.lifetime.lifetime.is_nan());
        assert!(analysis.lifetime.bleach.is_nan());
        assert_eq!(
            analysis.fit_error,
            Some(FitError::InsufficientData {
                available: 1,
                required: 2
            })
        );
        assert!(!analysis.metadata.warnings.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnalysisConfig {
            min_track_length: 0,
            ..Default::default()
        };
        assert!(analyze_lifetimes(&IntervalObservationSet::new(), &config).is_err());
    }

    #[test]
    fn test_detections_to_apparent_lifetimes() {
        // Two tracks in a 10-frame movie, one with a padding frame
        let mut detections = Vec::new();
        for frame in 2..6 {
            detections.push(Detection::new(1, frame, 1.0, 1.0));
        }
        for frame in 7..10 {
            detections.push(Detection::new(2, frame, 5.0, 5.0));
        }
        let mut pad = Detection::new(2, 10, 5.0, 5.0);
        pad.extra_frame = 1;
        detections.push(pad);

        let stats = apply_quality_filters(&build_track_stats(&detections, Some(10)));
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].track_len, 4);
        assert_eq!(stats[1].track_len, 3);
        assert!(stats[1].censored.at_end());

        let set = IntervalObservationSet::new().with_file(0.05, "movie", stats);
        let table =
            bondtime::estimation::compute_apparent_lifetimes(&set, EstimatorMethod::Basic, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].track_count, 2);
    }

    #[test]
    fn test_empty_detections() {
        assert!(build_track_stats(&[], Some(100)).is_empty());
    }

    #[test]
    fn test_result_serializes_to_json() {
        let set = dataset(&[0.01, 0.04], 300, 2.0, 100.0, 8);
        let analysis = analyze_lifetimes(&set, &AnalysisConfig::default()).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json["lifetime"]["lifetime"].is_number());
        assert_eq!(json["config"]["min_track_length"], 2);
    }

    #[test]
    fn test_formatted_result_is_stable() {
        let set = dataset(&[0.01, 0.02, 0.04, 0.08], 1000, 2.0, 100.0, 9);
        let fit = analyze_lifetimes(&set, &AnalysisConfig::default()).unwrap().lifetime;
        let err = fit.lifetime_err.unwrap();

        let (v, e) = round_value_with_uncertainty(fit.lifetime, err, 2, true);
        let again = format_value_with_uncertainty(v.parse().unwrap(), e.parse().unwrap(), 2, true);
        assert_eq!(again, format!("{} ± {}", v, e));
    }
}
