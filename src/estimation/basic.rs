//! Sample-mean lifetime estimator
//!
//! Ignores censoring. The mean excess length above the truncation floor
//! plus a half-frame continuity correction, scaled to time units.

use crate::error::FitError;
use crate::stats::{mean, std_dev};
use crate::tracks::TrackStats;

/// Apparent lifetime and standard error of the mean of already selected tracks
pub(crate) fn estimate(
    tracks: &[TrackStats],
    interval: f64,
    min_track_length: u32,
) -> Result<(f64, f64), FitError> {
    if tracks.is_empty() {
        return Err(FitError::InsufficientData {
            available: 0,
            required: 1,
        });
    }
    let lengths: Vec<f64> = tracks.iter().map(|t| t.track_len as f64).collect();
    let lifetime = (mean(&lengths) - min_track_length as f64 + 0.5) * interval;
    let sem = std_dev(&lengths, 1) / (lengths.len() as f64).sqrt() * interval;
    Ok((lifetime, sem))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(lengths: &[i64]) -> Vec<TrackStats> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &l)| TrackStats::from_span(i as u64, 5, 5 + l - 1, Some(1000)))
            .collect()
    }

    #[test]
    fn test_basic_estimate() {
        let (lt, err) = estimate(&tracks(&[2, 3, 4, 5]), 0.1, 2).unwrap();
        // mean 3.5 - 2 + 0.5 = 2 frames
        assert!((lt - 0.2).abs() < 1e-12);
        let expected_sem = 1.290_994_448_735_805_6 / 2.0 * 0.1;
        assert!((err - expected_sem).abs() < 1e-12);
    }

    #[test]
    fn test_single_track_has_no_error() {
        let (lt, err) = estimate(&tracks(&[4]), 1.0, 1).unwrap();
        assert!((lt - 3.5).abs() < 1e-12);
        assert!(err.is_nan());
    }

    #[test]
    fn test_empty_is_insufficient() {
        assert!(matches!(
            estimate(&[], 1.0, 2),
            Err(FitError::InsufficientData { .. })
        ));
    }
}
