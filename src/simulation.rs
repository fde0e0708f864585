//! Synthetic track populations
//!
//! Draws bound times from the two-rate model: at frame interval `Δt` a
//! track lasts an exponential time with mean `τ_app(Δt)`. Tracks start at a
//! uniformly random frame; a track of continuous duration `D` frames spans
//! `floor(D) + 1` frames and is cut at the end of the recording.

use rand::Rng;

use crate::fitting::lifetime_model;
use crate::tracks::{IntervalObservationSet, TrackStats};

/// Simulate the track statistics of one recording
///
/// # Arguments
///
/// * `interval` - Time per frame
/// * `n_tracks` - Number of tracks
/// * `t_on` - True bound lifetime
/// * `c_bleach` - Bleaching constant
/// * `n_frames` - Recording length in frames
/// * `rng` - Random source
pub fn simulate_track_stats<R: Rng + ?Sized>(
    interval: f64,
    n_tracks: usize,
    t_on: f64,
    c_bleach: f64,
    n_frames: u64,
    rng: &mut R,
) -> Vec<TrackStats> {
    let mean_frames = lifetime_model(interval, t_on, c_bleach) / interval;
    let last_frame = n_frames.max(1) as i64 - 1;
    (0..n_tracks)
        .map(|i| {
            let start = rng.gen_range(0..=last_frame);
            let u: f64 = rng.gen();
            let duration = -mean_frames * (1.0 - u).ln();
            let end = (start + duration.floor() as i64).min(last_frame);
            TrackStats::from_span(i as u64, start, end, Some(n_frames))
        })
        .collect()
}

/// Simulate one recording per interval
pub fn simulate_dataset<R: Rng + ?Sized>(
    intervals: &[f64],
    n_tracks: usize,
    t_on: f64,
    c_bleach: f64,
    n_frames: u64,
    rng: &mut R,
) -> IntervalObservationSet {
    let mut set = IntervalObservationSet::new();
    for &interval in intervals {
        let tracks = simulate_track_stats(interval, n_tracks, t_on, c_bleach, n_frames, rng);
        set.insert(interval, "sim", tracks);
    }
    set
}
