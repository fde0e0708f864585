//! Track statistics from frame-indexed detections
//!
//! # Example
//!
//! ```
//! use bondtime::tracks::{build_track_stats, Detection};
//!
//! let detections = vec![
//!     Detection::new(0, 0, 1.0, 1.0),
//!     Detection::new(0, 1, 1.1, 1.0),
//!     Detection::new(1, 4, 5.0, 5.0),
//!     Detection::new(1, 7, 5.1, 5.0),
//! ];
//! let stats = build_track_stats(&detections, Some(10));
//! assert_eq!(stats.len(), 2);
//! assert_eq!(stats[0].track_len, 2);
//! assert_eq!(stats[1].track_len, 4);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use super::{CensorFlags, Detection, TrackStats};

#[derive(Default)]
struct TrackAccumulator {
    start: i64,
    end: i64,
    mass_sum: f64,
    mass_count: usize,
    bg_sum: f64,
    bg_count: usize,
    filter_param: Option<i32>,
    filter_manual: Option<i32>,
    segments: BTreeSet<i64>,
}

impl TrackAccumulator {
    fn new(first: &Detection) -> Self {
        Self {
            start: first.frame,
            end: first.frame,
            filter_param: first.filter_param,
            filter_manual: first.filter_manual,
            ..Default::default()
        }
    }

    fn push(&mut self, det: &Detection) {
        self.start = self.start.min(det.frame);
        self.end = self.end.max(det.frame);
        if let Some(m) = det.mass {
            self.mass_sum += m;
            self.mass_count += 1;
        }
        if let Some(b) = det.bg {
            self.bg_sum += b;
            self.bg_count += 1;
        }
        // First value per particle wins
        if self.filter_param.is_none() {
            self.filter_param = det.filter_param;
        }
        if self.filter_manual.is_none() {
            self.filter_manual = det.filter_manual;
        }
        if let Some(s) = det.segment {
            self.segments.insert(s);
        }
    }

    fn finish(self, particle: u64, n_frames: Option<u64>, segmented: bool) -> TrackStats {
        let mean = |sum: f64, count: usize| {
            if count > 0 {
                sum / count as f64
            } else {
                f64::NAN
            }
        };
        TrackStats {
            particle,
            start: self.start,
            end: self.end,
            track_len: (self.end - self.start + 1) as u32,
            censored: CensorFlags::from_span(self.start, self.end, n_frames),
            mass: mean(self.mass_sum, self.mass_count),
            bg: mean(self.bg_sum, self.bg_count),
            filter_param: self.filter_param,
            filter_manual: self.filter_manual,
            changepoints: segmented.then(|| self.segments.len().saturating_sub(1) as u32),
        }
    }
}

/// Build one `TrackStats` row per particle
///
/// Interpolated padding frames (`extra_frame != 0`) are dropped first so
/// they do not stretch tracks or fake censoring.
///
/// # Arguments
///
/// * `detections` - Detections of one recording, in any order
/// * `n_frames` - Total frame count of the recording; `None` if unknown
///
/// # Returns
///
/// Track statistics sorted by particle id. Empty input gives an empty table.
pub fn build_track_stats(detections: &[Detection], n_frames: Option<u64>) -> Vec<TrackStats> {
    if n_frames.is_none() && !detections.is_empty() {
        log::warn!("Number of frames unknown, right-censoring cannot be determined");
    }

    let segmented = detections.iter().any(|d| d.segment.is_some());
    let mut tracks: BTreeMap<u64, TrackAccumulator> = BTreeMap::new();
    for det in detections.iter().filter(|d| d.extra_frame == 0) {
        tracks
            .entry(det.particle)
            .or_insert_with(|| TrackAccumulator::new(det))
            .push(det);
    }

    log::debug!(
        "Built stats for {} tracks from {} detections",
        tracks.len(),
        detections.len()
    );

    tracks
        .into_iter()
        .map(|(particle, acc)| acc.finish(particle, n_frames, segmented))
        .collect()
}
