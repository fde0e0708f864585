//! Track selection
//!
//! Quality filters are decided upstream (threshold and manual review); here
//! we only honour the decisions. A filter that was never run (`None`) does
//! not reject anything.

use super::TrackStats;

/// Keep tracks accepted by every quality filter that was run
pub fn apply_quality_filters(tracks: &[TrackStats]) -> Vec<TrackStats> {
    tracks.iter().filter(|t| t.is_accepted()).cloned().collect()
}

/// Keep tracks of at least `min_track_length` frames
pub fn filter_min_length(tracks: &[TrackStats], min_track_length: u32) -> Vec<TrackStats> {
    tracks
        .iter()
        .filter(|t| t.track_len >= min_track_length)
        .cloned()
        .collect()
}

/// Quality filters followed by the length filter
pub(crate) fn select_tracks(tracks: &[TrackStats], min_track_length: u32) -> Vec<TrackStats> {
    tracks
        .iter()
        .filter(|t| t.is_accepted() && t.track_len >= min_track_length)
        .cloned()
        .collect()
}
