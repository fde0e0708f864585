//! Track populations grouped by recording interval and source file

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::filter::select_tracks;
use super::TrackStats;

/// Track statistics of all files recorded at one frame interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalTracks {
    /// Time per frame
    pub interval: f64,

    /// File id -> track statistics of that file
    pub files: BTreeMap<String, Vec<TrackStats>>,
}

impl IntervalTracks {
    /// All tracks of this interval, concatenated in file id order
    pub fn pooled(&self) -> Vec<TrackStats> {
        self.files.values().flatten().cloned().collect()
    }

    /// Total number of tracks before any filtering
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// No tracks in any file
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mapping recording interval -> pooled track statistics
///
/// Entries are kept sorted by interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalObservationSet {
    entries: Vec<IntervalTracks>,
}

/// Number of tracks per censoring type at one interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CensorComposition {
    /// Time per frame
    pub interval: f64,

    /// Counts indexed by censoring flags: within, at start, at end, both
    pub counts: [usize; 4],
}

impl IntervalObservationSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the track statistics of one file
    pub fn insert(&mut self, interval: f64, file_id: impl Into<String>, tracks: Vec<TrackStats>) {
        let file_id = file_id.into();
        match self
            .entries
            .binary_search_by(|e| e.interval.total_cmp(&interval))
        {
            Ok(idx) => {
                self.entries[idx].files.insert(file_id, tracks);
            }
            Err(idx) => {
                let mut files = BTreeMap::new();
                files.insert(file_id, tracks);
                self.entries.insert(idx, IntervalTracks { interval, files });
            }
        }
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with_file(
        mut self,
        interval: f64,
        file_id: impl Into<String>,
        tracks: Vec<TrackStats>,
    ) -> Self {
        self.insert(interval, file_id, tracks);
        self
    }

    /// Per-interval entries in ascending interval order
    pub fn intervals(&self) -> &[IntervalTracks] {
        &self.entries
    }

    /// Number of distinct intervals
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No intervals
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pooled, unfiltered tracks per interval
    pub fn pooled(&self) -> Vec<(f64, Vec<TrackStats>)> {
        self.entries
            .iter()
            .map(|e| (e.interval, e.pooled()))
            .collect()
    }

    /// Pooled tracks per interval that pass quality filters and the length threshold
    pub fn accepted(&self, min_track_length: u32) -> Vec<(f64, Vec<TrackStats>)> {
        self.entries
            .iter()
            .map(|e| (e.interval, select_tracks(&e.pooled(), min_track_length)))
            .collect()
    }

    /// Censoring composition of the accepted tracks, one row per interval
    pub fn censor_composition(&self, min_track_length: u32) -> Vec<CensorComposition> {
        self.accepted(min_track_length)
            .into_iter()
            .map(|(interval, tracks)| {
                let mut counts = [0usize; 4];
                for t in &tracks {
                    counts[t.censored.bits() as usize] += 1;
                }
                CensorComposition { interval, counts }
            })
            .collect()
    }
}
