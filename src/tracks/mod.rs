//! Per-track statistics and interval-grouped track populations
//!
//! - Track statistics from frame-indexed detections
//! - Quality and length filters
//! - Grouping by recording interval and source file

pub mod dataset;
pub mod filter;
pub mod stats;

use serde::{Deserialize, Serialize};

pub use dataset::{CensorComposition, IntervalObservationSet};
pub use filter::{apply_quality_filters, filter_min_length};
pub use stats::build_track_stats;

/// One localization of a tracked particle in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Track identifier assigned by the linker
    pub particle: u64,

    /// Frame index within the recording
    pub frame: i64,

    /// x coordinate
    pub x: f64,

    /// y coordinate
    pub y: f64,

    /// Integrated intensity, if measured
    pub mass: Option<f64>,

    /// Local background, if measured
    pub bg: Option<f64>,

    /// Non-zero for interpolated padding frames added before/after a track
    pub extra_frame: u8,

    /// Threshold filter decision (0 = accepted)
    pub filter_param: Option<i32>,

    /// Manual filter decision (0 = accepted, -1 = undecided)
    pub filter_manual: Option<i32>,

    /// Changepoint segment label of this frame
    pub segment: Option<i64>,
}

impl Detection {
    /// Detection with position only; all optional columns unset
    pub fn new(particle: u64, frame: i64, x: f64, y: f64) -> Self {
        Self {
            particle,
            frame,
            x,
            y,
            mass: None,
            bg: None,
            extra_frame: 0,
            filter_param: None,
            filter_manual: None,
            segment: None,
        }
    }
}

/// Censoring bit flags of a track
///
/// Bit 0: track touches the first frame (may have started earlier).
/// Bit 1: track touches the last frame (may continue after the recording).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CensorFlags(pub u8);

impl CensorFlags {
    /// Left-censoring bit
    pub const START: u8 = 1;
    /// Right-censoring bit
    pub const END: u8 = 2;

    /// Derive flags from the observed frame span
    ///
    /// `n_frames == None` means the recording length is unknown, so the end
    /// of a track can never be flagged.
    pub fn from_span(start: i64, end: i64, n_frames: Option<u64>) -> Self {
        let mut bits = 0;
        if start <= 0 {
            bits |= Self::START;
        }
        if let Some(n) = n_frames {
            if end >= n as i64 - 1 {
                bits |= Self::END;
            }
        }
        Self(bits)
    }

    /// Track may have begun before the recording
    pub fn at_start(self) -> bool {
        self.0 & Self::START != 0
    }

    /// Track may extend past the recording
    pub fn at_end(self) -> bool {
        self.0 & Self::END != 0
    }

    /// Raw value in 0..=3
    pub fn bits(self) -> u8 {
        self.0 & 3
    }
}

/// Summary statistics of one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
    /// Track identifier
    pub particle: u64,

    /// First observed frame
    pub start: i64,

    /// Last observed frame
    pub end: i64,

    /// Frame span `end - start + 1`, including gaps
    pub track_len: u32,

    /// Censoring flags
    pub censored: CensorFlags,

    /// Mean intensity (NaN if unavailable)
    pub mass: f64,

    /// Mean background (NaN if unavailable)
    pub bg: f64,

    /// Threshold filter decision; `None` if no such filter was run
    pub filter_param: Option<i32>,

    /// Manual filter decision; `None` if no such filter was run
    pub filter_manual: Option<i32>,

    /// Number of intensity changepoints, if segmented
    pub changepoints: Option<u32>,
}

impl TrackStats {
    /// Column names of the exported table, in order
    pub const COLUMNS: [&'static str; 9] = [
        "start",
        "end",
        "track_len",
        "censored",
        "bg",
        "mass",
        "filter_param",
        "filter_manual",
        "changepoints",
    ];

    /// Track stats from a known frame span with optional columns unset
    pub fn from_span(particle: u64, start: i64, end: i64, n_frames: Option<u64>) -> Self {
        Self {
            particle,
            start,
            end,
            track_len: (end - start + 1).max(1) as u32,
            censored: CensorFlags::from_span(start, end, n_frames),
            mass: f64::NAN,
            bg: f64::NAN,
            filter_param: None,
            filter_manual: None,
            changepoints: None,
        }
    }

    /// Track passes every quality filter that was run on it
    pub fn is_accepted(&self) -> bool {
        self.filter_param.map_or(true, |f| f == 0) && self.filter_manual.map_or(true, |f| f == 0)
    }
}
