//! Interval-censored exponential survival fit
//!
//! Counting frames only bounds a track's true (continuous) bound time: a
//! track seen in `L` frames lasted somewhere in `[L - 1, L)` frame
//! intervals. Tracks that reach the last frame of the recording are
//! right-censored, their upper bound is infinite. Tracks shorter than the
//! minimum length were never recorded, so the likelihood is conditioned on
//! surviving past `entry = min_track_length - 1` (left truncation).
//!
//! With survival function `S(t) = exp(-r t)` the log-likelihood is
//!
//! ```text
//! ll(r) = sum_i ln(S(l_i) - S(u_i)) - n ln S(entry)
//! ```
//!
//! which is concave in the rate `r`, so a safeguarded Newton iteration on `r`
//! finds the maximum. The reported lifetime is the scale `1 / r`; its
//! variance comes from the observed information.

use crate::error::FitError;
use crate::tracks::TrackStats;

/// Newton iteration limit
const MAX_ITERATIONS: usize = 100;

/// Relative step size below which the iteration stops
const RATE_TOLERANCE: f64 = 1e-12;

/// Maximum number of step halvings per iteration
const MAX_BACKTRACK: usize = 60;

/// Bounds on the true event time of one observation, in frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CensoredInterval {
    /// Event happened no earlier than this
    pub lower: f64,
    /// Event happened before this; `f64::INFINITY` for right-censored observations
    pub upper: f64,
}

/// Result of the exponential fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialFit {
    /// Mean event time (1 / rate)
    pub scale: f64,
    /// Asymptotic variance of `scale`; `None` if the information is degenerate
    pub variance: Option<f64>,
    /// Newton iterations used
    pub iterations: usize,
}

/// Censoring intervals of tracks: `[L - 1, L)`, or `[L - 1, inf)` if right-censored
pub fn observations_from_tracks(tracks: &[TrackStats]) -> Vec<CensoredInterval> {
    tracks
        .iter()
        .map(|t| {
            let len = t.track_len as f64;
            CensoredInterval {
                lower: len - 1.0,
                upper: if t.censored.at_end() { f64::INFINITY } else { len },
            }
        })
        .collect()
}

struct LogLikelihood {
    value: f64,
    gradient: f64,
    curvature: f64,
}

fn log_likelihood(observations: &[CensoredInterval], entry: f64, rate: f64) -> LogLikelihood {
    let mut value = 0.0;
    let mut gradient = 0.0;
    let mut curvature = 0.0;
    for obs in observations {
        value -= (obs.lower - entry) * rate;
        gradient -= obs.lower - entry;
        if obs.upper.is_finite() {
            let width = obs.upper - obs.lower;
            // e^{wr} - 1 and 1 - e^{-wr}
            let grow = (width * rate).exp_m1();
            let decay = -(-width * rate).exp_m1();
            value += decay.ln();
            gradient += width / grow;
            curvature -= width * width / (grow * decay);
        }
    }
    LogLikelihood {
        value,
        gradient,
        curvature,
    }
}

/// Maximum likelihood fit of an exponential distribution to interval-censored data
///
/// # Arguments
///
/// * `observations` - Censoring intervals, `upper > lower >= entry`
/// * `entry` - Left-truncation time; every observation is conditioned on
///   surviving past it. `None` for no truncation.
/// * `initial_scale` - Starting point for the mean event time
///
/// # Errors
///
/// - `FitError::InsufficientData` if there are no observations, or none with
///   a finite upper bound (the rate is then not identifiable)
/// - `FitError::NonFinite` for empty intervals or if all events fall into
///   the first interval above `entry` (the rate diverges)
/// - `FitError::NonConvergence` if Newton's method does not settle
pub fn fit_exponential_interval_censored(
    observations: &[CensoredInterval],
    entry: Option<f64>,
    initial_scale: f64,
) -> Result<ExponentialFit, FitError> {
    let entry = entry.unwrap_or(0.0);
    let n_closed = observations.iter().filter(|o| o.upper.is_finite()).count();
    if n_closed == 0 {
        return Err(FitError::InsufficientData {
            available: 0,
            required: 1,
        });
    }
    if observations.iter().any(|o| !(o.upper > o.lower)) {
        return Err(FitError::NonFinite("empty censoring interval".to_string()));
    }
    let exposure: f64 = observations.iter().map(|o| o.lower - entry).sum();
    if !(exposure > 0.0) {
        return Err(FitError::NonFinite(
            "all events within the first interval, rate diverges".to_string(),
        ));
    }

    let mut rate = if initial_scale.is_finite() && initial_scale > 0.0 {
        1.0 / initial_scale
    } else {
        1.0
    };
    let mut ll = log_likelihood(observations, entry, rate);

    for iteration in 1..=MAX_ITERATIONS {
        if !ll.value.is_finite() || !ll.gradient.is_finite() {
            return Err(FitError::NonFinite(format!(
                "log-likelihood at rate {}",
                rate
            )));
        }

        let mut step = if ll.curvature < 0.0 {
            -ll.gradient / ll.curvature
        } else {
            // Flat direction, fall back to a gradient step
            ll.gradient * rate
        };

        let mut accepted = None;
        for _ in 0..MAX_BACKTRACK {
            let mut candidate = rate + step;
            if candidate <= 0.0 {
                candidate = rate * 0.5;
                step = candidate - rate;
            }
            let next = log_likelihood(observations, entry, candidate);
            if next.value.is_finite() && next.value >= ll.value - 1e-12 * ll.value.abs() {
                accepted = Some((candidate, next));
                break;
            }
            step *= 0.5;
        }

        let Some((next_rate, next_ll)) = accepted else {
            return Err(FitError::NonConvergence {
                iterations: iteration,
            });
        };

        let converged = (next_rate - rate).abs() <= RATE_TOLERANCE * rate;
        rate = next_rate;
        ll = next_ll;

        if converged {
            let information = -ll.curvature;
            let variance = if information.is_finite() && information > 0.0 {
                Some(1.0 / (information * rate.powi(4)))
            } else {
                log::debug!("Degenerate information {} at rate {}", information, rate);
                None
            };
            return Ok(ExponentialFit {
                scale: 1.0 / rate,
                variance,
                iterations: iteration,
            });
        }
    }

    Err(FitError::NonConvergence {
        iterations: MAX_ITERATIONS,
    })
}

/// Apparent lifetime and standard error of already selected tracks, in time units
///
/// Errors are NaN when the information matrix is degenerate.
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
    let observations = observations_from_tracks(tracks);
    let entry = (min_track_length > 1).then(|| (min_track_length - 1) as f64);
    // The basic estimate is a good starting point
    let naive = tracks.iter().map(|t| t.track_len as f64).sum::<f64>() / tracks.len() as f64
        - min_track_length as f64
        + 0.5;

    let fit = fit_exponential_interval_censored(&observations, entry, naive)?;
    let error = fit.variance.map_or(f64::NAN, |v| v.sqrt() * interval);
    Ok((fit.scale * interval, error))
}
