//! Error types for the lifetime analysis engine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur during lifetime analysis
///
/// Data problems (too few tracks, failed fits) never surface here from the
/// pipeline; they turn into NaN results instead. This type is reserved for
/// invalid parameters and for callers that ask for the failure cause.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Not enough data to produce an estimate
    InsufficientData(String),

    /// Numerical error (non-convergence, overflow, etc.)
    NumericalError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Reason why an estimate or a fit produced no answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FitError {
    /// Fewer usable observations than the estimate needs
    InsufficientData {
        /// Number of usable observations
        available: usize,
        /// Minimum number required
        required: usize,
    },

    /// Iterative solver hit its iteration limit or could not make progress
    NonConvergence {
        /// Iterations performed before giving up
        iterations: usize,
    },

    /// Iterates or inputs became NaN/infinite
    NonFinite(String),
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::InsufficientData {
                available,
                required,
            } => write!(
                f,
                "{} usable data points, at least {} required",
                available, required
            ),
            FitError::NonConvergence { iterations } => {
                write!(f, "fit did not converge after {} iterations", iterations)
            }
            FitError::NonFinite(msg) => write!(f, "non-finite value: {}", msg),
        }
    }
}

impl std::error::Error for FitError {}

impl From<FitError> for AnalysisError {
    fn from(err: FitError) -> Self {
        match err {
            FitError::InsufficientData { .. } => AnalysisError::InsufficientData(err.to_string()),
            FitError::NonConvergence { .. } | FitError::NonFinite(_) => {
                AnalysisError::NumericalError(err.to_string())
            }
        }
    }
}
