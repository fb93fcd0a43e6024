//! Error types for the CDT library.

use crate::cdt::ergodic_moves::MoveType;
use std::fmt;

/// Boxed error from a geometry backend or other collaborator.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where in a run a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// The unconditional seeding moves made before the first pass
    WarmUp,
    /// A sampled move attempt
    Pass {
        /// Zero-based pass number
        pass: u32,
        /// One-based attempt number, counted across the whole run
        attempt: u64,
    },
    /// A move attempted outside of `run`
    Standalone,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WarmUp => write!(f, "warm-up"),
            Self::Pass { pass, attempt } => write!(f, "pass {pass}, attempt {attempt}"),
            Self::Standalone => write!(f, "standalone attempt"),
        }
    }
}

/// Main error type for CDT operations.
#[derive(Debug, thiserror::Error)]
pub enum CdtError {
    /// Invalid simulation or action parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// a1 was requested before any move had been attempted
    #[error("Cannot compute a1: no moves have been attempted")]
    NoAttemptedMoves,

    /// A move was attempted without a triangulation loaded into the engine
    #[error("No triangulation is loaded into the Metropolis engine")]
    MissingTriangulation,

    /// Committing a move would drive a count below zero
    #[error("{move_type} move would make {field} negative")]
    CountUnderflow {
        /// Move being committed
        move_type: MoveType,
        /// Name of the offending counter
        field: &'static str,
    },

    /// Tracked simplex total no longer matches the triangulation
    #[error("Bookkeeping drift: tracking {tracked} simplices but triangulation has {actual}")]
    CountDrift {
        /// `three_one_simplices + two_two_simplices`
        tracked: u64,
        /// Top-dimensional simplices reported by the backend
        actual: u64,
    },

    /// Requested MPFR precision is outside the supported range
    #[error("Unsupported precision: {bits} bits (supported range {min}..={max})")]
    UnsupportedPrecision {
        /// Requested precision in bits
        bits: u32,
        /// Smallest supported precision
        min: u32,
        /// Largest supported precision
        max: u32,
    },

    /// High-precision computation produced an unusable value
    #[error("Arithmetic failure: {0}")]
    Arithmetic(String),

    /// A geometry backend operation failed
    #[error("Backend failure during {operation}: {source}")]
    Backend {
        /// Operation being performed
        operation: &'static str,
        /// Underlying backend error
        #[source]
        source: BackendError,
    },

    /// A move attempt failed; wraps the underlying cause with its run context
    #[error("{move_type} move failed during {stage}: {source}")]
    MoveAttempt {
        /// Stage of the run in progress
        stage: RunStage,
        /// Move that was being attempted
        move_type: MoveType,
        /// Underlying failure
        #[source]
        source: Box<CdtError>,
    },
}

impl CdtError {
    /// Wraps a backend error for the named operation.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }

    /// Attaches run-stage context to a failure inside a move attempt.
    #[must_use]
    pub fn during(self, stage: RunStage, move_type: MoveType) -> Self {
        Self::MoveAttempt {
            stage,
            move_type,
            source: Box::new(self),
        }
    }
}

/// Result type for CDT operations.
pub type CdtResult<T> = Result<T, CdtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_attempt_context_in_message() {
        let error = CdtError::NoAttemptedMoves.during(
            RunStage::Pass {
                pass: 2,
                attempt: 17,
            },
            MoveType::TwoSix,
        );
        let message = error.to_string();
        assert!(message.contains("(2,6)"));
        assert!(message.contains("pass 2, attempt 17"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_warm_up_stage_display() {
        assert_eq!(RunStage::WarmUp.to_string(), "warm-up");
    }
}
