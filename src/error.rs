//! Error taxonomy: boundary validation and fatal collective failures.
//!
//! The kernel itself has no failure modes; everything recoverable is caught
//! before a search starts, and a failed collective aborts the whole search
//! because optimality requires exhaustive coverage.

use thiserror::Error;

/// A failed collective operation. Always fatal to the search.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// A broadcast named a root outside the communicator.
    #[error("broadcast root {root} out of range for {size} ranks")]
    InvalidRoot {
        /// The requested root rank.
        root: usize,
        /// The communicator size.
        size: usize,
    },

    /// Ranks disagreed on the broadcast buffer length.
    #[error("broadcast length mismatch on rank {rank}: expected {expected}, got {got}")]
    LengthMismatch {
        /// The rank that observed the mismatch.
        rank: usize,
        /// Root's buffer length.
        expected: usize,
        /// This rank's buffer length.
        got: usize,
    },

    /// A peer rank died while holding shared collective state.
    #[error("collective state poisoned by a failed rank")]
    Poisoned,
}

/// Errors surfaced by the search entry points.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Order outside `[2, 24]`.
    #[error("order must be in [2, 24], got {0}")]
    InvalidOrder(usize),

    /// Length cap outside `[0, 127]`.
    #[error("length cap must be in [0, 127], got {0}")]
    InvalidBound(i32),

    /// Non-positive process or thread count.
    #[error("process and thread counts must be positive, got {procs} x {threads}")]
    InvalidWorkers {
        /// Requested process count.
        procs: usize,
        /// Requested threads per process.
        threads: usize,
    },

    /// Non-positive bound-synchronization round size.
    #[error("round size must be positive")]
    InvalidRoundSize,

    /// A collective failed mid-search.
    #[error("collective failure: {0}")]
    Collective(#[from] CommError),

    /// The worker pool could not be constructed.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A rank thread terminated abnormally.
    #[error("rank {0} terminated abnormally")]
    RankPanicked(usize),
}

impl SearchError {
    /// Process exit code for this error: 2 for argument validation, 1 for
    /// runtime failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidOrder(_)
            | Self::InvalidBound(_)
            | Self::InvalidWorkers { .. }
            | Self::InvalidRoundSize => 2,
            Self::Collective(_) | Self::ThreadPool(_) | Self::RankPanicked(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_exit_with_two() {
        assert_eq!(SearchError::InvalidOrder(1).exit_code(), 2);
        assert_eq!(SearchError::InvalidBound(128).exit_code(), 2);
        assert_eq!(
            SearchError::InvalidWorkers {
                procs: 0,
                threads: 1
            }
            .exit_code(),
            2
        );
    }

    #[test]
    fn collective_errors_exit_with_one() {
        let err = SearchError::Collective(CommError::Poisoned);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("collective"));
    }
}
