//! Solver-wide statistics the elimination pass reports into.
//!
//! Counters accumulate over every invocation of the pass on one solver.
//! Snapshots are encoded as CBOR.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Error type for statistics snapshots.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("statistics snapshot encoding failed: {0}")]
    Cbor(#[from] serde_cbor::Error),
}

/// Cumulative statistics of apply elimination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverStats {
    /// Wall-clock time spent in apply elimination.
    pub elim_applies_time: Duration,
    /// Applications replaced by their beta-reduced form.
    pub applies_eliminated: u64,
    /// Elimination rounds, including the final empty ones.
    pub elim_rounds: u64,
    /// Calls into the beta-reducer.
    pub reducer_calls: u64,
    /// Reductions served from the pair cache.
    pub cache_hits: u64,
}

impl SolverStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes a snapshot as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, StatsError> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Decodes a snapshot produced by `to_cbor`.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, StatsError> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_snapshot_is_stable() {
        let stats = SolverStats {
            elim_applies_time: Duration::from_millis(12),
            applies_eliminated: 3,
            elim_rounds: 2,
            reducer_calls: 3,
            cache_hits: 0,
        };
        let bytes = stats.to_cbor().unwrap();
        assert_eq!(SolverStats::from_cbor(&bytes).unwrap(), stats);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            SolverStats::from_cbor(&[0xff, 0x00]),
            Err(StatsError::Cbor(_))
        ));
    }

    #[test]
    fn decode_error_names_the_snapshot() {
        let err = SolverStats::from_cbor(&[]).unwrap_err();
        assert!(err.to_string().starts_with("statistics snapshot encoding failed"));
    }
}
