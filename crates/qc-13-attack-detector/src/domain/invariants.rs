//! # Domain Invariants
//!
//! Business rules that must always hold true.

use super::entities::LightBlock;
use super::errors::DetectorError;
use std::time::Duration;

/// Minimum trace length: a trusted anchor plus the target.
pub const MIN_TRACE_LENGTH: usize = 2;

/// Default tolerated clock drift between nodes.
pub const DEFAULT_MAX_CLOCK_DRIFT: Duration = Duration::from_secs(10);

/// Default tolerated block production delay for an honest witness.
pub const DEFAULT_MAX_BLOCK_LAG: Duration = Duration::from_secs(10);

/// Default bound on a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Invariant: the primary trace can be cross-examined.
///
/// At least `MIN_TRACE_LENGTH` blocks, strictly increasing in height.
pub fn invariant_trace_well_formed(trace: &[LightBlock]) -> Result<(), DetectorError> {
    if trace.len() < MIN_TRACE_LENGTH {
        return Err(DetectorError::InvalidTrace(format!(
            "nil or single block primary trace (length {})",
            trace.len()
        )));
    }

    for window in trace.windows(2) {
        if window[1].height() <= window[0].height() {
            return Err(DetectorError::InvalidTrace(format!(
                "heights not strictly increasing: {} then {}",
                window[0].height(),
                window[1].height()
            )));
        }
    }

    Ok(())
}

/// Invariant: a detection run needs at least one witness.
pub fn invariant_has_witnesses(witness_count: usize) -> Result<(), DetectorError> {
    if witness_count == 0 {
        return Err(DetectorError::NoWitnesses);
    }
    Ok(())
}

/// Waiting period before re-querying a lagging witness: `2 * drift + lag`.
pub fn lag_wait(max_clock_drift: Duration, max_block_lag: Duration) -> Duration {
    max_clock_drift
        .saturating_mul(2)
        .saturating_add(max_block_lag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Header, ValidatorSetSummary};
    use proptest::prelude::*;

    fn block(height: u64) -> LightBlock {
        LightBlock::new(
            Header {
                chain_id: "test-chain".to_string(),
                height,
                time: height,
                last_block_hash: [0u8; 32],
                app_hash: [0u8; 32],
                validators_hash: [1u8; 32],
                proposer: [0u8; 20],
            },
            ValidatorSetSummary::new([1u8; 32], 10, 1),
        )
    }

    #[test]
    fn test_empty_trace_rejected() {
        assert!(matches!(
            invariant_trace_well_formed(&[]),
            Err(DetectorError::InvalidTrace(_))
        ));
    }

    #[test]
    fn test_single_block_trace_rejected() {
        assert!(matches!(
            invariant_trace_well_formed(&[block(5)]),
            Err(DetectorError::InvalidTrace(_))
        ));
    }

    #[test]
    fn test_non_increasing_trace_rejected() {
        assert!(invariant_trace_well_formed(&[block(5), block(5)]).is_err());
        assert!(invariant_trace_well_formed(&[block(5), block(3)]).is_err());
    }

    #[test]
    fn test_valid_trace_accepted() {
        assert!(invariant_trace_well_formed(&[block(1), block(4), block(9)]).is_ok());
    }

    #[test]
    fn test_no_witnesses() {
        assert!(matches!(
            invariant_has_witnesses(0),
            Err(DetectorError::NoWitnesses)
        ));
        assert!(invariant_has_witnesses(1).is_ok());
    }

    #[test]
    fn test_lag_wait() {
        assert_eq!(
            lag_wait(Duration::from_secs(10), Duration::from_secs(5)),
            Duration::from_secs(25)
        );
    }

    proptest! {
        #[test]
        fn prop_increasing_traces_accepted(heights in proptest::collection::btree_set(1u64..10_000, 2..20)) {
            let trace: Vec<LightBlock> = heights.into_iter().map(block).collect();
            prop_assert!(invariant_trace_well_formed(&trace).is_ok());
        }

        #[test]
        fn prop_reversed_traces_rejected(heights in proptest::collection::btree_set(1u64..10_000, 2..20)) {
            let trace: Vec<LightBlock> = heights.into_iter().rev().map(block).collect();
            prop_assert!(invariant_trace_well_formed(&trace).is_err());
        }
    }
}
