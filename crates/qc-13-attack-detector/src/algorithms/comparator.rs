//! # Witness Comparator
//!
//! Compares the primary's verified target header with one witness.
//!
//! A witness that has not reached the target height is either lagging
//! honestly or the primary is running a lunatic attack with a header whose
//! height and time lie in the future. Block times tell them apart: an honest
//! witness below the target height cannot have produced a block at or after
//! the target's time. If its blocks are older, it gets
//! `2 * max_clock_drift + max_block_lag` to catch up.

use super::reconciliation::{fetch_light_block, get_target_block_or_latest, TargetOrLatest};
use crate::config::DetectorConfig;
use crate::domain::{ComparisonOutcome, LightBlock, ProviderError, WitnessIndex};
use crate::ports::LightBlockProvider;
use tracing::{debug, info, warn};

/// Compare `target` with the witness's block at the same height.
///
/// Never touches the witness registry; the caller aggregates the outcome.
///
/// # Returns
/// - `Matched` if the hashes are equal
/// - `Conflicting` on a hash mismatch, or if a lagging witness has a block
///   not older than the target
/// - `Inconclusive` if the witness had no opinion or is too far behind
/// - `BadWitness` for any other provider failure
pub async fn compare_new_header_with_witness(
    target: &LightBlock,
    witness: &dyn LightBlockProvider,
    witness_index: WitnessIndex,
    config: &DetectorConfig,
) -> ComparisonOutcome {
    let block = match fetch_light_block(witness, target.height(), config).await {
        Ok(block) => block,

        Err(reason @ (ProviderError::NoResponse | ProviderError::LightBlockNotFound)) => {
            debug!(
                "[qc-13] Witness {} has no opinion on height {}: {}",
                witness.id(),
                target.height(),
                reason
            );
            return ComparisonOutcome::Inconclusive {
                reason,
                witness_index,
            };
        }

        Err(ProviderError::HeightTooHigh) => {
            match reconcile_lagging_witness(target, witness, witness_index, config).await {
                Ok(block) => block,
                Err(outcome) => return outcome,
            }
        }

        Err(reason) => {
            info!(
                "[qc-13] Witness {} failed at height {}: {}",
                witness.id(),
                target.height(),
                reason
            );
            return ComparisonOutcome::BadWitness {
                reason,
                witness_index,
            };
        }
    };

    if block.hash() != target.hash() {
        warn!(
            "[qc-13] Conflicting header from witness {} at height {}",
            witness.id(),
            target.height()
        );
        return ComparisonOutcome::Conflicting {
            block: Box::new(block),
            witness_index,
        };
    }

    debug!(
        "[qc-13] Matching header received by witness {} (index {}) at height {}",
        witness.id(),
        witness_index,
        target.height()
    );
    ComparisonOutcome::Matched { witness_index }
}

/// Resolve a `HeightTooHigh` answer into either the witness's block at the
/// target height or a final outcome.
async fn reconcile_lagging_witness(
    target: &LightBlock,
    witness: &dyn LightBlockProvider,
    witness_index: WitnessIndex,
    config: &DetectorConfig,
) -> Result<LightBlock, ComparisonOutcome> {
    let latest = match get_target_block_or_latest(target.height(), witness, config).await {
        Ok(TargetOrLatest::Target(block)) => return Ok(block),
        Ok(TargetOrLatest::Latest(latest)) => latest,
        Err(reason) => {
            return Err(ComparisonOutcome::Inconclusive {
                reason,
                witness_index,
            })
        }
    };

    check_lagging_block_time(target, &latest, witness, witness_index)?;

    let wait = config.lag_wait();
    debug!(
        "[qc-13] Witness {} is behind (latest {} < {}), waiting {:?} for it to catch up",
        witness.id(),
        latest.height(),
        target.height(),
        wait
    );
    tokio::time::sleep(wait).await;

    let latest = match get_target_block_or_latest(target.height(), witness, config).await {
        Ok(TargetOrLatest::Target(block)) => return Ok(block),
        Ok(TargetOrLatest::Latest(latest)) => latest,
        Err(reason) => {
            return Err(ComparisonOutcome::BadWitness {
                reason,
                witness_index,
            })
        }
    };

    check_lagging_block_time(target, &latest, witness, witness_index)?;

    // Still behind with consistent times. If drift and lag are configured too
    // generously a lunatic primary can outrun every honest witness here.
    debug!(
        "[qc-13] Witness {} is too far behind height {}, ignoring it",
        witness.id(),
        target.height()
    );
    Err(ComparisonOutcome::Inconclusive {
        reason: ProviderError::NoResponse,
        witness_index,
    })
}

/// A witness below the target height must only have blocks older than the
/// target. Anything else conflicts with the primary.
fn check_lagging_block_time(
    target: &LightBlock,
    latest: &LightBlock,
    witness: &dyn LightBlockProvider,
    witness_index: WitnessIndex,
) -> Result<(), ComparisonOutcome> {
    if latest.time() < target.time() {
        return Ok(());
    }

    warn!(
        "[qc-13] Witness {} latest block {} (time {}) is not older than primary block {} (time {})",
        witness.id(),
        latest.height(),
        latest.time(),
        target.height(),
        target.time()
    );
    Err(ComparisonOutcome::Conflicting {
        block: Box::new(latest.clone()),
        witness_index,
    })
}
