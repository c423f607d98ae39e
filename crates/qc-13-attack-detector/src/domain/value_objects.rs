//! # Domain Value Objects
//!
//! Immutable value types produced and consumed during a detection run.

use super::entities::LightBlock;
use super::errors::{ProviderError, Timestamp};
use serde::{Deserialize, Serialize};

/// Position of a witness in the registry.
pub type WitnessIndex = usize;

/// Result of comparing the primary's target header with one witness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComparisonOutcome {
    /// Witness returned the same header hash.
    Matched {
        /// Witness that matched
        witness_index: WitnessIndex,
    },
    /// Witness returned a different header at the target height, or a lower
    /// block whose time is not before the target's.
    Conflicting {
        /// The witness's block
        block: Box<LightBlock>,
        /// Witness that conflicted
        witness_index: WitnessIndex,
    },
    /// Witness failed in a way that says something about its quality.
    BadWitness {
        /// Underlying provider error
        reason: ProviderError,
        /// Witness that failed
        witness_index: WitnessIndex,
    },
    /// Witness had no usable opinion this round.
    Inconclusive {
        /// Underlying provider error
        reason: ProviderError,
        /// Witness that could not answer
        witness_index: WitnessIndex,
    },
}

impl ComparisonOutcome {
    /// Witness this outcome belongs to.
    pub fn witness_index(&self) -> WitnessIndex {
        match self {
            Self::Matched { witness_index }
            | Self::Conflicting { witness_index, .. }
            | Self::BadWitness { witness_index, .. }
            | Self::Inconclusive { witness_index, .. } => *witness_index,
        }
    }

    /// Should the witness be dropped from the registry?
    ///
    /// Conflicts always; bad witnesses only for invalid light blocks.
    pub fn warrants_removal(&self) -> bool {
        match self {
            Self::Conflicting { .. } => true,
            Self::BadWitness { reason, .. } => reason.is_bad_light_block(),
            Self::Matched { .. } | Self::Inconclusive { .. } => false,
        }
    }
}

/// Everything known about a confirmed conflict, handed to the attack responder.
#[derive(Clone, Debug)]
pub struct ConflictReport {
    /// Verified trace from the primary (anchor first, target last).
    pub primary_trace: Vec<LightBlock>,
    /// The witness's conflicting block.
    pub conflicting_block: LightBlock,
    /// Witness that reported it.
    pub witness_index: WitnessIndex,
    /// Detection time supplied by the caller.
    pub now: Timestamp,
}

impl ConflictReport {
    /// Target block of the primary trace.
    pub fn target(&self) -> Option<&LightBlock> {
        self.primary_trace.last()
    }

    /// Trusted anchor of the primary trace.
    pub fn anchor(&self) -> Option<&LightBlock> {
        self.primary_trace.first()
    }
}

/// Evidence of a light client attack, exchanged between primary and witness.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LightClientAttackEvidence {
    /// Block that conflicts with the receiver's chain.
    pub conflicting_block: LightBlock,
    /// Last height at which both chains agree.
    pub common_height: u64,
    /// Total voting power of the validator set at the common height.
    pub total_voting_power: u64,
    /// Time of the block at the common height.
    pub timestamp: Timestamp,
}

impl LightClientAttackEvidence {
    /// Build evidence against a conflicting block, anchored at a common block.
    pub fn new(conflicting_block: LightBlock, common: &LightBlock) -> Self {
        Self {
            conflicting_block,
            common_height: common.height(),
            total_voting_power: common.validators().total_voting_power,
            timestamp: common.time(),
        }
    }

    /// Lunatic attack: the conflicting header was signed by a validator set
    /// other than the one at the common height.
    pub fn is_lunatic(&self, trusted_at_conflict: &LightBlock) -> bool {
        self.conflicting_block.header().validators_hash
            != trusted_at_conflict.header().validators_hash
    }
}
