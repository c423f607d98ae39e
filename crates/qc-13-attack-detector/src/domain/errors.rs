//! # Domain Errors
//!
//! Error types for the attack detector.
//!
//! Two layers: `ProviderError` is what a witness (outbound port) can say,
//! `DetectorError` is what a detection run reports to its caller.

use thiserror::Error;

/// Hash type alias (32-byte SHA-256)
pub type Hash = [u8; 32];

/// Unix timestamp in milliseconds.
pub type Timestamp = u64;

/// Errors a light block provider can return.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Peer unreachable or the call timed out.
    #[error("Provider did not respond")]
    NoResponse,

    /// Peer has no light block at the requested height.
    #[error("Light block not found")]
    LightBlockNotFound,

    /// Peer's chain has not reached the requested height yet.
    #[error("Requested height is higher than the provider's latest height")]
    HeightTooHigh,

    /// Peer returned structurally or cryptographically invalid data.
    #[error("Bad light block: {reason}")]
    BadLightBlock {
        /// Why the block was rejected
        reason: String,
    },

    /// Unclassified transport error.
    #[error("Provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Shorthand for a `BadLightBlock` error.
    pub fn bad_light_block(reason: impl Into<String>) -> Self {
        Self::BadLightBlock {
            reason: reason.into(),
        }
    }

    /// Is this an invalid-data error (as opposed to unavailability)?
    pub fn is_bad_light_block(&self) -> bool {
        matches!(self, Self::BadLightBlock { .. })
    }
}

/// Attack detector error types.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The primary trace is nil, too short or not strictly increasing.
    #[error("Invalid primary trace: {0}")]
    InvalidTrace(String),

    /// No witnesses are registered.
    #[error("No witnesses connected, please reset the light client")]
    NoWitnesses,

    /// No witness corroborated the target header.
    #[error("All witnesses have either not responded, don't have the block or sent invalid blocks. You should look to change your witnesses or review the light client's logs for more information")]
    CrossReferencingFailed,

    /// A witness index queued for removal is not in the registry.
    #[error("Witness index {index} out of range (registry has {len} witnesses)")]
    WitnessIndexOutOfRange {
        /// Offending index
        index: usize,
        /// Registry length at removal time
        len: usize,
    },

    /// An attack responder confirmed an attack on the light client.
    #[error("Light client attack detected at height {height} (witness {witness_index})")]
    AttackDetected {
        /// Witness that reported the conflicting block
        witness_index: usize,
        /// Height of the conflicting block
        height: u64,
    },

    /// Invalid detector configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for detector operations
pub type DetectorResult<T> = Result<T, DetectorError>;
