//! # Inbound Ports
//!
//! API trait defining what the attack detector can do.

use async_trait::async_trait;
use crate::domain::{DetectorError, LightBlock, Timestamp};

/// Divergence detector API - inbound port.
///
/// Consumed by the light client verification flow once a target header has
/// been verified against the primary.
#[async_trait]
pub trait DivergenceDetectorApi: Send + Sync {
    /// Cross-check the last block of `primary_trace` against every witness.
    ///
    /// `Ok(())` means at least one witness corroborated the target header and
    /// it may be stored as trusted. Misbehaving witnesses are pruned as a
    /// side effect.
    ///
    /// # Errors
    /// - `InvalidTrace` if the trace is shorter than two blocks or not
    ///   strictly increasing
    /// - `NoWitnesses` if no witness is registered
    /// - `CrossReferencingFailed` if no witness matched
    async fn detect_divergence(
        &self,
        primary_trace: &[LightBlock],
        now: Timestamp,
    ) -> Result<(), DetectorError>;

    /// Number of active witnesses.
    async fn witness_count(&self) -> usize;
}
