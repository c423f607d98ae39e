//! # QC-13 Light Client Attack Detector
//!
//! Second wall of defense for the light client: a header verified against
//! the primary is cross-referenced with independent witnesses before it is
//! trusted.
//!
//! **Subsystem ID:** 13
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Detect light client attacks (equivocation, lunatic headers) by comparing
//! the primary's target header with every witness's header at the same
//! height, and prune witnesses that conflict or send invalid data.
//!
//! ## Outcomes per witness
//!
//! | Witness response | Outcome | Witness removed |
//! |------------------|---------|-----------------|
//! | Same hash | Matched | No |
//! | Different hash | Conflicting | Yes |
//! | Lower height, time not before target | Conflicting | Yes |
//! | No response / not found / too far behind | Inconclusive | No |
//! | Invalid light block | Bad witness | Yes |
//! | Other provider error | Bad witness | No |
//!
//! One matching witness is enough to trust the header.
//!
//! ## Module Structure
//!
//! ```text
//! qc-13-attack-detector/
//! ├── domain/          # LightBlock, outcomes, evidence, errors, invariants
//! ├── algorithms/      # Witness comparator, height reconciliation
//! ├── ports/           # Detector API (inbound) + provider/responder traits (outbound)
//! ├── application/     # DivergenceDetector, WitnessRegistry
//! ├── adapters/        # EvidenceReportingResponder
//! ├── telemetry.rs     # tracing subscriber setup
//! └── config.rs        # DetectorConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

// Re-exports
pub use adapters::EvidenceReportingResponder;
pub use algorithms::{
    compare_new_header_with_witness, fetch_light_block, get_target_block_or_latest,
    TargetOrLatest,
};
pub use application::{DivergenceDetector, WitnessRegistry};
pub use config::DetectorConfig;
pub use domain::{
    invariant_has_witnesses, invariant_trace_well_formed, lag_wait, Address, ComparisonOutcome,
    ConflictReport, DetectorError, DetectorResult, Hash, Header, LightBlock,
    LightClientAttackEvidence, ProviderError, Timestamp, ValidatorSetSummary, WitnessIndex,
    MIN_TRACE_LENGTH,
};
pub use ports::{
    AttackResponder, DivergenceDetectorApi, LightBlockProvider, MockProvider,
    NoopAttackResponder, LATEST_HEIGHT,
};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
