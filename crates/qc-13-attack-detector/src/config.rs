//! # Detector Configuration
//!
//! Tolerances and timeouts for the attack detector.

use crate::domain::{
    lag_wait, DetectorError, DEFAULT_MAX_BLOCK_LAG, DEFAULT_MAX_CLOCK_DRIFT,
    DEFAULT_PROVIDER_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attack detector configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Chain id every witness response must belong to.
    pub chain_id: String,

    /// Upper bound on clock disagreement between nodes, in milliseconds.
    pub max_clock_drift_ms: u64,

    /// Upper bound on block production delay of an honest witness, in milliseconds.
    pub max_block_lag_ms: u64,

    /// Bound on every single provider call, in milliseconds.
    pub provider_timeout_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            chain_id: "quantum-chain".to_string(),
            max_clock_drift_ms: DEFAULT_MAX_CLOCK_DRIFT.as_millis() as u64,
            max_block_lag_ms: DEFAULT_MAX_BLOCK_LAG.as_millis() as u64,
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT.as_millis() as u64,
        }
    }
}

impl DetectorConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            chain_id: "test-chain".to_string(),
            max_clock_drift_ms: 100,
            max_block_lag_ms: 50,
            provider_timeout_ms: 1_000,
        }
    }

    /// Tolerated clock drift.
    pub fn max_clock_drift(&self) -> Duration {
        Duration::from_millis(self.max_clock_drift_ms)
    }

    /// Tolerated block lag.
    pub fn max_block_lag(&self) -> Duration {
        Duration::from_millis(self.max_block_lag_ms)
    }

    /// Per-call provider timeout.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// How long to wait before re-querying a lagging witness.
    pub fn lag_wait(&self) -> Duration {
        lag_wait(self.max_clock_drift(), self.max_block_lag())
    }

    /// Reject configurations the detector cannot run with.
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.chain_id.is_empty() {
            return Err(DetectorError::Config("chain_id must not be empty".to_string()));
        }
        if self.provider_timeout_ms == 0 {
            return Err(DetectorError::Config(
                "provider_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
