//! # Outbound Ports
//!
//! Traits for external dependencies (witness providers, attack response).

use crate::domain::{
    ConflictReport, DetectorError, LightBlock, LightClientAttackEvidence, ProviderError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

/// Height value that asks a provider for its latest light block.
pub const LATEST_HEIGHT: u64 = 0;

/// Light block provider - outbound port.
///
/// A remote peer (primary or witness). Implementations must not block
/// forever; the detector additionally bounds every call with a timeout and
/// drops in-flight calls when a run is cancelled.
#[async_trait]
pub trait LightBlockProvider: Send + Sync {
    /// Get the light block at `height`, or the latest one for `LATEST_HEIGHT`.
    async fn light_block(&self, height: u64) -> Result<LightBlock, ProviderError>;

    /// Report evidence of misbehavior (best effort).
    async fn report_evidence(
        &self,
        evidence: LightClientAttackEvidence,
    ) -> Result<(), ProviderError>;

    /// Provider identifier (for logging/debugging).
    fn id(&self) -> &str;
}

/// Attack responder - outbound port.
///
/// Invoked once per confirmed conflict, before the conflicting witness is
/// removed. Returning an error aborts the detection run with that error.
#[async_trait]
pub trait AttackResponder: Send + Sync {
    /// Examine a conflict and escalate it if warranted. `witness` is the
    /// provider that returned the conflicting block.
    async fn on_conflict(
        &self,
        report: &ConflictReport,
        witness: &dyn LightBlockProvider,
    ) -> Result<(), DetectorError>;
}

/// Responder that does nothing: conflicting witnesses are only pruned.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAttackResponder;

#[async_trait]
impl AttackResponder for NoopAttackResponder {
    async fn on_conflict(
        &self,
        _report: &ConflictReport,
        _witness: &dyn LightBlockProvider,
    ) -> Result<(), DetectorError> {
        Ok(())
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Default)]
struct MockState {
    /// Per-height scripted responses. The last response of a queue is sticky.
    scripted: HashMap<u64, VecDeque<Result<LightBlock, ProviderError>>>,
    /// Requested heights, in call order.
    calls: Vec<u64>,
    /// Evidence received through `report_evidence`.
    evidence: Vec<LightClientAttackEvidence>,
}

/// Mock light block provider for testing.
///
/// Serves a static chain: `LATEST_HEIGHT` returns the highest block, heights
/// above it return `HeightTooHigh`, gaps return `LightBlockNotFound`.
/// Scripted responses take precedence over the chain.
pub struct MockProvider {
    /// Provider identifier.
    pub id: String,
    /// Simulated chain.
    chain: BTreeMap<u64, LightBlock>,
    /// Delay before every response.
    delay: Option<Duration>,
    /// Never answer (simulates a hung connection).
    hang: bool,
    state: Mutex<MockState>,
}

impl MockProvider {
    /// Create an empty mock provider.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            chain: BTreeMap::new(),
            delay: None,
            hang: false,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Serve the given blocks.
    pub fn with_chain(mut self, blocks: impl IntoIterator<Item = LightBlock>) -> Self {
        for block in blocks {
            self.chain.insert(block.height(), block);
        }
        self
    }

    /// Queue a scripted response for `height`.
    pub fn respond(self, height: u64, response: Result<LightBlock, ProviderError>) -> Self {
        self.state
            .lock()
            .scripted
            .entry(height)
            .or_default()
            .push_back(response);
        self
    }

    /// Delay every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Never respond.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Heights requested so far, in call order.
    pub fn calls(&self) -> Vec<u64> {
        self.state.lock().calls.clone()
    }

    /// Evidence reported to this provider.
    pub fn reported_evidence(&self) -> Vec<LightClientAttackEvidence> {
        self.state.lock().evidence.clone()
    }

    fn resolve(&self, height: u64) -> Result<LightBlock, ProviderError> {
        let mut state = self.state.lock();
        state.calls.push(height);

        if let Some(queue) = state.scripted.get_mut(&height) {
            if queue.len() > 1 {
                if let Some(response) = queue.pop_front() {
                    return response;
                }
            } else if let Some(response) = queue.front() {
                return response.clone();
            }
        }

        let Some((&tip, latest)) = self.chain.iter().next_back() else {
            return Err(ProviderError::LightBlockNotFound);
        };

        if height == LATEST_HEIGHT {
            return Ok(latest.clone());
        }
        if height > tip {
            return Err(ProviderError::HeightTooHigh);
        }
        self.chain
            .get(&height)
            .cloned()
            .ok_or(ProviderError::LightBlockNotFound)
    }
}

#[async_trait]
impl LightBlockProvider for MockProvider {
    async fn light_block(&self, height: u64) -> Result<LightBlock, ProviderError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.resolve(height)
    }

    async fn report_evidence(
        &self,
        evidence: LightClientAttackEvidence,
    ) -> Result<(), ProviderError> {
        self.state.lock().evidence.push(evidence);
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Header, ValidatorSetSummary};

    fn block(height: u64) -> LightBlock {
        LightBlock::new(
            Header {
                chain_id: "test-chain".to_string(),
                height,
                time: height * 1_000,
                last_block_hash: [0u8; 32],
                app_hash: [0u8; 32],
                validators_hash: [1u8; 32],
                proposer: [0u8; 20],
            },
            ValidatorSetSummary::new([1u8; 32], 10, 1),
        )
    }

    #[tokio::test]
    async fn test_mock_serves_chain() {
        let provider = MockProvider::new("w").with_chain(vec![block(1), block(2), block(3)]);

        assert_eq!(provider.light_block(2).await.unwrap().height(), 2);
        assert_eq!(provider.light_block(LATEST_HEIGHT).await.unwrap().height(), 3);
        assert_eq!(
            provider.light_block(4).await.unwrap_err(),
            ProviderError::HeightTooHigh
        );
        assert_eq!(provider.calls(), vec![2, LATEST_HEIGHT, 4]);
    }

    #[tokio::test]
    async fn test_mock_empty_chain() {
        let provider = MockProvider::new("w");
        assert_eq!(
            provider.light_block(LATEST_HEIGHT).await.unwrap_err(),
            ProviderError::LightBlockNotFound
        );
    }

    #[tokio::test]
    async fn test_mock_scripted_queue_is_sticky() {
        let provider = MockProvider::new("w")
            .with_chain(vec![block(1)])
            .respond(LATEST_HEIGHT, Ok(block(1)))
            .respond(LATEST_HEIGHT, Err(ProviderError::NoResponse));

        assert!(provider.light_block(LATEST_HEIGHT).await.is_ok());
        assert_eq!(
            provider.light_block(LATEST_HEIGHT).await.unwrap_err(),
            ProviderError::NoResponse
        );
        assert_eq!(
            provider.light_block(LATEST_HEIGHT).await.unwrap_err(),
            ProviderError::NoResponse
        );
    }

    #[tokio::test]
    async fn test_mock_records_evidence() {
        let provider = MockProvider::new("w");
        let evidence = LightClientAttackEvidence::new(block(5), &block(3));
        provider.report_evidence(evidence.clone()).await.unwrap();
        assert_eq!(provider.reported_evidence(), vec![evidence]);
    }

    #[test]
    fn test_noop_responder() {
        let report = ConflictReport {
            primary_trace: vec![block(1), block(2)],
            conflicting_block: block(2),
            witness_index: 0,
            now: 0,
        };
        let witness = MockProvider::new("w");
        let result = tokio_test::block_on(NoopAttackResponder.on_conflict(&report, &witness));
        assert!(result.is_ok());
        assert!(witness.calls().is_empty());
    }
}
