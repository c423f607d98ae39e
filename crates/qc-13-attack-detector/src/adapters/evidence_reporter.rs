//! Evidence Reporting Responder
//!
//! Implements `AttackResponder` by exchanging attack evidence between the
//! primary and the conflicting witness. Not installed by default; the
//! detector only prunes conflicting witnesses unless this responder is
//! configured.

use crate::config::DetectorConfig;
use crate::domain::{ConflictReport, DetectorError, LightClientAttackEvidence};
use crate::ports::outbound::{AttackResponder, LightBlockProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Sends each side of a conflict the other side's conflicting block.
///
/// Both chains are assumed to agree on the trace's trusted anchor, which is
/// used as the common block of the evidence.
pub struct EvidenceReportingResponder {
    /// Provider the trace was verified against.
    primary: Arc<dyn LightBlockProvider>,
    /// Fail the detection run after reporting.
    halt_on_conflict: bool,
    /// Bound on each `report_evidence` call.
    report_timeout: Duration,
}

impl EvidenceReportingResponder {
    /// Create a responder that reports and then lets detection continue.
    ///
    /// Report calls share the detector's `provider_timeout`.
    pub fn new(primary: Arc<dyn LightBlockProvider>, config: &DetectorConfig) -> Self {
        Self {
            primary,
            halt_on_conflict: false,
            report_timeout: config.provider_timeout(),
        }
    }

    /// Fail the detection run with `AttackDetected` after reporting.
    pub fn halting(mut self) -> Self {
        self.halt_on_conflict = true;
        self
    }

    /// Best effort: failures are logged, never returned.
    async fn send_evidence(
        &self,
        evidence: LightClientAttackEvidence,
        receiver: &dyn LightBlockProvider,
    ) {
        let height = evidence.conflicting_block.height();
        match timeout(self.report_timeout, receiver.report_evidence(evidence)).await {
            Ok(Ok(())) => info!(
                "[qc-13] Reported attack evidence for height {} to {}",
                height,
                receiver.id()
            ),
            Ok(Err(e)) => error!(
                "[qc-13] Failed to report evidence for height {} to {}: {}",
                height,
                receiver.id(),
                e
            ),
            Err(_) => error!(
                "[qc-13] Reporting evidence for height {} to {} timed out",
                height,
                receiver.id()
            ),
        }
    }
}

#[async_trait]
impl AttackResponder for EvidenceReportingResponder {
    async fn on_conflict(
        &self,
        report: &ConflictReport,
        witness: &dyn LightBlockProvider,
    ) -> Result<(), DetectorError> {
        let (Some(anchor), Some(target)) = (report.anchor(), report.target()) else {
            return Err(DetectorError::InvalidTrace(
                "conflict report without a primary trace".to_string(),
            ));
        };

        // The witness learns about the primary's block and vice versa.
        let against_primary = LightClientAttackEvidence::new(target.clone(), anchor);
        let against_witness =
            LightClientAttackEvidence::new(report.conflicting_block.clone(), anchor);

        let kind = if against_witness.is_lunatic(target) {
            "lunatic"
        } else {
            "equivocation"
        };
        warn!(
            "[qc-13] Exchanging {} evidence between primary {} and witness {} (conflict at height {})",
            kind,
            self.primary.id(),
            witness.id(),
            report.conflicting_block.height()
        );

        self.send_evidence(against_primary, witness).await;
        self.send_evidence(against_witness, self.primary.as_ref()).await;

        if self.halt_on_conflict {
            return Err(DetectorError::AttackDetected {
                witness_index: report.witness_index,
                height: report.conflicting_block.height(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Header, LightBlock, ProviderError, ValidatorSetSummary};
    use crate::ports::MockProvider;
    use tokio::time::Instant;

    fn block_with(height: u64, app_hash: u8) -> LightBlock {
        LightBlock::new(
            Header {
                chain_id: "test-chain".to_string(),
                height,
                time: height * 1_000,
                last_block_hash: [0u8; 32],
                app_hash: [app_hash; 32],
                validators_hash: [1u8; 32],
                proposer: [0u8; 20],
            },
            ValidatorSetSummary::new([1u8; 32], 10, 1),
        )
    }

    fn report() -> ConflictReport {
        ConflictReport {
            primary_trace: vec![block_with(1, 0), block_with(10, 0)],
            conflicting_block: block_with(10, 9),
            witness_index: 2,
            now: 20_000,
        }
    }

    #[tokio::test]
    async fn test_evidence_exchanged() {
        let primary = Arc::new(MockProvider::new("primary"));
        let witness = MockProvider::new("witness");
        let config = DetectorConfig::for_testing();
        let responder = EvidenceReportingResponder::new(primary.clone(), &config);

        responder.on_conflict(&report(), &witness).await.unwrap();

        let to_witness = witness.reported_evidence();
        let to_primary = primary.reported_evidence();
        assert_eq!(to_witness.len(), 1);
        assert_eq!(to_primary.len(), 1);
        assert_eq!(to_witness[0].conflicting_block, block_with(10, 0));
        assert_eq!(to_primary[0].conflicting_block, block_with(10, 9));
        assert_eq!(to_primary[0].common_height, 1);
    }

    #[tokio::test]
    async fn test_halting_responder() {
        let primary = Arc::new(MockProvider::new("primary"));
        let witness = MockProvider::new("witness");
        let responder =
            EvidenceReportingResponder::new(primary, &DetectorConfig::for_testing()).halting();

        let result = responder.on_conflict(&report(), &witness).await;

        assert!(matches!(
            result,
            Err(DetectorError::AttackDetected {
                witness_index: 2,
                height: 10
            })
        ));
        assert_eq!(witness.reported_evidence().len(), 1);
    }

    /// Accepts evidence but never acknowledges it.
    struct StalledReceiver;

    #[async_trait]
    impl LightBlockProvider for StalledReceiver {
        async fn light_block(&self, _height: u64) -> Result<LightBlock, ProviderError> {
            Err(ProviderError::NoResponse)
        }

        async fn report_evidence(
            &self,
            _evidence: LightClientAttackEvidence,
        ) -> Result<(), ProviderError> {
            std::future::pending().await
        }

        fn id(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_bounded_by_provider_timeout() {
        let config = DetectorConfig::for_testing();
        let primary = Arc::new(MockProvider::new("primary"));
        let responder = EvidenceReportingResponder::new(primary.clone(), &config);

        let start = Instant::now();
        responder.on_conflict(&report(), &StalledReceiver).await.unwrap();

        // The stalled witness costs one timeout; the primary still gets its copy.
        assert!(start.elapsed() >= config.provider_timeout());
        assert!(start.elapsed() < config.provider_timeout() * 2);
        assert_eq!(primary.reported_evidence().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_trace_rejected() {
        let responder = EvidenceReportingResponder::new(
            Arc::new(MockProvider::new("primary")),
            &DetectorConfig::for_testing(),
        );
        let mut report = report();
        report.primary_trace.clear();

        let result = responder.on_conflict(&report, &MockProvider::new("witness")).await;
        assert!(matches!(result, Err(DetectorError::InvalidTrace(_))));
    }
}
