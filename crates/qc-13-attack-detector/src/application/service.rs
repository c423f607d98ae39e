//! # Divergence Detector Service
//!
//! Cross-references a header verified against the primary with every
//! witness, decides whether it can be trusted and prunes witnesses that
//! misbehaved.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::algorithms::compare_new_header_with_witness;
use crate::application::registry::WitnessRegistry;
use crate::config::DetectorConfig;
use crate::domain::{
    invariant_has_witnesses, invariant_trace_well_formed, ComparisonOutcome, ConflictReport,
    DetectorError, DetectorResult, LightBlock, Timestamp, WitnessIndex,
};
use crate::ports::{
    AttackResponder, DivergenceDetectorApi, LightBlockProvider, NoopAttackResponder,
};

/// Divergence detector - the light client's second wall of defense.
pub struct DivergenceDetector {
    /// Configuration, shared with comparator tasks.
    config: Arc<DetectorConfig>,
    /// Active witnesses. Locked for the full duration of a detection run.
    witnesses: Mutex<WitnessRegistry>,
    /// Called for every conflicting witness.
    responder: Arc<dyn AttackResponder>,
}

impl DivergenceDetector {
    /// Create a detector with no witnesses and the no-op attack responder.
    pub fn new(config: DetectorConfig) -> DetectorResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            witnesses: Mutex::new(WitnessRegistry::new()),
            responder: Arc::new(NoopAttackResponder),
        })
    }

    /// Replace the attack responder.
    pub fn with_responder(mut self, responder: Arc<dyn AttackResponder>) -> Self {
        self.responder = responder;
        self
    }

    /// Detector configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Add a witness. Waits for any running detection to finish.
    pub async fn add_witness(&self, witness: Arc<dyn LightBlockProvider>) -> WitnessIndex {
        let mut registry = self.witnesses.lock().await;
        let index = registry.push(witness);
        debug!("[qc-13] Added witness {} (index {})", registry.id_of(index), index);
        index
    }

    /// Remove witnesses by index and return how many were removed. Waits
    /// for any running detection to finish.
    pub async fn remove_witnesses(&self, indices: &[WitnessIndex]) -> DetectorResult<usize> {
        self.witnesses.lock().await.remove_batch(indices)
    }

    /// Identifiers of the active witnesses, in index order.
    pub async fn witness_ids(&self) -> Vec<String> {
        self.witnesses.lock().await.ids()
    }

    /// One detection pass against a locked registry.
    async fn run_detection(
        &self,
        registry: &mut WitnessRegistry,
        primary_trace: &[LightBlock],
        target: &LightBlock,
        now: Timestamp,
    ) -> DetectorResult<()> {
        invariant_has_witnesses(registry.len())?;

        let witness_count = registry.len();
        let (tx, mut rx) = mpsc::channel(witness_count);
        let mut comparisons = JoinSet::new();

        for (index, witness) in registry.iter().enumerate() {
            let tx = tx.clone();
            let witness = Arc::clone(witness);
            let target = target.clone();
            let config = Arc::clone(&self.config);
            comparisons.spawn(
                async move {
                    let outcome =
                        compare_new_header_with_witness(&target, witness.as_ref(), index, &config)
                            .await;
                    if tx.send(outcome).await.is_err() {
                        debug!("[qc-13] Detection run ended before witness {} reported", index);
                    }
                }
                .in_current_span(),
            );
        }
        drop(tx);

        let mut header_matched = false;
        let mut witnesses_to_remove = Vec::new();

        for _ in 0..witness_count {
            let Some(outcome) = rx.recv().await else {
                warn!("[qc-13] A witness comparison ended without reporting");
                break;
            };

            let witness_index = outcome.witness_index();
            let remove = outcome.warrants_removal();

            match outcome {
                ComparisonOutcome::Matched { .. } => header_matched = true,

                ComparisonOutcome::Conflicting { block, .. } => {
                    let report = ConflictReport {
                        primary_trace: primary_trace.to_vec(),
                        conflicting_block: *block,
                        witness_index,
                        now,
                    };
                    if let Some(witness) = registry.get(witness_index) {
                        let response = self.responder.on_conflict(&report, witness.as_ref()).await;
                        if let Err(e) = response {
                            error!(
                                "[qc-13] Attack responder escalated conflict from witness {}: {}",
                                witness.id(),
                                e
                            );
                            return Err(e);
                        }
                    }
                }

                ComparisonOutcome::BadWitness { reason, .. } => {
                    info!(
                        "[qc-13] Witness {} returned an error during header comparison: {}",
                        registry.id_of(witness_index),
                        reason
                    );
                }

                ComparisonOutcome::Inconclusive { reason, .. } => {
                    debug!(
                        "[qc-13] Witness {} was inconclusive: {}",
                        registry.id_of(witness_index),
                        reason
                    );
                }
            }

            // Unavailability is not punished, conflicts and invalid data are.
            if remove {
                info!(
                    "[qc-13] Witness {} misbehaved -> removing it",
                    registry.id_of(witness_index)
                );
                witnesses_to_remove.push(witness_index);
            }
        }

        while let Some(joined) = comparisons.join_next().await {
            if let Err(e) = joined {
                warn!("[qc-13] Witness comparison task failed: {}", e);
            }
        }

        let removed = registry.remove_batch(&witnesses_to_remove)?;
        if removed > 0 {
            debug!("[qc-13] Pruned {} witnesses, {} left", removed, registry.len());
        }

        if header_matched {
            debug!("[qc-13] Header at height {} corroborated", target.height());
            return Ok(());
        }

        warn!(
            "[qc-13] No witness corroborated header at height {}",
            target.height()
        );
        Err(DetectorError::CrossReferencingFailed)
    }
}

#[async_trait]
impl DivergenceDetectorApi for DivergenceDetector {
    async fn detect_divergence(
        &self,
        primary_trace: &[LightBlock],
        now: Timestamp,
    ) -> Result<(), DetectorError> {
        invariant_trace_well_formed(primary_trace)?;
        let Some(target) = primary_trace.last() else {
            return Err(DetectorError::InvalidTrace("empty primary trace".to_string()));
        };

        let span = info_span!(
            "detect_divergence",
            run_id = %Uuid::new_v4(),
            height = target.height()
        );

        async {
            debug!(
                "[qc-13] Running detector against trace ending at height {} (length {})",
                target.height(),
                primary_trace.len()
            );

            let mut registry = self.witnesses.lock().await;
            self.run_detection(&mut registry, primary_trace, target, now)
                .await
        }
        .instrument(span)
        .await
    }

    async fn witness_count(&self) -> usize {
        self.witnesses.lock().await.len()
    }
}
