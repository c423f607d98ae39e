//! # Witness Registry
//!
//! Ordered set of witness providers. A witness's position is its identity
//! for error reporting and removal, so positions must not move while a
//! detection run is using them; the owning service keeps the registry behind
//! a single lock held for the whole run.

use crate::domain::{DetectorError, DetectorResult, WitnessIndex};
use crate::ports::LightBlockProvider;
use std::sync::Arc;
use tracing::warn;

/// Index-addressed list of witnesses.
#[derive(Default)]
pub struct WitnessRegistry {
    witnesses: Vec<Arc<dyn LightBlockProvider>>,
}

impl WitnessRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a witness; it gets the next index.
    pub fn push(&mut self, witness: Arc<dyn LightBlockProvider>) -> WitnessIndex {
        self.witnesses.push(witness);
        self.witnesses.len() - 1
    }

    /// Number of witnesses.
    pub fn len(&self) -> usize {
        self.witnesses.len()
    }

    /// Is the registry empty?
    pub fn is_empty(&self) -> bool {
        self.witnesses.is_empty()
    }

    /// Witness at `index`.
    pub fn get(&self, index: WitnessIndex) -> Option<&Arc<dyn LightBlockProvider>> {
        self.witnesses.get(index)
    }

    /// Identifier of the witness at `index`, for logging.
    pub fn id_of(&self, index: WitnessIndex) -> &str {
        self.witnesses
            .get(index)
            .map(|w| w.id())
            .unwrap_or("<unknown>")
    }

    /// Iterate witnesses in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn LightBlockProvider>> {
        self.witnesses.iter()
    }

    /// Identifiers of all witnesses in index order.
    pub fn ids(&self) -> Vec<String> {
        self.witnesses.iter().map(|w| w.id().to_string()).collect()
    }

    /// Remove a batch of witnesses.
    ///
    /// Indices refer to positions before any removal. Duplicates are ignored;
    /// removal runs from the highest index down so lower positions don't shift
    /// underneath us. Returns the number of witnesses removed.
    ///
    /// # Errors
    /// - `WitnessIndexOutOfRange` if any index is not in the registry; nothing
    ///   is removed in that case
    pub fn remove_batch(
        &mut self,
        indices: &[WitnessIndex],
    ) -> DetectorResult<usize> {
        let mut indices = indices.to_vec();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();

        if let Some(&highest) = indices.first() {
            if highest >= self.witnesses.len() {
                return Err(DetectorError::WitnessIndexOutOfRange {
                    index: highest,
                    len: self.witnesses.len(),
                });
            }
        }

        for &index in &indices {
            let witness = self.witnesses.remove(index);
            warn!("[qc-13] Removed witness {} (index {})", witness.id(), index);
        }

        Ok(indices.len())
    }
}
