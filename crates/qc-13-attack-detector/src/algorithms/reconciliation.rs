//! # Height Reconciliation
//!
//! Bounded provider calls and the "target block or latest" lookup used when a
//! witness claims it has not reached the target height yet.

use crate::config::DetectorConfig;
use crate::domain::{LightBlock, ProviderError};
use crate::ports::{LightBlockProvider, LATEST_HEIGHT};
use tokio::time::timeout;
use tracing::debug;

/// What a witness could offer for a target height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetOrLatest {
    /// The witness's block at exactly the target height.
    Target(LightBlock),
    /// The witness is behind: its latest block, below the target height.
    Latest(LightBlock),
}

/// Fetch a light block from a provider, bounded by the configured timeout.
///
/// # Errors
/// - `NoResponse` if the call does not finish within `provider_timeout`
/// - `BadLightBlock` if an explicit height was requested and another height
///   came back, or if the block fails `validate_basic`
/// - any error the provider returned
pub async fn fetch_light_block(
    provider: &dyn LightBlockProvider,
    height: u64,
    config: &DetectorConfig,
) -> Result<LightBlock, ProviderError> {
    let block = match timeout(config.provider_timeout(), provider.light_block(height)).await {
        Ok(response) => response?,
        Err(_) => {
            debug!(
                "[qc-13] Provider {} timed out after {:?} at height {}",
                provider.id(),
                config.provider_timeout(),
                height
            );
            return Err(ProviderError::NoResponse);
        }
    };

    if height != LATEST_HEIGHT && block.height() != height {
        return Err(ProviderError::bad_light_block(format!(
            "requested height {}, received {}",
            height,
            block.height()
        )));
    }

    block.validate_basic(&config.chain_id)?;
    Ok(block)
}

/// Get the witness's latest block; if it is past `height`, fetch `height`
/// directly instead.
///
/// - latest == height: the latest block is the target
/// - latest > height: one direct fetch at `height`, trusted as the target
/// - latest < height: the latest block, for lag analysis
///
/// # Errors
/// Any provider error short-circuits.
pub async fn get_target_block_or_latest(
    height: u64,
    witness: &dyn LightBlockProvider,
    config: &DetectorConfig,
) -> Result<TargetOrLatest, ProviderError> {
    let latest = fetch_light_block(witness, LATEST_HEIGHT, config).await?;

    if latest.height() == height {
        return Ok(TargetOrLatest::Target(latest));
    }

    if latest.height() > height {
        // Single direct fetch so a witness oscillating around the target
        // height cannot keep us looping.
        let block = fetch_light_block(witness, height, config).await?;
        return Ok(TargetOrLatest::Target(block));
    }

    Ok(TargetOrLatest::Latest(latest))
}
