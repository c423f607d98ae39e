//! # Domain Entities
//!
//! Core entities for attack detection: headers, validator set summaries and
//! light blocks.

use super::errors::{Hash, ProviderError, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Proposer address type alias
pub type Address = [u8; 20];

/// Signed block header (fields relevant to the light client).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    /// Chain identifier.
    pub chain_id: String,
    /// Block height.
    pub height: u64,
    /// Block time (unix millis).
    pub time: Timestamp,
    /// Hash of the previous block.
    pub last_block_hash: Hash,
    /// Application state root after the previous block.
    pub app_hash: Hash,
    /// Hash of the validator set that signed this block.
    pub validators_hash: Hash,
    /// Address of the block proposer.
    pub proposer: Address,
}

impl Header {
    /// Content hash of the header.
    ///
    /// SHA-256 over the fields in declaration order; integers big-endian,
    /// the chain id length-prefixed.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update((self.chain_id.len() as u64).to_be_bytes());
        hasher.update(self.chain_id.as_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.time.to_be_bytes());
        hasher.update(self.last_block_hash);
        hasher.update(self.app_hash);
        hasher.update(self.validators_hash);
        hasher.update(self.proposer);
        hasher.finalize().into()
    }
}

/// Summary of the validator set attached to a light block.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorSetSummary {
    /// Hash of the full validator set.
    pub hash: Hash,
    /// Sum of voting power.
    pub total_voting_power: u64,
    /// Number of validators.
    pub validator_count: usize,
}

impl ValidatorSetSummary {
    /// Create a new validator set summary.
    pub fn new(hash: Hash, total_voting_power: u64, validator_count: usize) -> Self {
        Self {
            hash,
            total_voting_power,
            validator_count,
        }
    }
}

/// Light block: header plus validator set, enough to verify a block
/// without full chain history.
///
/// Immutable once built; two light blocks at the same height are the same
/// block iff their hashes are equal. The hash is recomputed on
/// deserialization, a serialized `hash` field is ignored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "LightBlockParts")]
pub struct LightBlock {
    header: Header,
    validators: ValidatorSetSummary,
    hash: Hash,
}

impl LightBlock {
    /// Build a light block, computing its hash from the header.
    pub fn new(header: Header, validators: ValidatorSetSummary) -> Self {
        let hash = header.hash();
        Self {
            header,
            validators,
            hash,
        }
    }

    /// The signed header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Validator set summary.
    pub fn validators(&self) -> &ValidatorSetSummary {
        &self.validators
    }

    /// Block height.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Block time (unix millis).
    pub fn time(&self) -> Timestamp {
        self.header.time
    }

    /// Content hash of the header.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Stateless sanity checks a provider response must pass.
    ///
    /// # Errors
    /// - `BadLightBlock` on chain id mismatch, zero height, validator hash
    ///   mismatch or an empty validator set
    pub fn validate_basic(&self, chain_id: &str) -> Result<(), ProviderError> {
        if self.header.chain_id != chain_id {
            return Err(ProviderError::bad_light_block(format!(
                "header belongs to another chain {:?}, not {:?}",
                self.header.chain_id, chain_id
            )));
        }

        if self.header.height == 0 {
            return Err(ProviderError::bad_light_block("zero height"));
        }

        if self.header.validators_hash != self.validators.hash {
            return Err(ProviderError::bad_light_block(format!(
                "expected validators hash of header to match validator set hash ({:02x}{:02x}... != {:02x}{:02x}...)",
                self.header.validators_hash[0],
                self.header.validators_hash[1],
                self.validators.hash[0],
                self.validators.hash[1],
            )));
        }

        if self.validators.validator_count == 0 || self.validators.total_voting_power == 0 {
            return Err(ProviderError::bad_light_block("empty validator set"));
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct LightBlockParts {
    header: Header,
    validators: ValidatorSetSummary,
}

impl From<LightBlockParts> for LightBlock {
    fn from(parts: LightBlockParts) -> Self {
        Self::new(parts.header, parts.validators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_header(height: u64, time: Timestamp) -> Header {
        Header {
            chain_id: "test-chain".to_string(),
            height,
            time,
            last_block_hash: [1u8; 32],
            app_hash: [2u8; 32],
            validators_hash: [3u8; 32],
            proposer: [4u8; 20],
        }
    }

    fn create_block(height: u64, time: Timestamp) -> LightBlock {
        LightBlock::new(
            create_header(height, time),
            ValidatorSetSummary::new([3u8; 32], 100, 4),
        )
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = create_block(10, 1_000);
        let b = create_block(10, 1_000);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_covers_app_hash() {
        let a = create_block(10, 1_000);
        let mut header = create_header(10, 1_000);
        header.app_hash = [9u8; 32];
        let b = LightBlock::new(header, ValidatorSetSummary::new([3u8; 32], 100, 4));
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_ignores_validator_summary() {
        let a = create_block(10, 1_000);
        let b = LightBlock::new(
            create_header(10, 1_000),
            ValidatorSetSummary::new([3u8; 32], 999, 7),
        );
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_chain_id_is_length_prefixed() {
        let mut h1 = create_header(1, 0);
        h1.chain_id = "ab".to_string();
        let mut h2 = create_header(1, 0);
        h2.chain_id = "a".to_string();
        assert_ne!(h1.hash(), h2.hash());
    }

    #[test]
    fn test_validate_basic_ok() {
        assert!(create_block(5, 100).validate_basic("test-chain").is_ok());
    }

    #[test]
    fn test_validate_basic_wrong_chain() {
        let err = create_block(5, 100).validate_basic("other-chain").unwrap_err();
        assert!(err.is_bad_light_block());
    }

    #[test]
    fn test_validate_basic_validators_mismatch() {
        let block = LightBlock::new(
            create_header(5, 100),
            ValidatorSetSummary::new([8u8; 32], 100, 4),
        );
        assert!(block.validate_basic("test-chain").is_err());
    }

    #[test]
    fn test_validate_basic_empty_set() {
        let block = LightBlock::new(
            create_header(5, 100),
            ValidatorSetSummary::new([3u8; 32], 0, 0),
        );
        assert!(block.validate_basic("test-chain").is_err());
    }

    #[test]
    fn test_serde_round_trip_keeps_hash() {
        let block = create_block(7, 700);
        let json = serde_json::to_string(&block).unwrap();
        let decoded: LightBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn test_deserialize_recomputes_hash() {
        let block = create_block(7, 700);
        let mut value = serde_json::to_value(&block).unwrap();
        value["hash"] = serde_json::json!(vec![0u8; 32]);
        let decoded: LightBlock = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.hash(), block.hash());
    }
}
