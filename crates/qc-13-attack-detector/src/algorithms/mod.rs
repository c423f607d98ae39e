//! # Algorithms
//!
//! Per-witness comparison and height reconciliation.

pub mod comparator;
pub mod reconciliation;

pub use comparator::compare_new_header_with_witness;
pub use reconciliation::{fetch_light_block, get_target_block_or_latest, TargetOrLatest};
