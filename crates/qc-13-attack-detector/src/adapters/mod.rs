//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for attack response.

mod evidence_reporter;

pub use evidence_reporter::EvidenceReportingResponder;
