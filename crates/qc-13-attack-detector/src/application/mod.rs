//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod registry;
pub mod service;

pub use registry::WitnessRegistry;
pub use service::DivergenceDetector;
