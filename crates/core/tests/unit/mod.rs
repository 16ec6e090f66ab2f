/// Configuration defaults and validation.
pub mod config;

/// Core pipeline, functional units and whole-CPU scenarios.
pub mod core;

/// Instruction decoding.
pub mod isa;

/// Machine image loading, timing table and simulator driver.
pub mod sim;

/// Statistics reporting.
pub mod stats;
