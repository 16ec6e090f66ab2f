//! Tomasulo out-of-order processor simulator library.
//!
//! This crate implements a cycle-accurate model of a single-issue Tomasulo machine with the following:
//! 1. **Core:** Register renaming, reservation stations, a load/store queue, a common data bus
//!    and a reorder buffer for in-order commit.
//! 2. **Speculation:** A one-bit branch predictor with a single outstanding checkpoint and
//!    rollback on misprediction.
//! 3. **ISA:** A small integer and double-precision instruction set decoded from text.
//! 4. **Memory:** Word-aligned flat data memory with alignment and bounds faults.
//! 5. **Simulation:** Machine image loading, configuration, timing tables and statistics.

/// Common types (errors, register names, machine words).
pub mod common;
/// Simulator configuration (defaults and hierarchical config structures).
pub mod config;
/// CPU core (architectural state, pipeline structures, execution units).
pub mod core;
/// Instruction set (opcodes, routing table, text decoding, programs).
pub mod isa;
/// Simulation driver, machine image loader and timing table.
pub mod sim;
/// Data memory.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main CPU type; owns every pipeline structure.
pub use crate::core::Cpu;
/// Run loop wrapper around a tracked CPU.
pub use crate::sim::Simulator;
