//! Common types used throughout the simulator.
//!
//! This module provides the building blocks shared by every component:
//! 1. **Register Names:** Architectural integer and floating-point register references.
//! 2. **Machine Words:** Raw 64-bit values and their integer/float interpretations.
//! 3. **Error Handling:** Structural hazards, memory faults and simulation errors.

/// Machine word helpers and memory access kinds.
pub mod data;

/// Hazard, fault and error types.
pub mod error;

/// Architectural register names.
pub mod reg;

pub use data::{AccessType, Word};
pub use error::{Hazard, MemoryFault, ParseError, SimError, SimResult};
pub use reg::ArchReg;
