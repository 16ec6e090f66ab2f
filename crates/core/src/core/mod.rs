//! Core processor implementation.
//!
//! This module contains the Tomasulo CPU: the architectural register files,
//! the out-of-order pipeline structures, the execution units and the CPU
//! that sequences them once per cycle.

/// Architectural register files.
pub mod arch;

/// CPU core and per-cycle phase sequencing.
pub mod cpu;

/// Out-of-order pipeline structures (RAT, ROB, stations, LSQ, CDB).
pub mod pipeline;

/// Execution units (ALU, FPU, branch resolution).
pub mod units;

pub use self::cpu::Cpu;
