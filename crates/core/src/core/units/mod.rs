//! Execution units and functional components.
//!
//! This module contains the evaluation logic behind the reservation-station
//! units and the branch resolution unit.

/// Arithmetic Logic Unit for integer operations and branch comparisons.
pub mod alu;

/// Branch Resolution Unit: direction predictor and BTB.
pub mod bru;

/// Floating-Point Unit for double-precision operations.
pub mod fpu;
