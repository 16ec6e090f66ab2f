//! Floating-Point Unit (FPU).
//!
//! This module implements the double-precision datapath shared by the
//! floating-point adder and multiplier reservation-station units. Operands
//! and results are raw IEEE 754 bit patterns; NaN results are canonicalized.

use crate::common::data::{Word, from_float, to_float};
use crate::isa::instruction::Opcode;

/// Canonical quiet NaN for double precision.
const CANONICAL_NAN_F64: u64 = 0x7ff8_0000_0000_0000;

/// Replaces any NaN with the canonical quiet NaN.
#[inline]
pub fn canonicalize_f64(f: f64) -> f64 {
    if f.is_nan() {
        f64::from_bits(CANONICAL_NAN_F64)
    } else {
        f
    }
}

/// Floating-Point Unit (FPU) for double-precision operations.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fpu;

impl Fpu {
    /// Executes a double-precision operation.
    ///
    /// # Arguments
    ///
    /// * `op` - `Add.d`, `Sub.d` or `Mult.d`.
    /// * `a`  - First operand bits.
    /// * `b`  - Second operand bits.
    ///
    /// # Returns
    ///
    /// Result bits; `0` for opcodes the floating-point units do not implement.
    pub fn execute(op: Opcode, a: Word, b: Word) -> Word {
        let (x, y) = (to_float(a), to_float(b));
        let result = match op {
            Opcode::AddD => x + y,
            Opcode::SubD => x - y,
            Opcode::MultD => x * y,
            _ => return 0,
        };
        from_float(canonicalize_f64(result))
    }
}
