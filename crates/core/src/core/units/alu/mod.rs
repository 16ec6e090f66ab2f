//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer datapath of the integer adder
//! reservation-station unit: two's-complement add and subtract on 64-bit
//! words. Branch comparisons reuse the subtractor and leave the outcome test
//! to the branch target buffer.

use crate::common::data::Word;
use crate::isa::instruction::Opcode;

/// Arithmetic Logic Unit (ALU) for integer operations.
#[derive(Clone, Copy, Debug, Default)]
pub struct Alu;

impl Alu {
    /// Executes an integer operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The opcode; `Addi` expects the immediate in `b`.
    /// * `a`  - First operand.
    /// * `b`  - Second operand.
    ///
    /// # Returns
    ///
    /// The wrapped 64-bit result. Branches return `a - b`. Returns `0` for
    /// opcodes the integer adder does not implement.
    ///
    /// # Examples
    ///
    /// ```
    /// use tomasim_core::core::units::alu::Alu;
    /// use tomasim_core::isa::Opcode;
    ///
    /// assert_eq!(Alu::execute(Opcode::Addi, 5, 3), 8);
    /// assert_eq!(Alu::execute(Opcode::Sub, 2, 3), u64::MAX);
    /// assert_eq!(Alu::execute(Opcode::Beq, 7, 7), 0);
    /// ```
    pub const fn execute(op: Opcode, a: Word, b: Word) -> Word {
        match op {
            Opcode::Add | Opcode::Addi => a.wrapping_add(b),
            Opcode::Sub | Opcode::Beq | Opcode::Bne => a.wrapping_sub(b),
            _ => 0,
        }
    }
}
