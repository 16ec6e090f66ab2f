//! General-Purpose Register File.
//!
//! This module implements the integer register file (`R0`..`R(n-1)`).
//! It performs the following:
//! 1. **Storage:** Maintains a configurable number of 64-bit integer registers.
//! 2. **Invariant Enforcement:** Ensures that register `R0` is hardwired to zero.
//! 3. **Debugging:** Provides iteration over registers holding non-zero values.

use crate::common::data::Word;

/// General-Purpose Register file.
///
/// Register `R0` is hardwired to zero and cannot be modified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gpr {
    regs: Vec<Word>,
}

impl Gpr {
    /// Creates a register file of `count` registers, all zero.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of registers in the file.
    pub fn new(count: usize) -> Self {
        Self {
            regs: vec![0; count],
        }
    }

    /// Reads a general-purpose register value.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index.
    ///
    /// # Returns
    ///
    /// The stored word. `R0` and indices outside the file read as 0.
    pub fn read(&self, idx: usize) -> Word {
        if idx == 0 {
            0
        } else {
            self.regs.get(idx).copied().unwrap_or(0)
        }
    }

    /// Writes a value to a general-purpose register.
    ///
    /// Writes to `R0` and to indices outside the file are discarded.
    pub fn write(&mut self, idx: usize, val: Word) {
        if idx != 0 {
            if let Some(slot) = self.regs.get_mut(idx) {
                *slot = val;
            }
        }
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.regs.len()
    }

    /// Returns true for an empty file.
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    /// Iterates over `(index, value)` for every non-zero register.
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, Word)> + '_ {
        self.regs
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, v)| v != 0)
    }
}
