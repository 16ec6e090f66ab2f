//! One-bit direction table.
//!
//! A direct-mapped table of taken/not-taken bits indexed by instruction slot.
//! Every bucket starts as not taken and is overwritten with the last
//! mispredicted outcome.

use super::BranchPredictor;
use crate::isa::instruction::INSTRUCTION_BYTES;

/// Direct-mapped table of one-bit predictions.
#[derive(Clone, Debug)]
pub struct DirectionTable {
    bits: Vec<bool>,
}

impl DirectionTable {
    /// Creates a table of `size` buckets, all predicting not taken.
    pub fn new(size: usize) -> Self {
        Self {
            bits: vec![false; size.max(1)],
        }
    }

    /// Bucket for `pc`: the instruction index modulo the table size.
    fn index(&self, pc: u64) -> usize {
        ((pc / INSTRUCTION_BYTES) % self.bits.len() as u64) as usize
    }
}

impl BranchPredictor for DirectionTable {
    fn predict_branch(&self, pc: u64) -> bool {
        self.bits[self.index(pc)]
    }

    fn update_branch(&mut self, pc: u64, taken: bool) {
        let idx = self.index(pc);
        self.bits[idx] = taken;
    }
}
