//! Floating-Point Register File.
//!
//! Registers hold IEEE 754 doubles, exchanged with the pipeline as raw bits.

use crate::common::data::Word;

/// Floating-Point Register file.
#[derive(Clone, Debug, PartialEq)]
pub struct Fpr {
    fregs: Vec<f64>,
}

impl Fpr {
    /// Creates a register file of `count` registers, all `0.0`.
    pub fn new(count: usize) -> Self {
        Self {
            fregs: vec![0.0; count],
        }
    }

    /// Reads a floating-point register value as raw bits.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index.
    ///
    /// # Returns
    ///
    /// The 64-bit IEEE 754 representation; 0 for indices outside the file.
    pub fn read(&self, idx: usize) -> Word {
        self.fregs.get(idx).map_or(0, |v| v.to_bits())
    }

    /// Writes a floating-point register value from raw bits.
    pub fn write(&mut self, idx: usize, val: Word) {
        if let Some(slot) = self.fregs.get_mut(idx) {
            *slot = f64::from_bits(val);
        }
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.fregs.len()
    }

    /// Returns true for an empty file.
    pub fn is_empty(&self) -> bool {
        self.fregs.is_empty()
    }

    /// Iterates over `(index, value)` for every register not equal to `0.0`.
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.fregs
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, v)| v != 0.0)
    }
}
