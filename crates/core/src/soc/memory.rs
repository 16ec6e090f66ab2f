//! Flat data memory.
//!
//! A fixed-size, word-addressed array. Every access is checked for alignment
//! to the configured word size and for bounds. Each word slot holds a full
//! 64-bit machine word so floating-point values survive a store/load pair
//! unchanged; `word_bytes` only fixes the address granularity.

use crate::common::data::Word;
use crate::common::error::MemoryFault;

/// Word-addressed data memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    words: Vec<Word>,
    word_bytes: u64,
}

impl Memory {
    /// Creates a zeroed memory.
    ///
    /// # Arguments
    ///
    /// * `size_bytes` - Total size; a multiple of `word_bytes`.
    /// * `word_bytes` - Alignment and stride of a word.
    pub fn new(size_bytes: usize, word_bytes: usize) -> Self {
        let word_bytes = word_bytes.max(1);
        Self {
            words: vec![0; size_bytes / word_bytes],
            word_bytes: word_bytes as u64,
        }
    }

    /// Total size in bytes.
    #[inline]
    pub fn size_bytes(&self) -> u64 {
        self.words.len() as u64 * self.word_bytes
    }

    /// Word size in bytes.
    #[inline]
    pub const fn word_bytes(&self) -> u64 {
        self.word_bytes
    }

    /// Validates an address without touching memory.
    ///
    /// # Returns
    ///
    /// The word index on success.
    pub fn check(&self, address: u64) -> Result<usize, MemoryFault> {
        if address % self.word_bytes != 0 {
            return Err(MemoryFault::Misaligned {
                address,
                word_bytes: self.word_bytes,
            });
        }
        let index = address / self.word_bytes;
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.words.len())
            .ok_or(MemoryFault::OutOfBounds {
                address,
                size_bytes: self.size_bytes(),
            })
    }

    /// Reads the word at `address`.
    pub fn read(&self, address: u64) -> Result<Word, MemoryFault> {
        let index = self.check(address)?;
        Ok(self.words[index])
    }

    /// Writes the word at `address`.
    pub fn write(&mut self, address: u64, value: Word) -> Result<(), MemoryFault> {
        let index = self.check(address)?;
        self.words[index] = value;
        Ok(())
    }

    /// Iterates over `(address, word)` for every non-zero word.
    pub fn nonzero_words(&self) -> impl Iterator<Item = (u64, Word)> + '_ {
        let stride = self.word_bytes;
        self.words
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w != 0)
            .map(move |(i, &w)| (i as u64 * stride, w))
    }
}
