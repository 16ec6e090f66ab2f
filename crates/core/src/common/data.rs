//! Machine words and memory access kinds.
//!
//! Values travel through the pipeline as raw 64-bit words. Integer units
//! interpret them as two's-complement `i64`, floating-point units as IEEE-754
//! doubles. These helpers keep the reinterpretation in one place.

/// A raw 64-bit machine word.
pub type Word = u64;

/// Encodes a signed integer as a machine word.
#[inline]
pub const fn from_int(value: i64) -> Word {
    value as Word
}

/// Decodes a machine word as a signed integer.
#[inline]
pub const fn to_int(word: Word) -> i64 {
    word as i64
}

/// Encodes a double as a machine word.
#[inline]
pub const fn from_float(value: f64) -> Word {
    value.to_bits()
}

/// Decodes a machine word as a double.
#[inline]
pub const fn to_float(word: Word) -> f64 {
    f64::from_bits(word)
}

/// Kind of data memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Data read performed by a load.
    Load,
    /// Data write performed by a store.
    Store,
}
