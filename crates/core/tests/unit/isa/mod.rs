/// Instruction text decoding.
pub mod parse;
