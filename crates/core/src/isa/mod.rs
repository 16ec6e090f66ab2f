//! Instruction Set Definitions.
//!
//! Contains the opcode table, the decoded instruction record, the textual
//! decoder and the instruction source consulted by fetch.
//!
//! # Opcodes
//!
//! * Integer: `Add`, `Sub`, `Addi`, `Beq`, `Bne`.
//! * Floating-point: `Add.d`, `Sub.d`, `Mult.d`.
//! * Memory: `Ld`, `Sd`.
//! * `Nop`.

/// Opcodes, unit routing and decoded instruction records.
pub mod instruction;

/// Textual instruction decoding.
pub mod parse;

/// Program storage and fetch.
pub mod program;

pub use instruction::{Instruction, Opcode, Route, UnitKind};
pub use program::Program;
