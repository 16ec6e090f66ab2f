//! Fault, hazard and error definitions.
//!
//! This module defines the two failure classes of the simulator and the errors
//! surfaced at the library boundary. It provides:
//! 1. **Structural Hazards:** Expected, retryable resource exhaustion (`Hazard`).
//! 2. **Memory Faults:** Simulated hardware exceptions that abort a run (`MemoryFault`).
//! 3. **Decode Errors:** Problems found while decoding instruction text (`ParseError`).
//! 4. **Simulation Errors:** The top-level error type returned by fallible APIs (`SimError`).

use thiserror::Error;

use crate::isa::instruction::UnitKind;

/// Structural hazard reported when a resource cannot accept more work.
///
/// Hazards are the normal backpressure mechanism of the pipeline: the caller
/// holds the instruction and retries on a later cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Hazard {
    /// Every reorder buffer slot is occupied.
    #[error("reorder buffer full")]
    RobFull,
    /// Every reservation station of every instance of the unit kind is busy.
    #[error("{0} reservation stations full")]
    StationsFull(UnitKind),
    /// The load/store queue has no free entry.
    #[error("load/store queue full")]
    LsqFull,
    /// A unit's result buffer is full and cannot accept a completed result.
    #[error("result buffer full")]
    ResultBufferFull,
    /// A conditional branch is already awaiting resolution.
    #[error("branch checkpoint outstanding")]
    CheckpointOutstanding,
}

/// Memory fault raised by an access that violates alignment or bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MemoryFault {
    /// The byte address is not a multiple of the word size.
    #[error("misaligned address {address:#x} (word size {word_bytes} bytes)")]
    Misaligned {
        /// Faulting byte address.
        address: u64,
        /// Word size the address must be aligned to.
        word_bytes: u64,
    },
    /// The byte address lies outside the memory array.
    #[error("address {address:#x} out of bounds (memory is {size_bytes} bytes)")]
    OutOfBounds {
        /// Faulting byte address.
        address: u64,
        /// Total memory size in bytes.
        size_bytes: u64,
    },
}

/// Errors produced while decoding a line of instruction text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The mnemonic does not name a supported opcode.
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    /// The operand is not a valid register name.
    #[error("invalid register `{0}`")]
    InvalidRegister(String),
    /// The operand is not a valid immediate.
    #[error("invalid immediate `{0}`")]
    InvalidImmediate(String),
    /// The operand is not of the form `imm(Rn)`.
    #[error("invalid memory operand `{0}`")]
    InvalidMemoryOperand(String),
    /// The register has the wrong file for this opcode.
    #[error("`{mnemonic}` cannot use register `{register}`")]
    RegisterClass {
        /// Opcode mnemonic.
        mnemonic: &'static str,
        /// Offending register name.
        register: String,
    },
    /// Wrong number of operands for the opcode.
    #[error("`{mnemonic}` expects {expected} operands, found {found}")]
    OperandCount {
        /// Opcode mnemonic.
        mnemonic: &'static str,
        /// Operands required by the opcode.
        expected: usize,
        /// Operands present in the text.
        found: usize,
    },
}

/// Top-level simulation error.
#[derive(Debug, Error)]
pub enum SimError {
    /// A memory fault reached the head of the reorder buffer.
    #[error("memory fault at pc {pc:#x}: {fault}")]
    Fault {
        /// Address of the faulting instruction.
        pc: u64,
        /// The fault itself.
        #[source]
        fault: MemoryFault,
    },
    /// The configuration or machine image is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A program line could not be decoded.
    #[error("program line {line}: {source}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Decode failure.
        #[source]
        source: ParseError,
    },
    /// Reading a machine image failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A machine image was not valid JSON for the expected schema.
    #[error("malformed machine image: {0}")]
    Json(#[from] serde_json::Error),
    /// The run did not drain within the configured cycle budget.
    #[error("cycle limit of {0} reached before the program drained")]
    CycleLimit(u64),
}

/// Result type for fallible simulator operations.
pub type SimResult<T> = Result<T, SimError>;
