//! Branch resolution unit (BRU).
//!
//! This module contains the direction predictor consulted at dispatch and the
//! branch target buffer that owns the fetch address and the speculative
//! checkpoint.

pub use self::branch_predictor::BranchPredictor;
pub use self::btb::{BranchTargetBuffer, Checkpoint, RecoveryPorts, Resolution};

/// Branch predictor trait.
pub mod branch_predictor;

/// Fetch address generation, checkpointing and misprediction recovery.
pub mod btb;

/// One-bit direction table.
pub mod direction;
