//! Branch Predictor Interface.
//!
//! This module defines the `BranchPredictor` trait implemented by direction
//! predictors consulted when a conditional branch is dispatched.

/// Trait for branch direction prediction algorithms.
pub trait BranchPredictor {
    /// Predicts whether the branch at `pc` will be taken.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter of the branch instruction
    fn predict_branch(&self, pc: u64) -> bool;

    /// Trains the predictor with a resolved outcome.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter of the branch instruction
    /// * `taken` - Whether the branch was actually taken
    fn update_branch(&mut self, pc: u64, taken: bool);
}
