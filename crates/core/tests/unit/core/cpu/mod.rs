/// Cycle-level execution scenarios.
pub mod execution;
