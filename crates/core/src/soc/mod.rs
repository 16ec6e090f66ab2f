//! Memory system collaborators.
//!
//! The data memory accessed by the load/store queue.

/// Word-aligned, bounds-checked flat memory.
pub mod memory;

pub use memory::Memory;
