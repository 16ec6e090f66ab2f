//! Simulation driver, machine image loading and timing output.
//!
//! Provides the machine image loader, the run loop that drives the CPU to
//! completion, and the timing table recorded while it runs.

/// Machine image (configuration, initial state and program) loading.
pub mod loader;

/// Run loop and report rendering.
pub mod simulator;

/// Per-instruction stage timing table.
pub mod timing;

pub use self::loader::MachineImage;
pub use self::simulator::Simulator;
pub use self::timing::TimingTable;
