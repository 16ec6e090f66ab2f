/// Whole-CPU scenarios.
pub mod cpu;

/// Bus arbitration and commit ordering.
pub mod pipeline;

/// Integer and floating-point datapaths.
pub mod units;
