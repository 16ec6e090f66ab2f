//! Diagnostic stage tracker.
//!
//! Components report stage transitions by instruction address. Tracking is
//! fire-and-forget; nothing in the pipeline reads it back.

use std::fmt;

/// Pipeline stages reported to a tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Accepted by dispatch.
    Issue,
    /// Began executing (or computing its address).
    Execute,
    /// Began its data memory access.
    Memory,
    /// Result broadcast on the common data bus.
    WriteBack,
    /// Retired (stores: authorized to write memory).
    Commit,
}

impl Stage {
    /// Every stage, in column order.
    pub const ALL: [Self; 5] = [
        Self::Issue,
        Self::Execute,
        Self::Memory,
        Self::WriteBack,
        Self::Commit,
    ];

    /// Short column name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Execute => "execute",
            Self::Memory => "memory",
            Self::WriteBack => "wrtback",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receiver of stage transition notifications.
pub trait Tracker {
    /// The instruction at `pc` entered `stage` in the current cycle.
    fn update(&mut self, stage: Stage, pc: u64);

    /// A new cycle begins.
    fn begin_cycle(&mut self, _cycle: u64) {}

    /// The youngest in-flight instance of the instruction at `pc` was discarded.
    fn squash(&mut self, _pc: u64) {}
}

/// Tracker that discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTracker;

impl Tracker for NullTracker {
    fn update(&mut self, _stage: Stage, _pc: u64) {}
}
