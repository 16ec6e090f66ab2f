//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, which owns every component of the
//! Tomasulo machine. It coordinates the following:
//! 1. **State Management:** Architectural register files and data memory.
//! 2. **Out-of-order Structures:** RAT, ROB, reservation-station units, LSQ and CDB.
//! 3. **Speculation:** The BTB with its single outstanding branch checkpoint.
//! 4. **Observability:** Statistics and a pluggable stage tracker.

/// Per-cycle phase sequencing.
pub mod execution;

use crate::config::Config;
use crate::core::arch::RegisterFiles;
use crate::core::pipeline::cdb::Cdb;
use crate::core::pipeline::lsq::LoadStoreQueue;
use crate::core::pipeline::rat::Rat;
use crate::core::pipeline::rob::Rob;
use crate::core::pipeline::station::UnitPool;
use crate::core::pipeline::tracker::{NullTracker, Tracker};
use crate::core::units::bru::BranchTargetBuffer;
use crate::isa::program::Program;
use crate::soc::memory::Memory;
use crate::stats::SimStats;

/// Main CPU structure containing all processor state and components.
///
/// One call to [`Cpu::tick`] simulates one clock cycle.
#[derive(Debug)]
pub struct Cpu<T: Tracker = NullTracker> {
    /// Simulator configuration the machine was built from.
    pub config: Config,
    /// Integer and floating-point register files.
    pub regs: RegisterFiles,
    /// Data memory.
    pub memory: Memory,
    /// Instruction source.
    pub program: Program,
    /// Register alias table and rename stage.
    pub rat: Rat,
    /// Reorder buffer.
    pub rob: Rob,
    /// Reservation-station functional units.
    pub units: UnitPool,
    /// Load/store queue.
    pub lsq: LoadStoreQueue,
    /// Common data bus arbiter.
    pub cdb: Cdb,
    /// Fetch address generator and branch checkpoint.
    pub btb: BranchTargetBuffer,
    /// Performance statistics.
    pub stats: SimStats,
    /// Stage tracker.
    pub tracker: T,
    cycle: u64,
}

impl Cpu<NullTracker> {
    /// Creates a CPU without stage tracking.
    ///
    /// # Arguments
    ///
    /// * `config` - The simulator configuration parameters.
    /// * `program` - Instructions to run, starting at address zero.
    /// * `regs` - Initial architectural registers.
    /// * `memory` - Initial data memory.
    pub fn new(config: &Config, program: Program, regs: RegisterFiles, memory: Memory) -> Self {
        Self::with_tracker(config, program, regs, memory, NullTracker)
    }
}

impl<T: Tracker> Cpu<T> {
    /// Creates a CPU reporting stage transitions to `tracker`.
    ///
    /// # Returns
    ///
    /// A new `Cpu` instance initialized according to the provided configuration.
    pub fn with_tracker(
        config: &Config,
        program: Program,
        regs: RegisterFiles,
        memory: Memory,
        tracker: T,
    ) -> Self {
        let btb = BranchTargetBuffer::new(config.predictor.btb_entries, program.end_address());
        Self {
            config: config.clone(),
            regs,
            memory,
            rat: Rat::new(config.registers.count),
            rob: Rob::new(config.rob.entries),
            units: UnitPool::new(config),
            lsq: LoadStoreQueue::new(config),
            cdb: Cdb::new(),
            btb,
            program,
            stats: SimStats::default(),
            tracker,
            cycle: 0,
        }
    }

    /// Number of cycles simulated so far.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Returns true once the program has drained.
    ///
    /// Fetch has passed the program end, nothing is held or speculative, and
    /// every queue is empty.
    pub fn is_finished(&self) -> bool {
        self.btb.is_exhausted()
            && !self.btb.is_speculating()
            && self.rat.held().is_none()
            && self.rob.is_empty()
            && self.lsq.is_empty()
            && self.units.is_idle()
    }

    /// Consumes the CPU, returning its tracker.
    pub fn into_tracker(self) -> T {
        self.tracker
    }
}
