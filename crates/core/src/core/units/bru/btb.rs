//! Branch Target Buffer (BTB).
//!
//! The BTB owns the fetch address and the single speculative checkpoint. It:
//! 1. **Fetches:** Supplies the next instruction address unless the rename stage is stalled.
//! 2. **Predicts:** Consults the direction table when a conditional branch dispatches
//!    and redirects fetch down the predicted path.
//! 3. **Checkpoints:** Keeps the RAT and ROB snapshots taken at the branch.
//! 4. **Resolves:** Compares the broadcast outcome with the prediction and, on a
//!    mismatch, squashes the wrong path and redirects fetch.

use tracing::debug;

use super::BranchPredictor;
use super::direction::DirectionTable;
use crate::core::pipeline::cdb::CdbPacket;
use crate::core::pipeline::lsq::LoadStoreQueue;
use crate::core::pipeline::rat::{Rat, RatSnapshot};
use crate::core::pipeline::rob::{Rob, RobSnapshot, RobTag};
use crate::core::pipeline::station::UnitPool;
use crate::core::pipeline::tracker::Tracker;
use crate::core::pipeline::traits::CdbSubscriber;
use crate::isa::instruction::{INSTRUCTION_BYTES, Instruction};
use crate::stats::SimStats;

/// State saved when a conditional branch dispatches.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    /// ROB slot of the branch.
    pub tag: RobTag,
    /// Address of the branch.
    pub pc: u64,
    /// Predicted direction.
    pub predicted_taken: bool,
    /// Address reached when taken.
    pub target: u64,
    /// Address reached when not taken.
    pub fall_through: u64,
    /// Actual direction, once broadcast.
    pub outcome: Option<bool>,
    rat: RatSnapshot,
    rob: RobSnapshot,
}

impl Checkpoint {
    /// Address the branch actually continues at, once resolved.
    pub fn resolved_pc(&self) -> Option<u64> {
        self.outcome
            .map(|taken| if taken { self.target } else { self.fall_through })
    }
}

/// Outcome of a resolution check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The prediction held; speculative work becomes normal work.
    Correct {
        /// Address of the branch.
        pc: u64,
    },
    /// The prediction was wrong and the machine was rolled back.
    Mispredicted {
        /// Address of the branch.
        pc: u64,
        /// Instructions discarded.
        squashed: usize,
        /// Address fetch resumes at.
        redirect: u64,
    },
}

/// Components rolled back on a misprediction.
#[allow(missing_debug_implementations)]
pub struct RecoveryPorts<'a> {
    /// Alias table to restore.
    pub rat: &'a mut Rat,
    /// Reorder buffer to rewind.
    pub rob: &'a mut Rob,
    /// Functional units to squash.
    pub units: &'a mut UnitPool,
    /// Load/store queue to squash.
    pub lsq: &'a mut LoadStoreQueue,
    /// Diagnostic tracker.
    pub tracker: &'a mut dyn Tracker,
    /// Statistics sink.
    pub stats: &'a mut SimStats,
    /// Current cycle.
    pub cycle: u64,
}

/// Fetch address generator and branch checkpoint owner.
#[derive(Clone, Debug)]
pub struct BranchTargetBuffer {
    table: DirectionTable,
    next_pc: u64,
    end: u64,
    checkpoint: Option<Checkpoint>,
}

impl BranchTargetBuffer {
    /// Creates a BTB fetching from address zero.
    ///
    /// # Arguments
    ///
    /// * `entries` - Size of the direction table.
    /// * `program_end` - First address past the last instruction.
    pub fn new(entries: usize, program_end: u64) -> Self {
        Self {
            table: DirectionTable::new(entries),
            next_pc: 0,
            end: program_end,
            checkpoint: None,
        }
    }

    /// Next address fetch will return.
    pub const fn next_pc(&self) -> u64 {
        self.next_pc
    }

    /// Returns true once fetch has run past the program end.
    pub const fn is_exhausted(&self) -> bool {
        self.next_pc >= self.end
    }

    /// Returns true while a branch is awaiting resolution.
    pub const fn is_speculating(&self) -> bool {
        self.checkpoint.is_some()
    }

    /// The outstanding checkpoint.
    pub const fn checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    /// Current prediction for the branch at `pc`.
    pub fn predict(&self, pc: u64) -> bool {
        self.table.predict_branch(pc)
    }

    /// Supplies the next fetch address.
    ///
    /// # Arguments
    ///
    /// * `stall` - The rename stage is holding an instruction.
    ///
    /// # Returns
    ///
    /// `None` while stalled or once the program is exhausted.
    pub fn fetch_pc(&mut self, stall: bool) -> Option<u64> {
        if stall || self.is_exhausted() {
            return None;
        }
        let pc = self.next_pc;
        self.next_pc = pc.wrapping_add(INSTRUCTION_BYTES);
        Some(pc)
    }

    /// Records a dispatched conditional branch and redirects fetch down the
    /// predicted path.
    ///
    /// # Arguments
    ///
    /// * `inst` - The branch.
    /// * `tag` - Its ROB slot.
    /// * `rat` - Alias table after renaming the branch.
    /// * `rob` - ROB allocation point after the branch.
    pub fn issue(&mut self, inst: &Instruction, tag: RobTag, rat: RatSnapshot, rob: RobSnapshot) {
        let predicted_taken = self.table.predict_branch(inst.pc);
        let checkpoint = Checkpoint {
            tag,
            pc: inst.pc,
            predicted_taken,
            target: inst.branch_target(),
            fall_through: inst.fall_through(),
            outcome: None,
            rat,
            rob,
        };
        self.next_pc = if predicted_taken {
            checkpoint.target
        } else {
            checkpoint.fall_through
        };
        debug!(pc = inst.pc, %tag, predicted_taken, next_pc = self.next_pc, "predict");
        self.checkpoint = Some(checkpoint);
    }

    /// Resolves the outstanding branch if its outcome has been broadcast.
    ///
    /// A correct prediction simply drops the checkpoint. A misprediction
    /// trains the table, rewinds the ROB to the branch, squashes every
    /// younger station and LSQ entry, restores the alias table and redirects
    /// fetch to the correct successor.
    pub fn tick(&mut self, ports: &mut RecoveryPorts<'_>) -> Option<Resolution> {
        let resolved = self.checkpoint.as_ref()?.outcome?;
        let checkpoint = self.checkpoint.take()?;
        let pc = checkpoint.pc;

        if resolved == checkpoint.predicted_taken {
            ports.stats.branch_predictions += 1;
            debug!(cycle = ports.cycle, pc, taken = resolved, "branch resolved");
            return Some(Resolution::Correct { pc });
        }

        ports.stats.branch_mispredictions += 1;
        self.table.update_branch(pc, resolved);
        let redirect = checkpoint.resolved_pc()?;

        let squashed = ports.rob.rewind(checkpoint.rob);
        for entry in &squashed {
            ports.tracker.squash(entry.inst.pc);
        }
        ports.stats.squashed += squashed.len() as u64;
        ports.rat.restore(checkpoint.rat, ports.rob);
        ports.units.squash(ports.rob);
        ports.lsq.squash(ports.rob);
        self.next_pc = redirect;

        debug!(
            cycle = ports.cycle,
            pc,
            taken = resolved,
            squashed = squashed.len(),
            redirect,
            "rollback"
        );
        Some(Resolution::Mispredicted {
            pc,
            squashed: squashed.len(),
            redirect,
        })
    }
}

impl CdbSubscriber for BranchTargetBuffer {
    fn read_cdb(&mut self, packet: &CdbPacket) {
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            if checkpoint.tag == packet.tag {
                if let Some(taken) = packet.opcode.branch_taken(packet.value as i64) {
                    checkpoint.outcome = Some(taken);
                }
            }
        }
    }
}
