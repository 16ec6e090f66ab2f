//! Register Alias Table (RAT) and the rename/dispatch stage.
//!
//! The RAT maps each architectural register to the ROB slot of its newest
//! in-flight producer. Once per cycle it:
//! 1. **Fetches:** Takes the held instruction, or asks the BTB for the next address.
//! 2. **Checks Resources:** ROB slot, reservation station or LSQ entry, branch checkpoint.
//! 3. **Renames:** Captures source aliases, then points the destination at the new tag.
//! 4. **Routes:** Issues to the unit dictated by the opcode, or to the LSQ.
//! 5. **Holds:** Keeps the instruction for retry when any resource is exhausted.
//!
//! Dispatch is all-or-nothing: resources are checked before anything is
//! allocated, so a held instruction has no partial state in the machine.

use tracing::{debug, trace};

use crate::common::error::Hazard;
use crate::common::reg::ArchReg;
use crate::core::arch::RegisterFiles;
use crate::core::units::bru::BranchTargetBuffer;
use crate::isa::instruction::{Instruction, Opcode, Route};
use crate::isa::program::Program;
use crate::stats::SimStats;

use super::lsq::LoadStoreQueue;
use super::rob::{Rob, RobTag};
use super::station::UnitPool;
use super::tracker::{Stage, Tracker};

/// A renamed source: the register and, if pending, its producer's tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Source {
    /// Architectural register read.
    pub reg: ArchReg,
    /// Producer tag captured at rename time.
    pub tag: Option<RobTag>,
}

/// An instruction after renaming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Renamed {
    /// The decoded instruction.
    pub inst: Instruction,
    /// Its ROB slot.
    pub tag: RobTag,
    /// First source.
    pub src1: Option<Source>,
    /// Second source.
    pub src2: Option<Source>,
}

/// Copy of the alias table taken at a branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatSnapshot {
    int: Vec<Option<RobTag>>,
    fp: Vec<Option<RobTag>>,
}

/// Outcome of one rename cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing to fetch.
    Idle,
    /// A no-op consumed the fetch slot.
    Nop,
    /// The instruction was accepted into this ROB slot.
    Issued(RobTag),
    /// A structural hazard held the instruction.
    Stalled(Hazard),
}

/// Components the rename stage reads or allocates from.
#[allow(missing_debug_implementations)]
pub struct DispatchPorts<'a> {
    /// Instruction source.
    pub program: &'a Program,
    /// Fetch address source and checkpoint owner.
    pub btb: &'a mut BranchTargetBuffer,
    /// Reorder buffer.
    pub rob: &'a mut Rob,
    /// Reservation-station units.
    pub units: &'a mut UnitPool,
    /// Load/store queue.
    pub lsq: &'a mut LoadStoreQueue,
    /// Architectural registers, for operand fallback.
    pub regs: &'a RegisterFiles,
    /// Diagnostic tracker.
    pub tracker: &'a mut dyn Tracker,
    /// Statistics sink.
    pub stats: &'a mut SimStats,
    /// Current cycle.
    pub cycle: u64,
}

/// Register Alias Table.
#[derive(Clone, Debug)]
pub struct Rat {
    int: Vec<Option<RobTag>>,
    fp: Vec<Option<RobTag>>,
    held: Option<Instruction>,
}

impl Rat {
    /// Creates a table with every register resolved.
    pub fn new(register_count: usize) -> Self {
        Self {
            int: vec![None; register_count],
            fp: vec![None; register_count],
            held: None,
        }
    }

    fn slot(&self, reg: ArchReg) -> Option<&Option<RobTag>> {
        match reg {
            ArchReg::Int(i) => self.int.get(usize::from(i)),
            ArchReg::Fp(i) => self.fp.get(usize::from(i)),
        }
    }

    fn slot_mut(&mut self, reg: ArchReg) -> Option<&mut Option<RobTag>> {
        match reg {
            ArchReg::Int(i) => self.int.get_mut(usize::from(i)),
            ArchReg::Fp(i) => self.fp.get_mut(usize::from(i)),
        }
    }

    /// The pending producer of `reg`, or `None` if the value is architectural.
    pub fn alias(&self, reg: ArchReg) -> Option<RobTag> {
        self.slot(reg).copied().flatten()
    }

    /// The instruction waiting for resources, if any.
    pub const fn held(&self) -> Option<&Instruction> {
        self.held.as_ref()
    }

    /// Renames `inst` into ROB slot `tag`.
    ///
    /// Sources are looked up before the destination alias is overwritten, so
    /// `Add R1, R1, R2` reads the previous producer of `R1`.
    pub fn rename(&mut self, inst: Instruction, tag: RobTag) -> Renamed {
        let source = |reg: ArchReg| Source {
            reg,
            tag: self.alias(reg),
        };
        let renamed = Renamed {
            inst,
            tag,
            src1: inst.src1.map(source),
            src2: inst.src2.map(source),
        };
        if let Some(slot) = inst.renamed_dest().and_then(|d| self.slot_mut(d)) {
            *slot = Some(tag);
        }
        renamed
    }

    /// Resolves `reg` if its alias still names `tag`. Called on commit.
    pub fn clear(&mut self, reg: ArchReg, tag: RobTag) {
        if let Some(slot) = self.slot_mut(reg) {
            if *slot == Some(tag) {
                *slot = None;
            }
        }
    }

    /// Copies the alias table.
    pub fn snapshot(&self) -> RatSnapshot {
        RatSnapshot {
            int: self.int.clone(),
            fp: self.fp.clone(),
        }
    }

    /// Restores the alias table after a misprediction.
    ///
    /// Aliases whose producers committed since the snapshot are resolved, and
    /// the held instruction (always on the wrong path) is discarded.
    pub fn restore(&mut self, snapshot: RatSnapshot, rob: &Rob) {
        self.int = snapshot.int;
        self.fp = snapshot.fp;
        for alias in self.int.iter_mut().chain(self.fp.iter_mut()) {
            if alias.is_some_and(|tag| !rob.is_live(tag)) {
                *alias = None;
            }
        }
        self.held = None;
    }

    /// Rename/dispatch stage for one cycle.
    pub fn tick(&mut self, ports: &mut DispatchPorts<'_>) -> Dispatch {
        let fetched = ports.btb.fetch_pc(self.held.is_some());
        let Some(inst) = self
            .held
            .take()
            .or_else(|| fetched.map(|pc| ports.program.fetch(pc)))
        else {
            return Dispatch::Idle;
        };
        if inst.opcode == Opcode::Nop {
            return Dispatch::Nop;
        }

        match self.dispatch(inst, ports) {
            Ok(tag) => {
                ports.stats.instructions_dispatched += 1;
                ports.tracker.update(Stage::Issue, inst.pc);
                debug!(cycle = ports.cycle, pc = inst.pc, %tag, %inst, "issue");
                Dispatch::Issued(tag)
            }
            Err(hazard) => {
                ports.stats.record_stall(hazard);
                trace!(cycle = ports.cycle, pc = inst.pc, %hazard, "dispatch stall");
                self.held = Some(inst);
                Dispatch::Stalled(hazard)
            }
        }
    }

    fn dispatch(&mut self, inst: Instruction, ports: &mut DispatchPorts<'_>) -> Result<RobTag, Hazard> {
        let route = inst.opcode.route();
        if inst.opcode.is_branch() && ports.btb.is_speculating() {
            return Err(Hazard::CheckpointOutstanding);
        }
        if ports.rob.is_full() {
            return Err(Hazard::RobFull);
        }
        match route {
            Route::Unit(kind) if !ports.units.can_issue(kind) => {
                return Err(Hazard::StationsFull(kind));
            }
            Route::Lsq if ports.lsq.is_full() => return Err(Hazard::LsqFull),
            _ => {}
        }

        let tag = ports.rob.enqueue(inst)?;
        let renamed = self.rename(inst, tag);
        match route {
            Route::Unit(kind) => ports.units.issue(kind, &renamed, ports.rob, ports.regs)?,
            Route::Lsq => ports.lsq.issue(&renamed, ports.rob, ports.regs)?,
            Route::None => {}
        }
        if inst.opcode.is_branch() {
            ports
                .btb
                .issue(&inst, tag, self.snapshot(), ports.rob.snapshot());
        }
        Ok(tag)
    }
}
