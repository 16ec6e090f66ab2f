//! Timing table.
//!
//! A `Tracker` that records, for every dynamic instruction, the cycle in which
//! it entered each pipeline stage. Rows of squashed instructions are removed.
//!
//! Legal stage order depends on the opcode:
//! - stores: issue, execute, commit, memory
//! - loads: issue, execute, memory, write-back, commit
//! - everything else: issue, execute, write-back, commit

use std::fmt;

use crate::core::pipeline::tracker::{Stage, Tracker};
use crate::isa::instruction::{Instruction, Opcode};
use crate::isa::program::Program;

/// Stage cycles of one dynamic instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimingRow {
    /// The instruction.
    pub inst: Instruction,
    /// Cycle per stage, indexed like `Stage::ALL`.
    pub cycles: [Option<u64>; 5],
}

impl TimingRow {
    /// Cycle in which the instruction entered `stage`.
    pub fn cycle(&self, stage: Stage) -> Option<u64> {
        self.cycles[stage_index(stage)]
    }

    /// Stages this instruction passes through, in order.
    pub const fn stage_order(&self) -> &'static [Stage] {
        stage_order(self.inst.opcode)
    }

    /// Returns true if the recorded cycles never decrease along the legal
    /// stage order and no stage is recorded after a missing one.
    pub fn is_ordered(&self) -> bool {
        let mut last = 0;
        let mut gap = false;
        for &stage in self.stage_order() {
            match self.cycle(stage) {
                Some(_) if gap => return false,
                Some(c) if c < last => return false,
                Some(c) => last = c,
                None => gap = true,
            }
        }
        let legal = self.stage_order();
        Stage::ALL
            .into_iter()
            .filter(|s| !legal.contains(s))
            .all(|s| self.cycle(s).is_none())
    }

    fn next_stage(&self) -> Option<Stage> {
        self.stage_order()
            .iter()
            .copied()
            .find(|&s| self.cycle(s).is_none())
    }
}

const fn stage_index(stage: Stage) -> usize {
    match stage {
        Stage::Issue => 0,
        Stage::Execute => 1,
        Stage::Memory => 2,
        Stage::WriteBack => 3,
        Stage::Commit => 4,
    }
}

/// Legal stage sequence of an opcode.
pub const fn stage_order(opcode: Opcode) -> &'static [Stage] {
    match opcode {
        Opcode::Sd => &[Stage::Issue, Stage::Execute, Stage::Commit, Stage::Memory],
        Opcode::Ld => &[
            Stage::Issue,
            Stage::Execute,
            Stage::Memory,
            Stage::WriteBack,
            Stage::Commit,
        ],
        Opcode::Nop => &[],
        _ => &[Stage::Issue, Stage::Execute, Stage::WriteBack, Stage::Commit],
    }
}

/// Per-instruction stage timing, in dispatch order.
#[derive(Clone, Debug, Default)]
pub struct TimingTable {
    program: Program,
    rows: Vec<TimingRow>,
    cycle: u64,
    squashed: u64,
}

impl TimingTable {
    /// Creates an empty table for `program`.
    pub fn new(program: Program) -> Self {
        Self {
            program,
            ..Self::default()
        }
    }

    /// Recorded rows, oldest first.
    pub fn rows(&self) -> &[TimingRow] {
        &self.rows
    }

    /// Rows removed by squashes.
    pub const fn squashed(&self) -> u64 {
        self.squashed
    }

    /// Returns true if every row respects its legal stage order.
    pub fn is_consistent(&self) -> bool {
        self.rows.iter().all(TimingRow::is_ordered)
    }
}

impl Tracker for TimingTable {
    fn begin_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    /// Issue opens a row; later stages fill the oldest row of the same
    /// address for which `stage` is the next legal stage.
    fn update(&mut self, stage: Stage, pc: u64) {
        if stage == Stage::Issue {
            let mut row = TimingRow {
                inst: self.program.fetch(pc),
                ..TimingRow::default()
            };
            row.cycles[stage_index(stage)] = Some(self.cycle);
            self.rows.push(row);
            return;
        }
        let cycle = self.cycle;
        if let Some(row) = self
            .rows
            .iter_mut()
            .find(|r| r.inst.pc == pc && r.next_stage() == Some(stage))
        {
            row.cycles[stage_index(stage)] = Some(cycle);
        }
    }

    fn squash(&mut self, pc: u64) {
        if let Some(index) = self
            .rows
            .iter()
            .rposition(|r| r.inst.pc == pc && r.cycle(Stage::Commit).is_none())
        {
            let _ = self.rows.remove(index);
            self.squashed += 1;
        }
    }
}

impl fmt::Display for TimingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<24}", "instruction")?;
        for stage in Stage::ALL {
            write!(f, "{:>9}", stage.name())?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "{:<24}", row.inst.to_string())?;
            for stage in Stage::ALL {
                match row.cycle(stage) {
                    Some(c) => write!(f, "{c:>9}")?,
                    None => write!(f, "{:>9}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
