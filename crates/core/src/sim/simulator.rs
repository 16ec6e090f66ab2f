//! Simulator: owns the CPU and drives it to completion.
//!
//! The simulator attaches a `TimingTable` to the CPU, runs it until the
//! program drains or the cycle budget is spent, and renders the final report.

use std::fmt;

use tracing::{debug, info};

use crate::common::data::to_int;
use crate::common::error::{SimError, SimResult};
use crate::config::Config;
use crate::core::Cpu;
use crate::core::arch::RegisterFiles;
use crate::isa::program::Program;
use crate::soc::memory::Memory;

use super::loader::MachineImage;
use super::timing::TimingTable;

/// Top-level simulator: CPU plus its timing table.
#[derive(Debug)]
pub struct Simulator {
    /// The CPU, tracking stage timing.
    pub cpu: Cpu<TimingTable>,
}

impl Simulator {
    /// Creates a simulator from prepared machine state.
    ///
    /// # Errors
    ///
    /// `SimError::Config` if the configuration is invalid.
    pub fn new(
        config: &Config,
        program: Program,
        regs: RegisterFiles,
        memory: Memory,
    ) -> SimResult<Self> {
        config.validate()?;
        let timing = TimingTable::new(program.clone());
        Ok(Self {
            cpu: Cpu::with_tracker(config, program, regs, memory, timing),
        })
    }

    /// Creates a simulator from a machine image.
    ///
    /// # Errors
    ///
    /// Any error from [`MachineImage::build`].
    pub fn from_image(image: &MachineImage) -> SimResult<Self> {
        let (program, regs, memory) = image.build()?;
        Self::new(&image.config, program, regs, memory)
    }

    /// Advances the simulator by one clock cycle.
    ///
    /// # Errors
    ///
    /// `SimError::Fault` when a memory fault reaches commit.
    pub fn tick(&mut self) -> SimResult<()> {
        self.cpu.tick()
    }

    /// Returns true once the program has drained.
    pub fn is_finished(&self) -> bool {
        self.cpu.is_finished()
    }

    /// Runs until the program drains.
    ///
    /// # Returns
    ///
    /// The number of cycles simulated.
    ///
    /// # Errors
    ///
    /// `SimError::CycleLimit` if `general.max_cycles` is reached first, or
    /// the first fault raised by the CPU.
    pub fn run(&mut self) -> SimResult<u64> {
        let limit = self.cpu.config.general.max_cycles;
        info!(
            instructions = self.cpu.program.len(),
            max_cycles = limit,
            "simulation start"
        );
        while !self.cpu.is_finished() {
            if self.cpu.cycle() >= limit {
                return Err(SimError::CycleLimit(limit));
            }
            self.cpu.tick()?;
        }
        debug!(cycles = self.cpu.cycle(), "program drained");
        Ok(self.cpu.cycle())
    }

    /// Writes the timing table, non-zero registers, non-zero memory words
    /// and the selected statistics sections.
    ///
    /// # Arguments
    ///
    /// * `out` - Destination.
    /// * `sections` - Statistics sections; empty selects all.
    pub fn write_report(&self, out: &mut impl fmt::Write, sections: &[String]) -> fmt::Result {
        writeln!(out, "{}", self.cpu.tracker)?;

        writeln!(out, "Registers")?;
        for (idx, value) in self.cpu.regs.gpr.nonzero() {
            writeln!(out, "  R{idx:<3} = {}", to_int(value))?;
        }
        for (idx, value) in self.cpu.regs.fpr.nonzero() {
            writeln!(out, "  F{idx:<3} = {value}")?;
        }

        writeln!(out, "Memory")?;
        for (address, word) in self.cpu.memory.nonzero_words() {
            writeln!(out, "  [{address:#06x}] = {} ({word:#x})", to_int(word))?;
        }
        writeln!(out)?;

        self.cpu.stats.write_sections(out, sections)
    }

    /// Renders the report to a string.
    pub fn render_report(&self, sections: &[String]) -> String {
        let mut out = String::new();
        let _ = self.write_report(&mut out, sections);
        out
    }
}
