//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the Tomasulo simulator. It provides:
//! 1. **Cycle and IPC:** Total cycles, retired instructions, and derived metrics (CPI).
//! 2. **Instruction mix:** Counts by category (integer, load, store, branch, FP add, FP multiply).
//! 3. **Branch prediction:** Lookups, mispredictions, accuracy and squashed work.
//! 4. **Stalls:** Dispatch stall cycles broken down by structural hazard.
//! 5. **Bus and memory:** CDB broadcasts, arbitration contention and forwarded loads.

use std::fmt;
use std::time::Instant;

use crate::common::error::Hazard;
use crate::isa::instruction::Opcode;

/// Simulation statistics structure tracking all performance metrics.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed (retired).
    pub instructions_retired: u64,
    /// Number of instructions accepted by dispatch, including squashed ones.
    pub instructions_dispatched: u64,

    /// Count of integer ALU instructions retired (`Add`, `Sub`, `Addi`).
    pub inst_int: u64,
    /// Count of load instructions retired.
    pub inst_load: u64,
    /// Count of store instructions retired.
    pub inst_store: u64,
    /// Count of conditional branches retired.
    pub inst_branch: u64,
    /// Count of FP add/subtract instructions retired.
    pub inst_fp_add: u64,
    /// Count of FP multiply instructions retired.
    pub inst_fp_mul: u64,

    /// Number of branch predictions that were correct.
    pub branch_predictions: u64,
    /// Number of branch predictions that were wrong (mispredictions).
    pub branch_mispredictions: u64,
    /// Instructions discarded by misprediction recovery.
    pub squashed: u64,

    /// Dispatch stalls because the reorder buffer was full.
    pub stalls_rob: u64,
    /// Dispatch stalls because a unit had no free reservation station.
    pub stalls_stations: u64,
    /// Dispatch stalls because the load/store queue was full.
    pub stalls_lsq: u64,
    /// Dispatch stalls waiting for an outstanding branch to resolve.
    pub stalls_branch: u64,
    /// Completions delayed because a result buffer was full.
    pub stalls_result_buffer: u64,

    /// Results broadcast on the common data bus.
    pub cdb_broadcasts: u64,
    /// Cycles in which at least one ready source waited for the bus.
    pub cdb_contention: u64,
    /// Loads satisfied from an in-flight store.
    pub forwarded_loads: u64,
    /// Data memory reads performed.
    pub memory_reads: u64,
    /// Data memory writes performed.
    pub memory_writes: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            instructions_dispatched: 0,
            inst_int: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            inst_fp_add: 0,
            inst_fp_mul: 0,
            branch_predictions: 0,
            branch_mispredictions: 0,
            squashed: 0,
            stalls_rob: 0,
            stalls_stations: 0,
            stalls_lsq: 0,
            stalls_branch: 0,
            stalls_result_buffer: 0,
            cdb_broadcasts: 0,
            cdb_contention: 0,
            forwarded_loads: 0,
            memory_reads: 0,
            memory_writes: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Pass an empty slice to `write_sections` to emit all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "core", "instruction_mix", "branch", "memory"];

const RULE: &str = "==========================================================";
const THIN_RULE: &str = "----------------------------------------------------------";

impl SimStats {
    /// Counts one retired instruction in the mix.
    pub const fn record_retire(&mut self, opcode: Opcode) {
        self.instructions_retired += 1;
        match opcode {
            Opcode::Add | Opcode::Sub | Opcode::Addi => self.inst_int += 1,
            Opcode::Ld => self.inst_load += 1,
            Opcode::Sd => self.inst_store += 1,
            Opcode::Beq | Opcode::Bne => self.inst_branch += 1,
            Opcode::AddD | Opcode::SubD => self.inst_fp_add += 1,
            Opcode::MultD => self.inst_fp_mul += 1,
            Opcode::Nop => {}
        }
    }

    /// Counts one dispatch stall cycle.
    pub const fn record_stall(&mut self, hazard: Hazard) {
        match hazard {
            Hazard::RobFull => self.stalls_rob += 1,
            Hazard::StationsFull(_) => self.stalls_stations += 1,
            Hazard::LsqFull => self.stalls_lsq += 1,
            Hazard::CheckpointOutstanding => self.stalls_branch += 1,
            Hazard::ResultBufferFull => self.stalls_result_buffer += 1,
        }
    }

    /// Writes the requested statistics sections.
    ///
    /// Each element of `sections` should be one of `STATS_SECTIONS`. Pass an
    /// empty slice to write all sections.
    ///
    /// # Arguments
    ///
    /// * `out` - Destination for the report.
    /// * `sections` - Slice of section names to write, or empty for all.
    pub fn write_sections(&self, out: &mut impl fmt::Write, sections: &[String]) -> fmt::Result {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = self.cycles.max(1) as f64;
        let instr = self.instructions_retired.max(1) as f64;
        let pct = |n: u64, d: f64| (n as f64 / d) * 100.0;

        if want("summary") {
            writeln!(out, "\n{RULE}")?;
            writeln!(out, "TOMASULO SIMULATION STATISTICS")?;
            writeln!(out, "{RULE}")?;
            writeln!(out, "host_seconds             {seconds:.4} s")?;
            writeln!(out, "sim_cycles               {}", self.cycles)?;
            writeln!(out, "sim_insts                {}", self.instructions_retired)?;
            writeln!(
                out,
                "sim_ipc                  {:.4}",
                self.instructions_retired as f64 / cyc
            )?;
            writeln!(out, "sim_cpi                  {:.4}", cyc / instr)?;
            writeln!(out, "{THIN_RULE}")?;
        }
        if want("core") {
            writeln!(out, "CORE BREAKDOWN")?;
            writeln!(out, "  dispatched             {}", self.instructions_dispatched)?;
            for (name, count) in [
                ("stalls.rob", self.stalls_rob),
                ("stalls.stations", self.stalls_stations),
                ("stalls.lsq", self.stalls_lsq),
                ("stalls.branch", self.stalls_branch),
                ("stalls.result_buffer", self.stalls_result_buffer),
            ] {
                writeln!(out, "  {name:<22} {count} ({:.2}%)", pct(count, cyc))?;
            }
            writeln!(out, "{THIN_RULE}")?;
        }
        if want("instruction_mix") {
            writeln!(out, "INSTRUCTION MIX")?;
            for (name, count) in [
                ("op.int", self.inst_int),
                ("op.load", self.inst_load),
                ("op.store", self.inst_store),
                ("op.branch", self.inst_branch),
                ("op.fp_add", self.inst_fp_add),
                ("op.fp_mul", self.inst_fp_mul),
            ] {
                writeln!(out, "  {name:<22} {count} ({:.2}%)", pct(count, instr))?;
            }
            writeln!(out, "{THIN_RULE}")?;
        }
        if want("branch") {
            let bp_correct = self.branch_predictions;
            let bp_miss = self.branch_mispredictions;
            let bp_total = bp_correct + bp_miss;
            let bp_acc = if bp_total > 0 {
                pct(bp_correct, bp_total as f64)
            } else {
                0.0
            };
            writeln!(out, "BRANCH PREDICTION")?;
            writeln!(out, "  bp.lookups             {bp_total}")?;
            writeln!(out, "  bp.mispredicts         {bp_miss}")?;
            writeln!(out, "  bp.accuracy            {bp_acc:.2}%")?;
            writeln!(out, "  bp.squashed            {}", self.squashed)?;
            writeln!(out, "{THIN_RULE}")?;
        }
        if want("memory") {
            writeln!(out, "BUS AND MEMORY")?;
            writeln!(out, "  cdb.broadcasts         {}", self.cdb_broadcasts)?;
            writeln!(
                out,
                "  cdb.contention         {} ({:.2}%)",
                self.cdb_contention,
                pct(self.cdb_contention, cyc)
            )?;
            writeln!(out, "  lsq.forwarded_loads    {}", self.forwarded_loads)?;
            writeln!(out, "  mem.reads              {}", self.memory_reads)?;
            writeln!(out, "  mem.writes             {}", self.memory_writes)?;
        }
        writeln!(out, "{RULE}")
    }

    /// Renders the requested sections into a string.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_sections(&mut out, sections);
        out
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        print!("{}", self.render_sections(&[]));
    }
}
