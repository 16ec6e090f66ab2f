//! Main Execution Loop.
//!
//! This module implements the cycle of the CPU. Each tick runs the phases in a
//! fixed order, each phase touching only the state it owns:
//! 1. **Rename/Dispatch:** The RAT fetches, renames and issues at most one instruction.
//! 2. **Execute:** Functional units and the LSQ advance their countdowns.
//! 3. **Writeback:** The CDB grants one result and broadcasts it to every subscriber.
//! 4. **Resolve:** The BTB checks the outstanding branch and rolls back on a misprediction.
//! 5. **Commit:** The ROB retires at most one instruction from its head.

use tracing::{debug, trace};

use super::Cpu;
use crate::common::error::SimResult;
use crate::core::pipeline::cdb::broadcast;
use crate::core::pipeline::lsq::LsqEvent;
use crate::core::pipeline::rat::DispatchPorts;
use crate::core::pipeline::rob::CommitPorts;
use crate::core::pipeline::tracker::{Stage, Tracker};
use crate::core::pipeline::traits::{CdbSubscriber, ResultSource};
use crate::core::units::bru::RecoveryPorts;

impl<T: Tracker> Cpu<T> {
    /// Simulates one clock cycle.
    ///
    /// # Errors
    ///
    /// `SimError::Fault` when a faulting memory operation reaches the head
    /// of the ROB, or an authorized store is rejected by memory.
    pub fn tick(&mut self) -> SimResult<()> {
        self.cycle += 1;
        let cycle = self.cycle;
        self.tracker.begin_cycle(cycle);
        self.rob.begin_cycle(cycle);
        trace!(cycle, "tick");

        self.rename_stage();
        self.execute_stage()?;
        self.writeback_stage();
        self.resolve_stage();
        self.commit_stage()?;

        self.stats.cycles += 1;
        Ok(())
    }

    fn rename_stage(&mut self) {
        let mut ports = DispatchPorts {
            program: &self.program,
            btb: &mut self.btb,
            rob: &mut self.rob,
            units: &mut self.units,
            lsq: &mut self.lsq,
            regs: &self.regs,
            tracker: &mut self.tracker,
            stats: &mut self.stats,
            cycle: self.cycle,
        };
        let outcome = self.rat.tick(&mut ports);
        trace!(cycle = self.cycle, ?outcome, "rename");
    }

    fn execute_stage(&mut self) -> SimResult<()> {
        self.units.tick(&mut self.tracker, &mut self.stats);
        self.lsq
            .tick(&mut self.memory, &mut self.tracker, &mut self.stats)?;

        for event in self.lsq.drain_events() {
            match event {
                LsqEvent::StoreReady(tag) => self.rob.mark_store_ready(tag),
                LsqEvent::StoreWritten(tag) => self.rob.mark_store_written(tag),
                LsqEvent::Fault(tag, fault) => self.rob.fault(tag, fault),
            }
        }
        Ok(())
    }

    fn writeback_stage(&mut self) {
        let grant = {
            let mut sources: Vec<&mut dyn ResultSource> = self
                .units
                .iter_mut()
                .map(|unit| unit as &mut dyn ResultSource)
                .collect();
            sources.push(&mut self.lsq);
            self.cdb.tick(&mut sources)
        };
        let Some(grant) = grant else {
            return;
        };

        self.stats.cdb_broadcasts += 1;
        if grant.waiting > 0 {
            self.stats.cdb_contention += 1;
        }
        let packet = grant.packet;
        self.tracker.update(Stage::WriteBack, packet.pc);
        debug!(
            cycle = self.cycle,
            pc = packet.pc,
            tag = %packet.tag,
            value = packet.value,
            waiting = grant.waiting,
            "broadcast"
        );

        let mut subscribers: Vec<&mut dyn CdbSubscriber> = self
            .units
            .iter_mut()
            .map(|unit| unit as &mut dyn CdbSubscriber)
            .collect();
        subscribers.push(&mut self.lsq);
        subscribers.push(&mut self.rob);
        subscribers.push(&mut self.btb);
        broadcast(&packet, &mut subscribers);
    }

    fn resolve_stage(&mut self) {
        let mut ports = RecoveryPorts {
            rat: &mut self.rat,
            rob: &mut self.rob,
            units: &mut self.units,
            lsq: &mut self.lsq,
            tracker: &mut self.tracker,
            stats: &mut self.stats,
            cycle: self.cycle,
        };
        if let Some(resolution) = self.btb.tick(&mut ports) {
            trace!(cycle = self.cycle, ?resolution, "resolve");
        }
    }

    fn commit_stage(&mut self) -> SimResult<()> {
        let mut ports = CommitPorts {
            regs: &mut self.regs,
            rat: &mut self.rat,
            lsq: &mut self.lsq,
            tracker: &mut self.tracker,
            stats: &mut self.stats,
        };
        let _ = self.rob.commit(&mut ports)?;
        Ok(())
    }
}
