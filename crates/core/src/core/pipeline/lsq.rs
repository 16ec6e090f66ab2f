//! Load/Store Queue (LSQ).
//!
//! The LSQ holds every in-flight memory operation in program order. It has a
//! single address adder and a single memory port, and runs four sub-stages
//! per cycle:
//! 1. **Address Generation:** The oldest entry with a resolved base computes `base + imm`
//!    and validates it against memory; an invalid address is reported as a fault.
//! 2. **Memory Access:** The head entry reads or writes memory. Stores must first be
//!    authorized by the ROB through `mem_commit`.
//! 3. **Forwarded Completion:** A load that found its value in an older store completes
//!    without touching memory.
//! 4. **Forwarding:** Loads with known addresses scan older stores, youngest first, for
//!    a matching address (memory disambiguation).
//!
//! Results leave through a bounded result buffer like any functional unit.

use std::collections::VecDeque;
use std::mem;

use tracing::trace;

use crate::common::data::{AccessType, Word};
use crate::common::error::{Hazard, MemoryFault, SimError, SimResult};
use crate::config::Config;
use crate::core::arch::RegisterFiles;
use crate::isa::instruction::Opcode;
use crate::soc::memory::Memory;
use crate::stats::SimStats;

use super::cdb::{CdbPacket, ResultBuffer};
use super::rat::{Renamed, Source};
use super::rob::{Rob, RobTag};
use super::station::Operand;
use super::tracker::{Stage, Tracker};
use super::traits::{CdbSubscriber, ResultSource};

/// Notifications for the ROB, drained once per cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LsqEvent {
    /// A store's address and data are both known.
    StoreReady(RobTag),
    /// An authorized store has written memory.
    StoreWritten(RobTag),
    /// Address generation produced an invalid address.
    Fault(RobTag, MemoryFault),
}

/// A queued memory operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LsqEntry {
    /// ROB slot of the operation.
    pub tag: RobTag,
    /// Instruction address.
    pub pc: u64,
    /// Load or store.
    pub kind: AccessType,
    /// Base register operand.
    pub base: Operand,
    /// Displacement added to the base.
    pub imm: i64,
    /// Effective address once generated.
    pub address: Option<u64>,
    /// Store data; unused for loads.
    pub data: Operand,
    /// Store authorized by the ROB to write memory.
    pub committed: bool,
    /// Address generation faulted.
    pub faulted: bool,
    /// Value forwarded from an older store, awaiting completion.
    pub forwarded: Option<Word>,
    fresh: bool,
    ready_reported: bool,
}

impl LsqEntry {
    const fn is_load(&self) -> bool {
        matches!(self.kind, AccessType::Load)
    }

    const fn is_store(&self) -> bool {
        matches!(self.kind, AccessType::Store)
    }
}

/// Where a load can get its value from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ForwardSource {
    /// An older store with unknown address or data may alias.
    Blocked,
    /// The nearest matching older store holds this value.
    Store(Word),
    /// No older store aliases; the load must read memory.
    Memory,
}

/// The load/store queue.
#[derive(Clone, Debug)]
pub struct LoadStoreQueue {
    capacity: usize,
    entries: VecDeque<LsqEntry>,
    address_latency: u64,
    memory_latency: u64,
    /// Entry occupying the address adder, with cycles left.
    agu: Option<(RobTag, u64)>,
    /// Entry occupying the memory port, with cycles left.
    port: Option<(RobTag, u64)>,
    buffer: ResultBuffer,
    events: Vec<LsqEvent>,
}

impl LoadStoreQueue {
    /// Creates an empty queue sized by `config.lsq`.
    pub fn new(config: &Config) -> Self {
        Self {
            capacity: config.lsq.entries,
            entries: VecDeque::with_capacity(config.lsq.entries),
            address_latency: config.lsq.address_latency.max(1),
            memory_latency: config.lsq.memory_latency.max(1),
            agu: None,
            port: None,
            buffer: ResultBuffer::new(config.cdb.buffer_entries),
            events: Vec::new(),
        }
    }

    /// Number of queued operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is queued or buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.buffer.is_empty()
    }

    /// Returns true if no entry can be allocated.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Queued operations, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LsqEntry> + '_ {
        self.entries.iter()
    }

    /// Appends a renamed `Ld` or `Sd`.
    ///
    /// The base is `src1`; store data is `src2`. Both are resolved through
    /// the ROB the same way reservation stations resolve their operands.
    ///
    /// # Errors
    ///
    /// `Hazard::LsqFull` when every entry is occupied.
    pub fn issue(&mut self, renamed: &Renamed, rob: &Rob, regs: &RegisterFiles) -> Result<(), Hazard> {
        if self.is_full() {
            return Err(Hazard::LsqFull);
        }
        let resolve = |source: Option<Source>| source.map_or(Operand::Ready(0), |s| rob.request(s, regs));
        let kind = if renamed.inst.opcode == Opcode::Sd {
            AccessType::Store
        } else {
            AccessType::Load
        };
        let data = match kind {
            AccessType::Store => resolve(renamed.src2),
            AccessType::Load => Operand::Ready(0),
        };
        let entry = LsqEntry {
            tag: renamed.tag,
            pc: renamed.inst.pc,
            kind,
            base: resolve(renamed.src1),
            imm: renamed.inst.imm,
            address: None,
            data,
            committed: false,
            faulted: false,
            forwarded: None,
            fresh: true,
            ready_reported: false,
        };
        trace!(tag = %entry.tag, ?kind, base = %entry.base, data = %entry.data, "lsq issue");
        self.entries.push_back(entry);
        Ok(())
    }

    /// Authorizes the store `tag` to write memory. Called by the ROB when
    /// the finished store reaches the commit point.
    pub fn mem_commit(&mut self, tag: RobTag) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.tag == tag && e.is_store()) {
            entry.committed = true;
        }
    }

    /// Takes the notifications produced since the last call.
    pub fn drain_events(&mut self) -> Vec<LsqEvent> {
        mem::take(&mut self.events)
    }

    /// Runs the address, memory and forwarding sub-stages for one cycle.
    ///
    /// # Errors
    ///
    /// `SimError::Fault` if an authorized store's write is rejected by memory.
    pub fn tick(
        &mut self,
        memory: &mut Memory,
        tracker: &mut dyn Tracker,
        stats: &mut SimStats,
    ) -> SimResult<()> {
        self.buffer.promote();

        self.generate_address(memory, tracker);
        let head_load_done = self.access_memory(memory, tracker, stats)?;
        if !head_load_done {
            self.complete_forwarded(stats);
        }
        self.forward(tracker);

        for entry in &mut self.entries {
            if entry.is_store() && !entry.ready_reported && entry.address.is_some() && entry.data.is_ready()
            {
                entry.ready_reported = true;
                self.events.push(LsqEvent::StoreReady(entry.tag));
            }
            entry.fresh = false;
        }
        Ok(())
    }

    fn position(&self, tag: RobTag) -> Option<usize> {
        self.entries.iter().position(|e| e.tag == tag)
    }

    fn generate_address(&mut self, memory: &Memory, tracker: &mut dyn Tracker) {
        if self.agu.is_none() {
            let next = self
                .entries
                .iter()
                .find(|e| !e.fresh && !e.faulted && e.address.is_none() && e.base.is_ready());
            if let Some(entry) = next {
                tracker.update(Stage::Execute, entry.pc);
                self.agu = Some((entry.tag, self.address_latency));
            }
        }

        let Some((tag, remaining)) = self.agu else {
            return;
        };
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.agu = Some((tag, remaining));
            return;
        }
        self.agu = None;

        let Some(entry) = self.position(tag).and_then(|i| self.entries.get_mut(i)) else {
            return;
        };
        let Some(base) = entry.base.value() else {
            return;
        };
        let address = base.wrapping_add_signed(entry.imm);
        match memory.check(address) {
            Ok(_) => {
                trace!(tag = %tag, address, "address generated");
                entry.address = Some(address);
            }
            Err(fault) => {
                trace!(tag = %tag, address, %fault, "address fault");
                entry.faulted = true;
                self.events.push(LsqEvent::Fault(tag, fault));
            }
        }
    }

    /// Returns true if a load completed at the head this cycle.
    fn access_memory(
        &mut self,
        memory: &mut Memory,
        tracker: &mut dyn Tracker,
        stats: &mut SimStats,
    ) -> SimResult<bool> {
        if self.port.is_none() {
            let eligible = self.entries.front().filter(|head| {
                !head.faulted
                    && head.forwarded.is_none()
                    && head.address.is_some()
                    && (head.is_load() || (head.committed && head.data.is_ready()))
            });
            if let Some(head) = eligible {
                tracker.update(Stage::Memory, head.pc);
                self.port = Some((head.tag, self.memory_latency));
            }
        }

        let Some((tag, remaining)) = self.port else {
            return Ok(false);
        };
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.port = Some((tag, remaining));
            return Ok(false);
        }

        let Some(head) = self.entries.front().filter(|h| h.tag == tag) else {
            self.port = None;
            return Ok(false);
        };
        let Some(address) = head.address else {
            self.port = None;
            return Ok(false);
        };
        let fault = |fault| SimError::Fault { pc: head.pc, fault };

        match head.kind {
            AccessType::Load => {
                let value = memory.read(address).map_err(fault)?;
                let packet = CdbPacket {
                    tag,
                    value,
                    opcode: Opcode::Ld,
                    pc: head.pc,
                };
                if let Err(hazard) = self.buffer.push(packet) {
                    // Hold the port until the buffer drains.
                    stats.record_stall(hazard);
                    self.port = Some((tag, 0));
                    return Ok(false);
                }
                trace!(tag = %tag, address, value, "load done");
                stats.memory_reads += 1;
                self.port = None;
                let _ = self.entries.pop_front();
                Ok(true)
            }
            AccessType::Store => {
                let value = head.data.value().unwrap_or_default();
                memory.write(address, value).map_err(fault)?;
                trace!(tag = %tag, address, value, "store written");
                stats.memory_writes += 1;
                self.events.push(LsqEvent::StoreWritten(tag));
                self.port = None;
                let _ = self.entries.pop_front();
                Ok(false)
            }
        }
    }

    fn complete_forwarded(&mut self, stats: &mut SimStats) {
        if self.buffer.is_full() {
            return;
        }
        let Some(index) = self.entries.iter().position(|e| e.forwarded.is_some()) else {
            return;
        };
        let Some(entry) = self.entries.remove(index) else {
            return;
        };
        if let Some(value) = entry.forwarded {
            let packet = CdbPacket {
                tag: entry.tag,
                value,
                opcode: Opcode::Ld,
                pc: entry.pc,
            };
            if self.buffer.push(packet).is_ok() {
                trace!(tag = %entry.tag, value, "forwarded load done");
                stats.forwarded_loads += 1;
            }
        }
    }

    fn forward_source(&self, index: usize) -> ForwardSource {
        let Some(address) = self.entries.get(index).and_then(|e| e.address) else {
            return ForwardSource::Blocked;
        };
        for older in self.entries.range(..index).rev().filter(|e| e.is_store()) {
            match older.address {
                None => return ForwardSource::Blocked,
                Some(a) if a == address => {
                    return older
                        .data
                        .value()
                        .map_or(ForwardSource::Blocked, ForwardSource::Store);
                }
                Some(_) => {}
            }
        }
        ForwardSource::Memory
    }

    fn forward(&mut self, tracker: &mut dyn Tracker) {
        let busy = self.port.map(|(tag, _)| tag);
        let candidates: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, e)| {
                e.is_load()
                    && !e.faulted
                    && e.forwarded.is_none()
                    && e.address.is_some()
                    && Some(e.tag) != busy
            })
            .map(|(i, _)| i)
            .collect();

        for index in candidates {
            if let ForwardSource::Store(value) = self.forward_source(index) {
                if let Some(entry) = self.entries.get_mut(index) {
                    tracker.update(Stage::Memory, entry.pc);
                    trace!(tag = %entry.tag, value, "store forwarded");
                    entry.forwarded = Some(value);
                }
            }
        }
    }

    /// Drops every entry, buffered result and event whose ROB entry is gone.
    pub fn squash(&mut self, rob: &Rob) {
        self.entries.retain(|e| rob.is_live(e.tag));
        if self.agu.is_some_and(|(tag, _)| !rob.is_live(tag)) {
            self.agu = None;
        }
        if self.port.is_some_and(|(tag, _)| !rob.is_live(tag)) {
            self.port = None;
        }
        self.buffer.retain(|tag| rob.is_live(tag));
        self.events.retain(|event| match *event {
            LsqEvent::StoreReady(tag) | LsqEvent::StoreWritten(tag) | LsqEvent::Fault(tag, _) => {
                rob.is_live(tag)
            }
        });
    }
}

impl ResultSource for LoadStoreQueue {
    fn has_result(&self) -> bool {
        self.buffer.has_ready()
    }

    fn deliver(&mut self) -> Option<CdbPacket> {
        self.buffer.pop()
    }
}

impl CdbSubscriber for LoadStoreQueue {
    fn read_cdb(&mut self, packet: &CdbPacket) {
        for entry in &mut self.entries {
            let _ = entry.base.capture(packet);
            let _ = entry.data.capture(packet);
        }
    }
}
