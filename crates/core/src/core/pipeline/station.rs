//! Reservation-station functional units.
//!
//! Each functional unit instance owns a set of reservation stations and a
//! single execution pipeline. It provides:
//! 1. **Issue:** Allocates a free station, resolving operands through the ROB.
//! 2. **Wakeup:** Snoops the bus and captures values for pending operands.
//! 3. **Execution:** Runs at most one station at a time, oldest eligible first.
//! 4. **Completion:** Pushes the result to the unit's bounded result buffer and frees the station.
//! 5. **Squash:** Drops stations and buffered results whose ROB entries were discarded.

use std::fmt;

use tracing::trace;

use crate::common::data::Word;
use crate::common::error::Hazard;
use crate::config::{Config, UnitConfig};
use crate::core::arch::RegisterFiles;
use crate::core::units::alu::Alu;
use crate::core::units::fpu::Fpu;
use crate::isa::instruction::{Instruction, Opcode, UnitKind};
use crate::stats::SimStats;

use super::cdb::{CdbPacket, ResultBuffer};
use super::rat::{Renamed, Source};
use super::rob::{Rob, RobTag};
use super::tracker::{Stage, Tracker};
use super::traits::{CdbSubscriber, ResultSource};

/// A source operand held by a station or LSQ entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// The value is known.
    Ready(Word),
    /// The value will arrive on the bus tagged with this ROB slot.
    Pending(RobTag),
}

impl Operand {
    /// The value, if resolved.
    #[inline]
    pub const fn value(self) -> Option<Word> {
        match self {
            Self::Ready(v) => Some(v),
            Self::Pending(_) => None,
        }
    }

    /// Returns true once the value is known.
    #[inline]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Adopts `packet`'s value if this operand waits on its tag.
    #[inline]
    pub fn capture(&mut self, packet: &CdbPacket) -> bool {
        if *self == Self::Pending(packet.tag) {
            *self = Self::Ready(packet.value);
            true
        } else {
            false
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(v) => write!(f, "{v:#x}"),
            Self::Pending(tag) => write!(f, "{tag}"),
        }
    }
}

/// A busy reservation station.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
    /// Destination tag.
    pub tag: RobTag,
    /// The instruction being executed.
    pub inst: Instruction,
    /// First operand.
    pub op1: Operand,
    /// Second operand (the immediate for `Addi`).
    pub op2: Operand,
    /// Cycles left in execution once started.
    pub remaining: u64,
    /// Issued this cycle; not yet eligible to execute.
    fresh: bool,
    /// Issue order within the unit.
    seq: u64,
}

impl Station {
    /// Returns true once both operands are resolved.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        self.op1.is_ready() && self.op2.is_ready()
    }
}

/// One functional unit instance: stations plus a single execution pipeline.
#[derive(Clone, Debug)]
pub struct FunctionalUnit {
    kind: UnitKind,
    instance: usize,
    latency: u64,
    stations: Vec<Option<Station>>,
    active: Option<usize>,
    buffer: ResultBuffer,
    next_seq: u64,
}

impl FunctionalUnit {
    /// Creates an idle unit.
    ///
    /// # Arguments
    ///
    /// * `kind` - Unit kind.
    /// * `instance` - Index among units of the same kind.
    /// * `shape` - Station count and latency.
    /// * `buffer_entries` - Result buffer depth.
    pub fn new(kind: UnitKind, instance: usize, shape: &UnitConfig, buffer_entries: usize) -> Self {
        Self {
            kind,
            instance,
            latency: shape.latency.max(1),
            stations: vec![None; shape.stations],
            active: None,
            buffer: ResultBuffer::new(buffer_entries),
            next_seq: 0,
        }
    }

    /// Returns true if a station is free.
    pub fn has_free_station(&self) -> bool {
        self.stations.iter().any(Option::is_none)
    }

    /// Number of busy stations.
    pub fn busy(&self) -> usize {
        self.stations.iter().flatten().count()
    }

    /// Returns true when no station is busy and no result is buffered.
    pub fn is_idle(&self) -> bool {
        self.busy() == 0 && self.buffer.is_empty()
    }

    /// Busy stations.
    pub fn stations(&self) -> impl Iterator<Item = &Station> + '_ {
        self.stations.iter().flatten()
    }

    /// Allocates a station for a renamed instruction.
    ///
    /// Operands are resolved through the ROB right away; unresolved ones wait
    /// on their producer's tag.
    ///
    /// # Errors
    ///
    /// `Hazard::StationsFull` when every station is busy.
    pub fn issue(&mut self, renamed: &Renamed, rob: &Rob, regs: &RegisterFiles) -> Result<(), Hazard> {
        let slot = self
            .stations
            .iter()
            .position(Option::is_none)
            .ok_or(Hazard::StationsFull(self.kind))?;

        let resolve = |source: Option<Source>| source.map_or(Operand::Ready(0), |s| rob.request(s, regs));
        let op1 = resolve(renamed.src1);
        let op2 = if renamed.inst.opcode == Opcode::Addi {
            Operand::Ready(renamed.inst.imm as Word)
        } else {
            resolve(renamed.src2)
        };

        self.stations[slot] = Some(Station {
            tag: renamed.tag,
            inst: renamed.inst,
            op1,
            op2,
            remaining: 0,
            fresh: true,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        trace!(
            unit = %self.kind,
            instance = self.instance,
            slot,
            tag = %renamed.tag,
            %op1,
            %op2,
            "station issue"
        );
        Ok(())
    }

    /// Execute stage for one cycle.
    ///
    /// Continues the running station, or starts the oldest station whose
    /// operands are resolved and which was not issued this cycle. A latency
    /// of `n` completes on the `n`-th cycle of execution. Completion stalls
    /// while the result buffer is full.
    pub fn tick(&mut self, tracker: &mut dyn Tracker, stats: &mut SimStats) {
        self.buffer.promote();

        if self.active.is_none() {
            let oldest = self
                .stations
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
                .filter(|(_, s)| !s.fresh && s.is_ready())
                .min_by_key(|(_, s)| s.seq)
                .map(|(i, _)| i);
            if let Some(i) = oldest {
                if let Some(station) = self.stations[i].as_mut() {
                    station.remaining = self.latency;
                    tracker.update(Stage::Execute, station.inst.pc);
                    trace!(unit = %self.kind, tag = %station.tag, "execute begin");
                }
                self.active = Some(i);
            }
        }

        if let Some(i) = self.active {
            if let Some(station) = self.stations[i].as_mut() {
                station.remaining = station.remaining.saturating_sub(1);
                if station.remaining == 0 {
                    if let (Some(a), Some(b)) = (station.op1.value(), station.op2.value()) {
                        let packet = CdbPacket {
                            tag: station.tag,
                            value: evaluate(station.inst.opcode, a, b),
                            opcode: station.inst.opcode,
                            pc: station.inst.pc,
                        };
                        match self.buffer.push(packet) {
                            Ok(()) => {
                                trace!(unit = %self.kind, tag = %packet.tag, value = packet.value, "execute done");
                                self.stations[i] = None;
                                self.active = None;
                            }
                            Err(hazard) => stats.record_stall(hazard),
                        }
                    }
                }
            } else {
                self.active = None;
            }
        }

        for station in self.stations.iter_mut().flatten() {
            station.fresh = false;
        }
    }

    /// Drops every station and buffered result whose ROB entry is gone.
    pub fn squash(&mut self, rob: &Rob) {
        for slot in &mut self.stations {
            if slot.as_ref().is_some_and(|s| !rob.is_live(s.tag)) {
                *slot = None;
            }
        }
        if self.active.is_some_and(|i| self.stations[i].is_none()) {
            self.active = None;
        }
        self.buffer.retain(|tag| rob.is_live(tag));
    }
}

/// Computes a unit result.
pub fn evaluate(op: Opcode, a: Word, b: Word) -> Word {
    match op {
        Opcode::AddD | Opcode::SubD | Opcode::MultD => Fpu::execute(op, a, b),
        _ => Alu::execute(op, a, b),
    }
}

impl ResultSource for FunctionalUnit {
    fn has_result(&self) -> bool {
        self.buffer.has_ready()
    }

    fn deliver(&mut self) -> Option<CdbPacket> {
        self.buffer.pop()
    }
}

impl CdbSubscriber for FunctionalUnit {
    fn read_cdb(&mut self, packet: &CdbPacket) {
        for station in self.stations.iter_mut().flatten() {
            let _ = station.op1.capture(packet);
            let _ = station.op2.capture(packet);
        }
    }
}

/// Every functional unit instance, in a stable order.
#[derive(Clone, Debug)]
pub struct UnitPool {
    units: Vec<FunctionalUnit>,
}

impl UnitPool {
    /// Builds `count` instances of each configured unit kind.
    pub fn new(config: &Config) -> Self {
        let units = UnitKind::ALL
            .into_iter()
            .flat_map(|kind| {
                let shape = *config.units.get(kind);
                (0..shape.count).map(move |i| {
                    FunctionalUnit::new(kind, i, &shape, config.cdb.buffer_entries)
                })
            })
            .collect();
        Self { units }
    }

    /// Returns true if some instance of `kind` has a free station.
    pub fn can_issue(&self, kind: UnitKind) -> bool {
        self.units
            .iter()
            .any(|u| u.kind == kind && u.has_free_station())
    }

    /// Issues to the first instance of `kind` with a free station.
    ///
    /// # Errors
    ///
    /// `Hazard::StationsFull` when every instance is full.
    pub fn issue(
        &mut self,
        kind: UnitKind,
        renamed: &Renamed,
        rob: &Rob,
        regs: &RegisterFiles,
    ) -> Result<(), Hazard> {
        self.units
            .iter_mut()
            .find(|u| u.kind == kind && u.has_free_station())
            .ok_or(Hazard::StationsFull(kind))?
            .issue(renamed, rob, regs)
    }

    /// Runs the execute stage of every instance.
    pub fn tick(&mut self, tracker: &mut dyn Tracker, stats: &mut SimStats) {
        for unit in &mut self.units {
            unit.tick(tracker, stats);
        }
    }

    /// Squashes every instance.
    pub fn squash(&mut self, rob: &Rob) {
        for unit in &mut self.units {
            unit.squash(rob);
        }
    }

    /// Returns true when every instance is idle.
    pub fn is_idle(&self) -> bool {
        self.units.iter().all(FunctionalUnit::is_idle)
    }

    /// Instances in pool order.
    pub fn iter(&self) -> std::slice::Iter<'_, FunctionalUnit> {
        self.units.iter()
    }

    /// Mutable instances in pool order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, FunctionalUnit> {
        self.units.iter_mut()
    }
}
