//! Reorder Buffer (ROB) for in-order commit.
//!
//! The ROB is a circular buffer that tracks in-flight instructions from
//! dispatch through commit. It provides:
//! 1. **Allocation:** Assigns a slot tag to every dispatched instruction; slot order is program order.
//! 2. **Completion:** Marks entries finished when their result crosses the bus.
//! 3. **Operand Oracle:** Resolves renamed sources to values or pending tags.
//! 4. **In-order Commit:** Retires only the head, writing the architectural register files.
//! 5. **Recovery:** Snapshots the tail at a branch and squashes everything younger on rewind.

use std::fmt;

use tracing::debug;

use crate::common::data::Word;
use crate::common::error::{Hazard, MemoryFault, SimError, SimResult};
use crate::common::reg::ArchReg;
use crate::core::arch::RegisterFiles;
use crate::isa::instruction::{Instruction, Opcode};
use crate::stats::SimStats;

use super::cdb::CdbPacket;
use super::lsq::LoadStoreQueue;
use super::rat::{Rat, Source};
use super::station::Operand;
use super::tracker::{Stage, Tracker};
use super::traits::CdbSubscriber;

/// Tag identifying an in-flight instruction: the index of its ROB slot.
///
/// A tag is unique while its entry is live. Slots are reused after commit or
/// squash, so a tag must only be compared against live producers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RobTag(pub usize);

impl fmt::Display for RobTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROB{}", self.0)
    }
}

/// Lifecycle state of an ROB entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RobState {
    /// Allocated; result not yet available.
    #[default]
    Issued,
    /// Result available (stores: address and data known), waiting to commit.
    Completed,
    /// Store at the head, authorized to write memory, waiting for the write.
    Committing,
    /// Store whose memory write has happened; retires on the next commit check.
    Written,
    /// A memory fault was detected; raised if the entry reaches the head.
    Faulted(MemoryFault),
}

/// A single entry in the Reorder Buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RobEntry {
    /// Tag of this entry.
    pub tag: RobTag,
    /// The owning instruction.
    pub inst: Instruction,
    /// Architectural destination, if the instruction writes one.
    pub dest: Option<ArchReg>,
    /// Produced value.
    pub value: Word,
    /// Current lifecycle state.
    pub state: RobState,
    /// Cycle in which the entry finished.
    pub finished_cycle: u64,
    /// Whether this slot is occupied.
    pub valid: bool,
}

/// Saved allocation point used to rewind after a misprediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RobSnapshot {
    tail: usize,
}

/// Components the commit stage writes to.
#[allow(missing_debug_implementations)]
pub struct CommitPorts<'a> {
    /// Architectural register files.
    pub regs: &'a mut RegisterFiles,
    /// Alias table to clear on commit.
    pub rat: &'a mut Rat,
    /// Load/store queue receiving store authorizations.
    pub lsq: &'a mut LoadStoreQueue,
    /// Diagnostic tracker.
    pub tracker: &'a mut dyn Tracker,
    /// Statistics sink.
    pub stats: &'a mut SimStats,
}

/// Reorder Buffer: circular buffer for in-order commit.
#[derive(Clone, Debug)]
pub struct Rob {
    /// Fixed-size entry array.
    entries: Vec<RobEntry>,
    /// Index of the oldest entry (commit point).
    head: usize,
    /// Index where the next entry will be allocated.
    tail: usize,
    /// Number of valid entries.
    count: usize,
    /// Current cycle, for commit eligibility.
    cycle: u64,
}

impl Rob {
    /// Creates a new ROB with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity.max(1), RobEntry::default);
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
            cycle: 0,
        }
    }

    /// Returns the ROB capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ROB is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the ROB is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Returns the number of free slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.entries.len() - self.count
    }

    /// Records the current cycle. Entries finished in this cycle commit no
    /// earlier than the next one.
    pub const fn begin_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    /// Allocates the next slot for `inst`.
    ///
    /// # Errors
    ///
    /// `Hazard::RobFull` when every slot is occupied.
    pub fn enqueue(&mut self, inst: Instruction) -> Result<RobTag, Hazard> {
        if self.is_full() {
            return Err(Hazard::RobFull);
        }

        let tag = RobTag(self.tail);
        self.entries[self.tail] = RobEntry {
            tag,
            inst,
            dest: inst.renamed_dest(),
            value: 0,
            state: RobState::Issued,
            finished_cycle: 0,
            valid: true,
        };
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        Ok(tag)
    }

    /// Returns true if `tag` names an occupied slot.
    #[inline]
    pub fn is_live(&self, tag: RobTag) -> bool {
        self.entries.get(tag.0).is_some_and(|e| e.valid)
    }

    /// Returns the live entry for `tag`.
    pub fn entry(&self, tag: RobTag) -> Option<&RobEntry> {
        self.entries.get(tag.0).filter(|e| e.valid)
    }

    fn entry_mut(&mut self, tag: RobTag) -> Option<&mut RobEntry> {
        self.entries.get_mut(tag.0).filter(|e| e.valid)
    }

    /// Returns the head entry (oldest), if the ROB is non-empty.
    pub fn peek_head(&self) -> Option<&RobEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[self.head])
        }
    }

    /// Resolves a renamed source operand.
    ///
    /// A live tag yields its value once finished, otherwise the tag itself.
    /// A source without a live tag reads the architectural register file.
    pub fn request(&self, source: Source, regs: &RegisterFiles) -> Operand {
        if let Some(entry) = source.tag.and_then(|tag| self.entry(tag)) {
            return match entry.state {
                RobState::Issued | RobState::Faulted(_) => Operand::Pending(entry.tag),
                RobState::Completed | RobState::Committing | RobState::Written => {
                    Operand::Ready(entry.value)
                }
            };
        }
        Operand::Ready(regs.read(source.reg))
    }

    /// Marks the entry named by a bus packet finished with its value.
    pub fn read_result(&mut self, packet: &CdbPacket) {
        let cycle = self.cycle;
        if let Some(entry) = self.entry_mut(packet.tag) {
            if entry.state == RobState::Issued {
                entry.state = RobState::Completed;
                entry.value = packet.value;
                entry.finished_cycle = cycle;
            }
        }
    }

    /// Marks a store finished: its address and data are known.
    pub fn mark_store_ready(&mut self, tag: RobTag) {
        let cycle = self.cycle;
        if let Some(entry) = self.entry_mut(tag) {
            if entry.state == RobState::Issued {
                entry.state = RobState::Completed;
                entry.finished_cycle = cycle;
            }
        }
    }

    /// Marks an authorized store as written to memory.
    pub fn mark_store_written(&mut self, tag: RobTag) {
        if let Some(entry) = self.entry_mut(tag) {
            if entry.state == RobState::Committing {
                entry.state = RobState::Written;
            }
        }
    }

    /// Records a memory fault against an entry.
    pub fn fault(&mut self, tag: RobTag, fault: MemoryFault) {
        if let Some(entry) = self.entry_mut(tag) {
            entry.state = RobState::Faulted(fault);
        }
    }

    /// Commit stage: retires the head entry if it is eligible.
    ///
    /// A finished store at the head is first authorized to write memory and
    /// retires once the load/store queue reports the write.
    ///
    /// # Returns
    ///
    /// The retired entry, if any.
    ///
    /// # Errors
    ///
    /// `SimError::Fault` when a faulted entry reaches the head.
    pub fn commit(&mut self, ports: &mut CommitPorts<'_>) -> SimResult<Option<RobEntry>> {
        let cycle = self.cycle;
        let Some(head) = self.entries.get_mut(self.head).filter(|e| e.valid) else {
            return Ok(None);
        };

        match head.state {
            RobState::Issued | RobState::Committing => return Ok(None),
            RobState::Faulted(fault) => {
                return Err(SimError::Fault {
                    pc: head.inst.pc,
                    fault,
                });
            }
            RobState::Written => {}
            RobState::Completed if head.finished_cycle >= cycle => return Ok(None),
            RobState::Completed if head.inst.opcode == Opcode::Sd => {
                head.state = RobState::Committing;
                ports.lsq.mem_commit(head.tag);
                ports.tracker.update(Stage::Commit, head.inst.pc);
                debug!(cycle, pc = head.inst.pc, tag = %head.tag, "store authorized");
                return Ok(None);
            }
            RobState::Completed => {}
        }

        let entry = head.clone();
        head.valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;

        if let Some(dest) = entry.dest {
            ports.regs.write(dest, entry.value);
            ports.rat.clear(dest, entry.tag);
        }
        if entry.inst.opcode != Opcode::Sd {
            ports.tracker.update(Stage::Commit, entry.inst.pc);
        }
        ports.stats.record_retire(entry.inst.opcode);
        debug!(
            cycle,
            pc = entry.inst.pc,
            tag = %entry.tag,
            inst = %entry.inst,
            "commit"
        );
        Ok(Some(entry))
    }

    /// Captures the allocation point just after the most recent entry.
    pub const fn snapshot(&self) -> RobSnapshot {
        RobSnapshot { tail: self.tail }
    }

    /// Squashes every entry allocated after `snapshot` was taken.
    ///
    /// The entry allocated immediately before the snapshot must still be live.
    ///
    /// # Returns
    ///
    /// The squashed entries, oldest first.
    pub fn rewind(&mut self, snapshot: RobSnapshot) -> Vec<RobEntry> {
        if self.count == 0 {
            return Vec::new();
        }
        let cap = self.entries.len();
        let kept = (snapshot.tail + cap - self.head + cap - 1) % cap + 1;
        let younger = self.count.saturating_sub(kept);

        let mut squashed = Vec::with_capacity(younger);
        let mut idx = snapshot.tail % cap;
        for _ in 0..younger {
            let entry = &mut self.entries[idx];
            if entry.valid {
                squashed.push(entry.clone());
                entry.valid = false;
            }
            idx = (idx + 1) % cap;
        }
        self.tail = snapshot.tail % cap;
        self.count -= younger;
        squashed
    }
}

impl CdbSubscriber for Rob {
    fn read_cdb(&mut self, packet: &CdbPacket) {
        self.read_result(packet);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::pipeline::tracker::NullTracker;

    struct Harness {
        regs: RegisterFiles,
        rat: Rat,
        lsq: LoadStoreQueue,
        tracker: NullTracker,
        stats: SimStats,
    }

    impl Harness {
        fn new() -> Self {
            let config = Config::default();
            Self {
                regs: RegisterFiles::new(32),
                rat: Rat::new(32),
                lsq: LoadStoreQueue::new(&config),
                tracker: NullTracker,
                stats: SimStats::default(),
            }
        }

        fn commit(&mut self, rob: &mut Rob) -> Option<RobEntry> {
            let mut ports = CommitPorts {
                regs: &mut self.regs,
                rat: &mut self.rat,
                lsq: &mut self.lsq,
                tracker: &mut self.tracker,
                stats: &mut self.stats,
            };
            rob.commit(&mut ports).unwrap()
        }
    }

    fn inst(text: &str) -> Instruction {
        text.parse().unwrap()
    }

    fn finish(rob: &mut Rob, tag: RobTag, value: Word) {
        rob.read_result(&CdbPacket {
            tag,
            value,
            opcode: Opcode::Add,
            pc: 0,
        });
    }

    #[test]
    fn test_allocate_and_commit() {
        let mut h = Harness::new();
        let mut rob = Rob::new(4);
        assert!(rob.is_empty());
        assert_eq!(rob.free_slots(), 4);

        let tag = rob.enqueue(inst("Add R1, R2, R3")).unwrap();
        assert_eq!(rob.len(), 1);
        assert!(h.commit(&mut rob).is_none());

        rob.begin_cycle(1);
        finish(&mut rob, tag, 42);
        // Finished this cycle: not yet eligible.
        assert!(h.commit(&mut rob).is_none());

        rob.begin_cycle(2);
        let entry = h.commit(&mut rob).unwrap();
        assert_eq!(entry.value, 42);
        assert_eq!(h.regs.read(ArchReg::Int(1)), 42);
        assert!(rob.is_empty());
    }

    #[test]
    fn test_full_rob() {
        let mut rob = Rob::new(2);
        let _t1 = rob.enqueue(inst("Add R1, R2, R3")).unwrap();
        let _t2 = rob.enqueue(inst("Add R2, R2, R3")).unwrap();
        assert!(rob.is_full());
        assert_eq!(rob.enqueue(inst("Nop")), Err(Hazard::RobFull));
    }

    #[test]
    fn test_in_order_commit() {
        let mut h = Harness::new();
        let mut rob = Rob::new(4);
        let t1 = rob.enqueue(inst("Add R1, R2, R3")).unwrap();
        let t2 = rob.enqueue(inst("Add R2, R2, R3")).unwrap();

        rob.begin_cycle(1);
        finish(&mut rob, t2, 200);
        rob.begin_cycle(2);
        assert!(h.commit(&mut rob).is_none());

        finish(&mut rob, t1, 100);
        rob.begin_cycle(3);
        assert_eq!(h.commit(&mut rob).map(|e| e.value), Some(100));
        assert_eq!(h.commit(&mut rob).map(|e| e.value), Some(200));
    }

    #[test]
    fn test_fault_reaches_head() {
        let mut h = Harness::new();
        let mut rob = Rob::new(4);
        let tag = rob.enqueue(inst("Ld R1, 3(R0)")).unwrap();
        let fault = MemoryFault::Misaligned {
            address: 3,
            word_bytes: 4,
        };
        rob.fault(tag, fault);
        let mut ports = CommitPorts {
            regs: &mut h.regs,
            rat: &mut h.rat,
            lsq: &mut h.lsq,
            tracker: &mut h.tracker,
            stats: &mut h.stats,
        };
        assert!(matches!(
            rob.commit(&mut ports),
            Err(SimError::Fault { pc: 0, .. })
        ));
    }

    #[test]
    fn test_request_falls_back_to_register_file() {
        let mut regs = RegisterFiles::new(32);
        regs.write(ArchReg::Int(4), 9);
        let mut rob = Rob::new(4);
        let tag = rob.enqueue(inst("Add R4, R1, R1")).unwrap();
        let source = Source {
            reg: ArchReg::Int(4),
            tag: Some(tag),
        };
        assert_eq!(rob.request(source, &regs), Operand::Pending(tag));
        finish(&mut rob, tag, 7);
        assert_eq!(rob.request(source, &regs), Operand::Ready(7));

        let stale = Source {
            reg: ArchReg::Int(4),
            tag: Some(RobTag(3)),
        };
        assert_eq!(rob.request(stale, &regs), Operand::Ready(9));
    }

    #[test]
    fn test_rewind_squashes_younger_entries() {
        let mut rob = Rob::new(8);
        let _t0 = rob.enqueue(inst("Add R1, R2, R3")).unwrap();
        let branch = rob.enqueue(inst("Beq R1, R2, 2")).unwrap();
        let snap = rob.snapshot();
        let _t2 = rob.enqueue(inst("Add R4, R2, R3")).unwrap();
        let _t3 = rob.enqueue(inst("Add R5, R2, R3")).unwrap();

        let squashed = rob.rewind(snap);
        assert_eq!(squashed.len(), 2);
        assert_eq!(rob.len(), 2);
        assert!(rob.is_live(branch));
        assert!(!rob.is_live(RobTag(2)));
        assert_eq!(rob.enqueue(inst("Nop")), Ok(RobTag(2)));
    }

    #[test]
    fn test_rewind_when_full_across_wrap() {
        let mut h = Harness::new();
        let mut rob = Rob::new(3);
        let t0 = rob.enqueue(inst("Add R1, R2, R3")).unwrap();
        finish(&mut rob, t0, 1);
        rob.begin_cycle(1);
        assert!(h.commit(&mut rob).is_some());

        // head = 1; branch lands in slot 1, younger entries wrap to slots 2, 0.
        let branch = rob.enqueue(inst("Bne R1, R2, 1")).unwrap();
        let snap = rob.snapshot();
        let _ = rob.enqueue(inst("Add R4, R2, R3")).unwrap();
        let _ = rob.enqueue(inst("Add R5, R2, R3")).unwrap();
        assert!(rob.is_full());

        assert_eq!(rob.rewind(snap).len(), 2);
        assert_eq!(rob.len(), 1);
        assert_eq!(rob.peek_head().map(|e| e.tag), Some(branch));
    }

    #[test]
    fn test_circular_wraparound() {
        let mut h = Harness::new();
        let mut rob = Rob::new(2);
        for i in 0..10 {
            rob.begin_cycle(i);
            let tag = rob.enqueue(inst("Addi R1, R1, #1")).unwrap();
            finish(&mut rob, tag, i);
            rob.begin_cycle(i + 1);
            let entry = h.commit(&mut rob).unwrap();
            assert_eq!(entry.value, i);
        }
    }
}
