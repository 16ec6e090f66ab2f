//! Common Data Bus (CDB).
//!
//! The single result-broadcast channel between the execution resources and
//! everything waiting on their results. It provides:
//! 1. **Result Buffers:** Bounded per-source queues; a result becomes eligible
//!    for the bus the cycle after it is produced.
//! 2. **Arbitration:** A FIFO of ready sources, served oldest-first, one packet per cycle.
//! 3. **Broadcast:** Delivery of the winning packet to every subscriber.

use std::collections::VecDeque;

use crate::common::data::Word;
use crate::common::error::Hazard;
use crate::isa::instruction::Opcode;

use super::rob::RobTag;
use super::traits::{CdbSubscriber, ResultSource};

/// A result crossing the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CdbPacket {
    /// Reorder buffer slot the result belongs to.
    pub tag: RobTag,
    /// Result value. Branches carry `rs - rt`.
    pub value: Word,
    /// Opcode that produced the result.
    pub opcode: Opcode,
    /// Address of the producing instruction.
    pub pc: u64,
}

/// Bounded result queue owned by each bus source.
///
/// Results pushed during a cycle are staged and only become ready after
/// `promote`, which each owner calls at the start of its next tick.
#[derive(Clone, Debug)]
pub struct ResultBuffer {
    capacity: usize,
    staged: Vec<CdbPacket>,
    ready: VecDeque<CdbPacket>,
}

impl ResultBuffer {
    /// Creates an empty buffer holding at most `capacity` results.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            staged: Vec::with_capacity(capacity),
            ready: VecDeque::with_capacity(capacity),
        }
    }

    /// Results held, staged or ready.
    #[inline]
    pub fn len(&self) -> usize {
        self.staged.len() + self.ready.len()
    }

    /// Returns true if nothing is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if another result would be rejected.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Stages a freshly computed result.
    ///
    /// # Errors
    ///
    /// `Hazard::ResultBufferFull` when at capacity.
    pub fn push(&mut self, packet: CdbPacket) -> Result<(), Hazard> {
        if self.is_full() {
            return Err(Hazard::ResultBufferFull);
        }
        self.staged.push(packet);
        Ok(())
    }

    /// Makes last cycle's results eligible for the bus.
    pub fn promote(&mut self) {
        self.ready.extend(self.staged.drain(..));
    }

    /// Returns true if a result may cross the bus this cycle.
    #[inline]
    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Removes the oldest ready result.
    pub fn pop(&mut self) -> Option<CdbPacket> {
        self.ready.pop_front()
    }

    /// Keeps only results whose tag satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(RobTag) -> bool) {
        self.staged.retain(|p| keep(p.tag));
        self.ready.retain(|p| keep(p.tag));
    }
}

/// The bus arbiter.
#[derive(Clone, Debug, Default)]
pub struct Cdb {
    queue: VecDeque<usize>,
}

/// Outcome of one arbitration round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grant {
    /// Index of the winning source.
    pub source: usize,
    /// The packet it delivered.
    pub packet: CdbPacket,
    /// Sources still waiting after the grant.
    pub waiting: usize,
}

impl Cdb {
    /// Creates an idle bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources currently queued for the bus.
    pub fn waiting(&self) -> usize {
        self.queue.len()
    }

    /// Runs one arbitration round.
    ///
    /// Sources are identified by their position in `sources`, which must be
    /// stable across cycles. Every source with a ready result that is not
    /// already queued joins the back of the queue; then the oldest queued
    /// source that still has something to deliver wins the bus.
    pub fn tick(&mut self, sources: &mut [&mut dyn ResultSource]) -> Option<Grant> {
        for (index, source) in sources.iter().enumerate() {
            if source.has_result() && !self.queue.contains(&index) {
                self.queue.push_back(index);
            }
        }

        while let Some(index) = self.queue.pop_front() {
            let Some(source) = sources.get_mut(index) else {
                continue;
            };
            if let Some(packet) = source.deliver() {
                return Some(Grant {
                    source: index,
                    packet,
                    waiting: self.queue.len(),
                });
            }
        }
        None
    }
}

/// Delivers one packet to every subscriber.
pub fn broadcast(packet: &CdbPacket, subscribers: &mut [&mut dyn CdbSubscriber]) {
    for subscriber in subscribers.iter_mut() {
        subscriber.read_cdb(packet);
    }
}
