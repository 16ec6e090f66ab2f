//! Common Data Bus Arbitration Tests.
//!
//! The bus grants one packet per cycle, oldest requester first, and a source
//! that keeps producing cannot starve the others.

use std::collections::VecDeque;

use tomasim_core::core::pipeline::cdb::{Cdb, CdbPacket};
use tomasim_core::core::pipeline::rob::RobTag;
use tomasim_core::core::pipeline::traits::ResultSource;
use tomasim_core::isa::Opcode;

#[derive(Default)]
struct Queue(VecDeque<CdbPacket>);

impl Queue {
    fn with(tags: &[usize]) -> Self {
        Self(
            tags.iter()
                .map(|&t| CdbPacket {
                    tag: RobTag(t),
                    value: t as u64,
                    opcode: Opcode::Add,
                    pc: t as u64 * 4,
                })
                .collect(),
        )
    }
}

impl ResultSource for Queue {
    fn has_result(&self) -> bool {
        !self.0.is_empty()
    }

    fn deliver(&mut self) -> Option<CdbPacket> {
        self.0.pop_front()
    }
}

#[test]
fn one_packet_per_cycle() {
    let mut cdb = Cdb::new();
    let mut a = Queue::with(&[1]);
    let mut b = Queue::with(&[2]);

    let first = {
        let mut sources: [&mut dyn ResultSource; 2] = [&mut a, &mut b];
        cdb.tick(&mut sources).unwrap()
    };
    assert_eq!(first.source, 0);
    assert_eq!(first.packet.tag, RobTag(1));
    assert_eq!(first.waiting, 1, "the second source is still queued");

    let second = {
        let mut sources: [&mut dyn ResultSource; 2] = [&mut a, &mut b];
        cdb.tick(&mut sources).unwrap()
    };
    assert_eq!(second.source, 1);
    assert_eq!(second.waiting, 0);

    let mut sources: [&mut dyn ResultSource; 2] = [&mut a, &mut b];
    assert!(cdb.tick(&mut sources).is_none());
}

#[test]
fn busy_source_does_not_starve_others() {
    let mut cdb = Cdb::new();
    let mut busy = Queue::with(&[1, 3, 5]);
    let mut quiet = Queue::with(&[2]);

    let mut order = Vec::new();
    for _ in 0..4 {
        let mut sources: [&mut dyn ResultSource; 2] = [&mut busy, &mut quiet];
        if let Some(grant) = cdb.tick(&mut sources) {
            order.push(grant.packet.tag.0);
        }
    }
    assert_eq!(order, vec![1, 2, 3, 5]);
}

#[test]
fn emptied_source_is_skipped() {
    let mut cdb = Cdb::new();
    let mut a = Queue::with(&[1]);
    let mut b = Queue::with(&[2]);
    {
        let mut sources: [&mut dyn ResultSource; 2] = [&mut a, &mut b];
        let _ = cdb.tick(&mut sources);
    }
    // Squash drains the queued source before its turn.
    b.0.clear();
    let mut sources: [&mut dyn ResultSource; 2] = [&mut a, &mut b];
    assert!(cdb.tick(&mut sources).is_none());
    assert_eq!(cdb.waiting(), 0);
}
