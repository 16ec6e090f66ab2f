//! CPU Execution Scenarios.
//!
//! Whole-machine runs covering data dependencies, structural stalls,
//! store-to-load forwarding, branch recovery and fault delivery.

use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use tomasim_core::common::error::{MemoryFault, SimError};
use tomasim_core::core::pipeline::tracker::Stage;

use crate::common::TestContext;
use crate::common::harness::{drain, fp_reg, int_reg};
use crate::common::mocks::{MockTracker, Recorder};

// ══════════════════════════════════════════════════════════
// 1. Data flow
// ══════════════════════════════════════════════════════════

#[test]
fn dependent_adds_wait_for_broadcast() {
    let mut sim = TestContext::new()
        .program(&["Addi R1, R0, #5", "Add R2, R1, R1"])
        .build();
    let cycles = sim.run().unwrap();

    assert_eq!(int_reg(&sim, "R1"), 5);
    assert_eq!(int_reg(&sim, "R2"), 10);
    assert_eq!(cycles, 6, "issue, execute, broadcast chain of two instructions");
    assert_eq!(sim.cpu.stats.instructions_retired, 2);
}

#[test]
fn floating_chain_uses_initial_registers() {
    let sim = TestContext::new()
        .fp("F2", 1.5)
        .fp("F3", 4.0)
        .program(&["Mult.d F1, F2, F3", "Sub.d F4, F1, F2"])
        .run();

    assert_eq!(fp_reg(&sim, "F1"), 6.0);
    assert_eq!(fp_reg(&sim, "F4"), 4.5);
}

#[test]
fn writes_to_r0_are_discarded() {
    let sim = TestContext::new()
        .program(&["Addi R0, R0, #9", "Addi R1, R0, #1"])
        .run();
    assert_eq!(int_reg(&sim, "R0"), 0);
    assert_eq!(int_reg(&sim, "R1"), 1);
}

#[test]
fn stage_notifications_reach_the_tracker() {
    let mut tracker = MockTracker::new();
    let _ = tracker.expect_begin_cycle().return_const(());
    for stage in [Stage::Issue, Stage::Execute, Stage::WriteBack, Stage::Commit] {
        let _ = tracker
            .expect_update()
            .with(eq(stage), eq(0))
            .times(1)
            .return_const(());
    }
    let _ = tracker.expect_squash().never();

    let mut cpu = TestContext::new()
        .program(&["Addi R1, R0, #5"])
        .build_cpu(tracker);
    let _ = drain(&mut cpu, 50);
}

// ══════════════════════════════════════════════════════════
// 2. Structural hazards
// ══════════════════════════════════════════════════════════

#[test]
fn full_stations_hold_dispatch() {
    let sim = TestContext::new()
        .configure(|c| c.units.int_adder.stations = 1)
        .program(&["Addi R1, R0, #1", "Addi R2, R0, #2"])
        .run();

    assert!(sim.cpu.stats.stalls_stations >= 1);
    assert_eq!(int_reg(&sim, "R1"), 1);
    assert_eq!(int_reg(&sim, "R2"), 2);
}

#[test]
fn small_rob_still_drains() {
    let sim = TestContext::new()
        .configure(|c| c.rob.entries = 2)
        .program(&[
            "Addi R1, R0, #1",
            "Addi R2, R1, #1",
            "Addi R3, R2, #1",
            "Addi R4, R3, #1",
        ])
        .run();

    assert!(sim.cpu.stats.stalls_rob > 0);
    assert_eq!(int_reg(&sim, "R4"), 4);
}

#[test]
fn bus_serializes_simultaneous_results() {
    let sim = TestContext::new()
        .configure(|c| {
            c.units.int_adder.latency = 3;
            c.units.fp_adder.latency = 2;
        })
        .fp("F2", 1.0)
        .fp("F3", 2.0)
        .program(&["Addi R1, R0, #1", "Add.d F1, F2, F3"])
        .run();

    assert_eq!(sim.cpu.stats.cdb_broadcasts, 2);
    assert!(sim.cpu.stats.cdb_contention >= 1);
    assert_eq!(fp_reg(&sim, "F1"), 3.0);
}

// ══════════════════════════════════════════════════════════
// 3. Memory
// ══════════════════════════════════════════════════════════

#[test]
fn load_forwards_from_pending_store() {
    let sim = TestContext::new()
        .program(&["Addi R1, R0, #42", "Sd R1, 8(R0)", "Ld R4, 8(R0)"])
        .run();

    assert_eq!(int_reg(&sim, "R4"), 42);
    assert_eq!(sim.cpu.stats.forwarded_loads, 1);
    assert_eq!(sim.cpu.memory.read(8).unwrap(), 42);
}

#[test]
fn load_reads_initial_memory() {
    let sim = TestContext::new()
        .word(12, -7)
        .int("R2", 4)
        .program(&["Ld R3, 8(R2)"])
        .run();

    assert_eq!(int_reg(&sim, "R3"), -7);
    assert_eq!(sim.cpu.stats.memory_reads, 1);
}

#[test]
fn fault_at_head_stops_the_run() {
    let mut sim = TestContext::new().program(&["Ld R1, 3(R0)"]).build();
    match sim.run() {
        Err(SimError::Fault { pc, fault }) => {
            assert_eq!(pc, 0);
            assert!(matches!(fault, MemoryFault::Misaligned { address: 3, .. }));
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════
// 4. Branches
// ══════════════════════════════════════════════════════════

#[test]
fn misprediction_discards_wrong_path() {
    let sim = TestContext::new()
        .program(&[
            "Addi R1, R0, #1",
            "Bne R1, R0, 1",
            "Addi R2, R0, #99",
            "Addi R3, R0, #7",
        ])
        .run();

    assert_eq!(int_reg(&sim, "R2"), 0, "wrong-path result must not retire");
    assert_eq!(int_reg(&sim, "R3"), 7);
    assert_eq!(sim.cpu.stats.branch_mispredictions, 1);
    assert!(sim.cpu.tracker.is_consistent());
}

#[test]
fn loop_trains_the_predictor() {
    let sim = TestContext::new()
        .program(&[
            "Addi R1, R0, #3",
            "Addi R1, R1, #-1",
            "Bne R1, R0, -2",
            "Addi R2, R0, #1",
        ])
        .run();

    assert_eq!(int_reg(&sim, "R1"), 0);
    assert_eq!(int_reg(&sim, "R2"), 1);
    assert_eq!(sim.cpu.stats.branch_mispredictions, 2);
    assert_eq!(sim.cpu.stats.branch_predictions, 1);
    assert_eq!(sim.cpu.stats.instructions_retired, 8);
}

#[test]
fn wrong_path_fault_is_dropped() {
    let sim = TestContext::new()
        .program(&["Beq R0, R0, 1", "Ld R1, 3(R0)", "Addi R2, R0, #5"])
        .run();

    assert_eq!(int_reg(&sim, "R2"), 5);
    assert_eq!(int_reg(&sim, "R1"), 0);
}

#[test]
fn wrong_path_store_never_writes_memory() {
    let sim = TestContext::new()
        .program(&[
            "Addi R1, R0, #9",
            "Bne R1, R0, 1",
            "Sd R1, 8(R0)",
            "Addi R2, R0, #1",
        ])
        .run();

    assert_eq!(sim.cpu.memory.read(8).unwrap(), 0, "squashed store reached memory");
    assert_eq!(sim.cpu.stats.memory_writes, 0);
    assert_eq!(sim.cpu.stats.branch_mispredictions, 1);
    assert_eq!(int_reg(&sim, "R2"), 1);
    assert!(sim.cpu.tracker.rows().iter().all(|r| r.inst.pc != 8));
}

#[test]
fn squashed_instructions_are_reported() {
    let mut cpu = TestContext::new()
        .program(&[
            "Addi R1, R0, #1",
            "Bne R1, R0, 1",
            "Addi R2, R0, #99",
            "Addi R3, R0, #7",
        ])
        .build_cpu(Recorder::default());
    let _ = drain(&mut cpu, 100);

    let tracker = cpu.into_tracker();
    assert!(tracker.squashed.contains(&8), "wrong-path Addi should be squashed");
    assert_eq!(tracker.pcs(Stage::Commit), vec![0, 4, 12]);
}
