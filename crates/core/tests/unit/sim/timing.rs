//! Timing Table and Run Loop Tests.

use tomasim_core::common::error::SimError;
use tomasim_core::core::pipeline::tracker::Stage;
use tomasim_core::isa::Opcode;

use crate::common::TestContext;

#[test]
fn every_row_follows_its_stage_order() {
    let mut sim = TestContext::new()
        .int("R2", 8)
        .program(&[
            "Addi R1, R0, #3",
            "Sd R1, 0(R2)",
            "Ld R3, 0(R2)",
            "Add R4, R3, R1",
            "Beq R4, R0, 1",
            "Addi R5, R0, #1",
        ])
        .build();
    let _ = sim.run().unwrap();

    let table = &sim.cpu.tracker;
    assert!(table.is_consistent());
    assert_eq!(table.rows().len(), 6);
    for row in table.rows() {
        assert!(row.cycle(Stage::Commit).is_some(), "{} never committed", row.inst);
        if row.inst.opcode == Opcode::Sd {
            assert!(row.cycle(Stage::WriteBack).is_none());
            assert!(row.cycle(Stage::Memory) > row.cycle(Stage::Commit));
        }
    }
}

#[test]
fn issue_is_one_per_cycle() {
    let sim = TestContext::new()
        .program(&["Addi R1, R0, #1", "Addi R2, R0, #2", "Addi R3, R0, #3"])
        .run();
    let issues: Vec<u64> = sim
        .cpu
        .tracker
        .rows()
        .iter()
        .filter_map(|r| r.cycle(Stage::Issue))
        .collect();
    assert_eq!(issues, vec![1, 2, 3]);
}

#[test]
fn squashed_rows_leave_the_table() {
    let sim = TestContext::new()
        .program(&[
            "Addi R1, R0, #1",
            "Bne R1, R0, 1",
            "Addi R2, R0, #99",
            "Addi R3, R0, #7",
        ])
        .run();
    let table = &sim.cpu.tracker;
    assert!(table.squashed() >= 1);
    assert!(table.rows().iter().all(|r| r.inst.pc != 8));
}

#[test]
fn run_stops_at_cycle_limit() {
    let mut sim = TestContext::new()
        .configure(|c| c.general.max_cycles = 3)
        .program(&["Mult.d F1, F2, F3"])
        .build();
    assert!(matches!(sim.run(), Err(SimError::CycleLimit(3))));
    assert_eq!(sim.cpu.cycle(), 3);
}

#[test]
fn report_lists_state_and_sections() {
    let sim = TestContext::new()
        .program(&["Addi R1, R0, #5", "Sd R1, 16(R0)"])
        .run();
    let report = sim.render_report(&["branch".to_string()]);
    assert!(report.contains("Registers"));
    assert!(report.contains("[0x0010] = 5"), "report was:\n{report}");
    assert!(report.contains("BRANCH PREDICTION"));
    assert!(!report.contains("INSTRUCTION MIX"));
}
