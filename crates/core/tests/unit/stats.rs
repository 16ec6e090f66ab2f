//! Statistics Reporting Tests.

use tomasim_core::common::error::Hazard;
use tomasim_core::isa::{Opcode, UnitKind};
use tomasim_core::stats::{STATS_SECTIONS, SimStats};

#[test]
fn retire_and_stall_counters() {
    let mut stats = SimStats::default();
    stats.record_retire(Opcode::Ld);
    stats.record_retire(Opcode::MultD);
    stats.record_stall(Hazard::StationsFull(UnitKind::FpAdder));
    stats.record_stall(Hazard::CheckpointOutstanding);

    assert_eq!(stats.instructions_retired, 2);
    assert_eq!(stats.inst_load, 1);
    assert_eq!(stats.inst_fp_mul, 1);
    assert_eq!(stats.stalls_stations, 1);
    assert_eq!(stats.stalls_branch, 1);
}

#[test]
fn sections_are_selectable() {
    let stats = SimStats::default();
    let all = stats.render_sections(&[]);
    for header in ["SIMULATION STATISTICS", "CORE BREAKDOWN", "INSTRUCTION MIX", "BRANCH PREDICTION", "BUS AND MEMORY"] {
        assert!(all.contains(header), "missing {header}");
    }

    let only = stats.render_sections(&["memory".to_string()]);
    assert!(only.contains("cdb.broadcasts"));
    assert!(!only.contains("bp.accuracy"));
    assert!(STATS_SECTIONS.contains(&"memory"));
}
