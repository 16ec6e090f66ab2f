//! Configuration Unit Tests.
//!
//! Verifies the baseline machine and the checks `Config::validate` applies.

use tomasim_core::common::error::SimError;
use tomasim_core::config::Config;
use tomasim_core::isa::UnitKind;

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn default_machine_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.memory.word_bytes, 4);
    assert_eq!(config.registers.count, 32);
    for kind in UnitKind::ALL {
        assert_eq!(config.units.get(kind).count, 1, "{kind} should have one instance");
    }
}

#[test]
fn partial_json_keeps_other_defaults() {
    let config: Config =
        serde_json::from_str(r#"{ "rob": { "entries": 4 }, "units": { "fp_adder": { "stations": 1, "latency": 2 } } }"#)
            .unwrap();
    assert_eq!(config.rob.entries, 4);
    assert_eq!(config.units.fp_adder.latency, 2);
    assert_eq!(config.units.fp_adder.count, 1);
    assert_eq!(config.lsq.entries, Config::default().lsq.entries);
}

// ══════════════════════════════════════════════════════════
// 2. Validation
// ══════════════════════════════════════════════════════════

#[test]
fn zero_capacities_are_rejected() {
    let mut config = Config::default();
    config.rob.entries = 0;
    match config.validate() {
        Err(SimError::Config(msg)) => assert!(msg.contains("rob.entries"), "got: {msg}"),
        other => panic!("expected config error, got {other:?}"),
    }

    let mut config = Config::default();
    config.units.fp_multiplier.latency = 0;
    match config.validate() {
        Err(SimError::Config(msg)) => {
            assert!(msg.contains("latency"), "got: {msg}");
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn memory_geometry_is_checked() {
    let mut config = Config::default();
    config.memory.word_bytes = 16;
    assert!(matches!(config.validate(), Err(SimError::Config(_))));

    let mut config = Config::default();
    config.memory.size_bytes = 10;
    assert!(matches!(config.validate(), Err(SimError::Config(_))));
}
