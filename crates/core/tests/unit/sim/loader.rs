//! Machine Image Loader Tests.

use std::io::Write;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use tomasim_core::common::data::to_float;
use tomasim_core::common::error::SimError;
use tomasim_core::common::reg::ArchReg;
use tomasim_core::sim::{MachineImage, Simulator};

const IMAGE: &str = r#"{
    "config": {
        "general": { "max_cycles": 500 },
        "units": { "fp_multiplier": { "stations": 1, "latency": 4 } }
    },
    "registers": { "R1": 8, "F2": 3, "F3": 0.5 },
    "memory": { "0x8": 2.0 },
    "program": [
        "Ld F1, 0(R1)",
        "Mult.d F4, F1, F2",
        "Add.d F5, F4, F3",
        "Sd F5, 4(R1)"
    ]
}"#;

fn write_image(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn loads_image_from_file() {
    let file = write_image(IMAGE);
    let image = MachineImage::from_file(file.path()).unwrap();
    assert_eq!(image.config.general.max_cycles, 500);
    assert_eq!(image.config.units.fp_multiplier.latency, 4);
    assert_eq!(image.program.len(), 4);

    let (program, regs, memory) = image.build().unwrap();
    assert_eq!(program.len(), 4);
    assert_eq!(regs.read(ArchReg::Int(1)), 8);
    assert_eq!(to_float(regs.read(ArchReg::Fp(2))), 3.0);
    assert_eq!(to_float(memory.read(8).unwrap()), 2.0);
}

#[test]
fn image_runs_end_to_end() {
    let file = write_image(IMAGE);
    let image = MachineImage::from_file(file.path()).unwrap();
    let mut sim = Simulator::from_image(&image).unwrap();
    let _ = sim.run().unwrap();

    assert_eq!(to_float(sim.cpu.regs.read(ArchReg::Fp(4))), 6.0);
    assert_eq!(to_float(sim.cpu.memory.read(12).unwrap()), 6.5);
    assert!(sim.cpu.tracker.is_consistent());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = MachineImage::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(SimError::Io(_))));
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let image =
        MachineImage::from_json(r#"{ "config": { "lsq": { "entries": 0 } }, "program": ["Nop"] }"#)
            .unwrap();
    assert!(matches!(Simulator::from_image(&image), Err(SimError::Config(_))));
}

#[test]
fn out_of_range_register_is_rejected() {
    let image = MachineImage::from_json(
        r#"{ "config": { "registers": { "count": 4 } }, "registers": { "R7": 1 } }"#,
    )
    .unwrap();
    assert!(matches!(image.build(), Err(SimError::Config(_))));
}
