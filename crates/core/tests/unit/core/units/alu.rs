//! Datapath Tests.

use rstest::rstest;
use tomasim_core::common::data::{from_float, from_int, to_float, to_int};
use tomasim_core::core::units::alu::Alu;
use tomasim_core::core::units::fpu::Fpu;
use tomasim_core::isa::Opcode;

#[rstest]
#[case(Opcode::Add, 2, 3, 5)]
#[case(Opcode::Addi, 10, -4, 6)]
#[case(Opcode::Sub, 3, 5, -2)]
#[case(Opcode::Add, i64::MAX, 1, i64::MIN)]
#[case(Opcode::Beq, 9, 9, 0)]
#[case(Opcode::Bne, 9, 2, 7)]
#[case(Opcode::MultD, 3, 3, 0)]
fn integer_adder(#[case] op: Opcode, #[case] a: i64, #[case] b: i64, #[case] expected: i64) {
    assert_eq!(to_int(Alu::execute(op, from_int(a), from_int(b))), expected);
}

#[rstest]
#[case(Opcode::AddD, 1.5, 2.25, 3.75)]
#[case(Opcode::SubD, 1.0, 4.0, -3.0)]
#[case(Opcode::MultD, -2.0, 0.5, -1.0)]
fn floating_units(#[case] op: Opcode, #[case] a: f64, #[case] b: f64, #[case] expected: f64) {
    let result = to_float(Fpu::execute(op, from_float(a), from_float(b)));
    assert!((result - expected).abs() < f64::EPSILON, "{op}: {result} != {expected}");
}

#[test]
fn nan_results_are_canonical() {
    let r = Fpu::execute(Opcode::SubD, from_float(f64::INFINITY), from_float(f64::INFINITY));
    assert_eq!(r, 0x7ff8_0000_0000_0000);
}
