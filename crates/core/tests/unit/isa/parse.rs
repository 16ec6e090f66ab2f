//! Instruction Decoding Tests.

use rstest::rstest;
use tomasim_core::common::error::{ParseError, SimError};
use tomasim_core::common::reg::ArchReg;
use tomasim_core::isa::{Instruction, Opcode, Program};

#[rstest]
#[case("Add R1, R2, R3", Opcode::Add)]
#[case("sub R1, R2, R3", Opcode::Sub)]
#[case("Addi R1, R2, #-4", Opcode::Addi)]
#[case("Add.d F1, F2, F3", Opcode::AddD)]
#[case("Sub.d F1, F2, F3", Opcode::SubD)]
#[case("Mult.d F1, F2, F3", Opcode::MultD)]
#[case("Ld F1, 4(R2)", Opcode::Ld)]
#[case("Sd R1, 0(R2)", Opcode::Sd)]
#[case("Beq R1, R2, 2", Opcode::Beq)]
#[case("Bne R1, R2, -1", Opcode::Bne)]
#[case("Nop", Opcode::Nop)]
fn decodes_every_opcode(#[case] text: &str, #[case] opcode: Opcode) {
    let inst: Instruction = text.parse().unwrap();
    assert_eq!(inst.opcode, opcode);
}

#[rstest]
#[case("Mul R1, R2, R3")]
#[case("Add R1, R2")]
#[case("Add.d R1, F2, F3")]
#[case("Addi R1, R2, #x")]
#[case("Ld F1, 4[R2]")]
fn rejects_malformed_text(#[case] text: &str) {
    assert!(text.parse::<Instruction>().is_err(), "`{text}` should not decode");
}

#[test]
fn program_assigns_word_addresses() {
    let program = Program::parse("Addi R1, R0, #1\n\n; comment\nBne R1, R0, -1\n", 32).unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(program.instructions()[1].pc, 4);
    assert_eq!(program.fetch(4).opcode, Opcode::Bne);
    assert_eq!(program.fetch(40).opcode, Opcode::Nop);
    assert!(program.is_past_end(8));
}

#[test]
fn program_rejects_registers_beyond_count() {
    let err = Program::parse("Nop\nAdd R9, R1, R2", 8).unwrap_err();
    match err {
        SimError::Parse { line, source } => {
            assert_eq!(line, 2);
            assert_eq!(source, ParseError::InvalidRegister(ArchReg::Int(9).to_string()));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}
