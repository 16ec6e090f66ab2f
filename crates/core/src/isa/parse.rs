//! Textual instruction decoding.
//!
//! Accepts one instruction per line in the form `Mnemonic op, op, op`.
//! Mnemonics are case-insensitive; `;` and `//` start a comment. Immediates may
//! be written `#5`, `5`, `-3` or `0x10`. Memory operands are written
//! `imm(Rn)`, with an empty displacement meaning zero.

use std::str::FromStr;

use crate::common::error::ParseError;
use crate::common::reg::ArchReg;

use super::instruction::{Instruction, Opcode};

/// Removes a trailing comment and surrounding whitespace.
pub fn strip_comment(line: &str) -> &str {
    let end = [line.find(';'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    line[..end].trim()
}

/// Parses an immediate in decimal or hexadecimal, with optional `#` prefix.
pub fn parse_immediate(text: &str) -> Result<i64, ParseError> {
    let invalid = || ParseError::InvalidImmediate(text.to_string());
    let body = text.trim();
    let body = body.strip_prefix('#').unwrap_or(body).trim();
    let (negative, digits) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body.strip_prefix('+').unwrap_or(body)),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|_| invalid())?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Splits `imm(Rn)` into displacement and base register.
fn parse_memory_operand(text: &str) -> Result<(i64, ArchReg), ParseError> {
    let invalid = || ParseError::InvalidMemoryOperand(text.to_string());
    let open = text.find('(').ok_or_else(invalid)?;
    let inner = text[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
    let displacement = text[..open].trim();
    let imm = if displacement.is_empty() {
        0
    } else {
        parse_immediate(displacement)?
    };
    Ok((imm, inner.parse()?))
}

/// Parses a register and checks it belongs to the required file.
fn register(op: Opcode, text: &str, fp: Option<bool>) -> Result<ArchReg, ParseError> {
    let reg: ArchReg = text.parse()?;
    match fp {
        Some(want_fp) if reg.is_fp() != want_fp => Err(ParseError::RegisterClass {
            mnemonic: op.mnemonic(),
            register: text.to_string(),
        }),
        _ => Ok(reg),
    }
}

impl FromStr for Instruction {
    type Err = ParseError;

    /// Decodes a single line. The resulting instruction sits at address zero;
    /// the program source relocates it.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = strip_comment(line);
        let (mnemonic, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let op = Opcode::from_mnemonic(mnemonic)
            .ok_or_else(|| ParseError::UnknownOpcode(mnemonic.to_string()))?;

        let operands: Vec<&str> = if rest.trim().is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };
        let expected = match op {
            Opcode::Nop => 0,
            Opcode::Ld | Opcode::Sd => 2,
            _ => 3,
        };
        if operands.len() != expected {
            return Err(ParseError::OperandCount {
                mnemonic: op.mnemonic(),
                expected,
                found: operands.len(),
            });
        }

        let mut inst = Self::nop(0);
        inst.opcode = op;
        match op {
            Opcode::Nop => {}
            Opcode::Add | Opcode::Sub => {
                inst.dest = Some(register(op, operands[0], Some(false))?);
                inst.src1 = Some(register(op, operands[1], Some(false))?);
                inst.src2 = Some(register(op, operands[2], Some(false))?);
            }
            Opcode::AddD | Opcode::SubD | Opcode::MultD => {
                inst.dest = Some(register(op, operands[0], Some(true))?);
                inst.src1 = Some(register(op, operands[1], Some(true))?);
                inst.src2 = Some(register(op, operands[2], Some(true))?);
            }
            Opcode::Addi => {
                inst.dest = Some(register(op, operands[0], Some(false))?);
                inst.src1 = Some(register(op, operands[1], Some(false))?);
                inst.imm = parse_immediate(operands[2])?;
            }
            Opcode::Beq | Opcode::Bne => {
                inst.src1 = Some(register(op, operands[0], Some(false))?);
                inst.src2 = Some(register(op, operands[1], Some(false))?);
                inst.imm = parse_immediate(operands[2])?;
            }
            Opcode::Ld | Opcode::Sd => {
                let data = register(op, operands[0], None)?;
                let (imm, base) = parse_memory_operand(operands[1])?;
                if base.is_fp() {
                    return Err(ParseError::RegisterClass {
                        mnemonic: op.mnemonic(),
                        register: base.to_string(),
                    });
                }
                inst.src1 = Some(base);
                inst.imm = imm;
                if op == Opcode::Ld {
                    inst.dest = Some(data);
                } else {
                    inst.src2 = Some(data);
                }
            }
        }
        Ok(inst)
    }
}
