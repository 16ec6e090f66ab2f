//! Instruction source.
//!
//! Holds the decoded program and answers fetches by byte address. Instruction
//! `i` lives at address `4 * i`; any address outside the program fetches a
//! no-op.

use crate::common::error::{ParseError, SimError, SimResult};

use super::instruction::{INSTRUCTION_BYTES, Instruction};
use super::parse::strip_comment;

/// A decoded program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Builds a program, stamping each instruction with its address.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        let instructions = instructions
            .into_iter()
            .zip((0..).step_by(INSTRUCTION_BYTES as usize))
            .map(|(inst, pc)| inst.at(pc))
            .collect();
        Self { instructions }
    }

    /// Decodes program text, one instruction per line.
    pub fn parse(text: &str, register_count: usize) -> SimResult<Self> {
        Self::from_lines(text.lines(), register_count)
    }

    /// Decodes a sequence of lines.
    ///
    /// Blank and comment-only lines are skipped. Registers at or above
    /// `register_count` are rejected.
    ///
    /// # Returns
    ///
    /// `SimError::Parse` carrying the one-based line number of the first bad line.
    pub fn from_lines<I, S>(lines: I, register_count: usize) -> SimResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instructions = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            let text = strip_comment(line.as_ref());
            if text.is_empty() {
                continue;
            }
            let at_line = |source| SimError::Parse {
                line: index + 1,
                source,
            };
            let inst: Instruction = text.parse().map_err(at_line)?;
            if let Some(reg) = inst.registers().find(|r| r.index() >= register_count) {
                return Err(at_line(ParseError::InvalidRegister(reg.to_string())));
            }
            instructions.push(inst);
        }
        Ok(Self::new(instructions))
    }

    /// Fetches the instruction at `pc`, or a no-op outside the program.
    pub fn fetch(&self, pc: u64) -> Instruction {
        self.index_of(pc)
            .and_then(|i| self.instructions.get(i))
            .copied()
            .unwrap_or_else(|| Instruction::nop(pc))
    }

    /// Returns true once `pc` has run off the end of the program.
    #[inline]
    pub fn is_past_end(&self, pc: u64) -> bool {
        pc >= self.end_address()
    }

    /// Address one past the last instruction.
    #[inline]
    pub fn end_address(&self) -> u64 {
        self.instructions.len() as u64 * INSTRUCTION_BYTES
    }

    /// Number of instructions.
    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true for an empty program.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The decoded instructions in address order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    fn index_of(&self, pc: u64) -> Option<usize> {
        (pc % INSTRUCTION_BYTES == 0)
            .then(|| usize::try_from(pc / INSTRUCTION_BYTES).ok())
            .flatten()
    }
}
