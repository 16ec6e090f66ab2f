//! Machine Image Loader.
//!
//! This module reads the JSON machine image that describes one simulation run. It performs:
//! 1. **Configuration:** Deserializes the simulator configuration (every field optional).
//! 2. **Register setup:** Applies initial values to named integer and floating registers.
//! 3. **Memory setup:** Applies initial words at decimal or `0x` hexadecimal byte addresses.
//! 4. **Program decoding:** Parses the instruction text into a `Program`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::data::{Word, from_float, from_int};
use crate::common::error::{SimError, SimResult};
use crate::common::reg::ArchReg;
use crate::config::Config;
use crate::core::arch::RegisterFiles;
use crate::isa::program::Program;
use crate::soc::memory::Memory;

/// A numeric initial value.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Whole number, stored as a two's-complement word.
    Int(i64),
    /// Real number, stored as an IEEE-754 double.
    Float(f64),
}

impl Value {
    /// Encodes the value as a machine word as written.
    pub const fn to_word(self) -> Word {
        match self {
            Self::Int(v) => from_int(v),
            Self::Float(v) => from_float(v),
        }
    }

    /// Encodes the value as a double, widening whole numbers.
    pub const fn to_float_word(self) -> Word {
        match self {
            Self::Int(v) => from_float(v as f64),
            Self::Float(v) => from_float(v),
        }
    }
}

/// Everything needed to start a run.
///
/// ```
/// use tomasim_core::sim::loader::MachineImage;
///
/// let image = MachineImage::from_json(
///     r#"{ "registers": { "R1": 4 }, "program": ["Addi R2, R1, #1"] }"#,
/// )
/// .unwrap();
/// let (program, regs, _memory) = image.build().unwrap();
/// assert_eq!(program.len(), 1);
/// assert_eq!(regs.gpr.read(1), 4);
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineImage {
    /// Simulator configuration.
    #[serde(default)]
    pub config: Config,
    /// Initial register values by name (`R1`, `F2`).
    #[serde(default)]
    pub registers: BTreeMap<String, Value>,
    /// Initial memory words by byte address.
    #[serde(default)]
    pub memory: BTreeMap<String, Value>,
    /// Instruction text, one instruction per element.
    #[serde(default)]
    pub program: Vec<String>,
}

impl MachineImage {
    /// Parses a machine image from JSON text.
    ///
    /// # Errors
    ///
    /// `SimError::Json` if the text does not match the image schema.
    pub fn from_json(text: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a machine image file.
    ///
    /// # Errors
    ///
    /// `SimError::Io` if the file cannot be read, `SimError::Json` if it is malformed.
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validates the configuration and builds the initial machine state.
    ///
    /// Floating registers accept whole numbers and widen them; integer
    /// registers reject real numbers.
    ///
    /// # Returns
    ///
    /// The decoded program, initial register files and initial memory.
    ///
    /// # Errors
    ///
    /// `SimError::Config` for invalid configuration, register names or
    /// addresses; `SimError::Parse` for undecodable instructions;
    /// `SimError::Fault` for misaligned or out-of-range memory addresses.
    pub fn build(&self) -> SimResult<(Program, RegisterFiles, Memory)> {
        self.config.validate()?;
        let count = self.config.registers.count;

        let program = Program::from_lines(&self.program, count)?;

        let mut regs = RegisterFiles::new(count);
        for (name, value) in &self.registers {
            let reg: ArchReg = name
                .parse()
                .map_err(|e| SimError::Config(format!("register `{name}`: {e}")))?;
            if reg.index() >= count {
                return Err(SimError::Config(format!(
                    "register `{name}` exceeds the {count} configured registers"
                )));
            }
            let word = match (reg, value) {
                (ArchReg::Fp(_), v) => v.to_float_word(),
                (ArchReg::Int(_), Value::Int(v)) => from_int(*v),
                (ArchReg::Int(_), Value::Float(v)) => {
                    return Err(SimError::Config(format!(
                        "integer register `{name}` cannot hold {v}"
                    )));
                }
            };
            regs.write(reg, word);
        }

        let mut memory = Memory::new(self.config.memory.size_bytes, self.config.memory.word_bytes);
        for (text, value) in &self.memory {
            let address = parse_address(text)?;
            memory
                .write(address, value.to_word())
                .map_err(|fault| SimError::Config(format!("memory `{text}`: {fault}")))?;
        }

        Ok((program, regs, memory))
    }
}

/// Parses a byte address written in decimal or `0x` hexadecimal.
///
/// # Errors
///
/// `SimError::Config` if the text is not a valid address.
pub fn parse_address(text: &str) -> SimResult<u64> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| SimError::Config(format!("invalid memory address `{text}`")))
}
