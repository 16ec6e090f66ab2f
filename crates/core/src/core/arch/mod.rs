//! Architectural state.
//!
//! This module contains the register files written by commit.
//! It includes the following modules:
//! 1. **FPRs:** Floating-Point Register file implementation.
//! 2. **GPRs:** General-Purpose Register file implementation.

use crate::common::data::Word;
use crate::common::reg::ArchReg;

/// Floating-Point Register file implementation.
pub mod fpr;

/// General-Purpose Register file implementation.
pub mod gpr;

pub use fpr::Fpr;
pub use gpr::Gpr;

/// Both architectural register files, addressed by `ArchReg`.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterFiles {
    /// Integer registers.
    pub gpr: Gpr,
    /// Floating-point registers.
    pub fpr: Fpr,
}

impl RegisterFiles {
    /// Creates both files with `count` registers each.
    pub fn new(count: usize) -> Self {
        Self {
            gpr: Gpr::new(count),
            fpr: Fpr::new(count),
        }
    }

    /// Reads an architectural register.
    #[inline]
    pub fn read(&self, reg: ArchReg) -> Word {
        match reg {
            ArchReg::Int(i) => self.gpr.read(usize::from(i)),
            ArchReg::Fp(i) => self.fpr.read(usize::from(i)),
        }
    }

    /// Writes an architectural register.
    #[inline]
    pub fn write(&mut self, reg: ArchReg, value: Word) {
        match reg {
            ArchReg::Int(i) => self.gpr.write(usize::from(i), value),
            ArchReg::Fp(i) => self.fpr.write(usize::from(i), value),
        }
    }
}
