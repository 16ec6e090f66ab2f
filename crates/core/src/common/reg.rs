//! Architectural register names.
//!
//! Registers are named `R<n>` (integer file) or `F<n>` (floating-point file).
//! `R0` reads as zero and is never renamed.

use std::fmt;
use std::str::FromStr;

use super::error::ParseError;

/// An architectural register reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchReg {
    /// Integer register `R<n>`.
    Int(u8),
    /// Floating-point register `F<n>`.
    Fp(u8),
}

impl ArchReg {
    /// The hardwired zero register.
    pub const ZERO: Self = Self::Int(0);

    /// Index of the register within its file.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Int(n) | Self::Fp(n) => n as usize,
        }
    }

    /// Returns true for floating-point registers.
    #[inline]
    pub const fn is_fp(self) -> bool {
        matches!(self, Self::Fp(_))
    }

    /// Returns true for `R0`.
    #[inline]
    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Int(0))
    }
}

impl fmt::Display for ArchReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "R{n}"),
            Self::Fp(n) => write!(f, "F{n}"),
        }
    }
}

impl FromStr for ArchReg {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ParseError::InvalidRegister(s.to_string());
        let mut chars = s.chars();
        let file = chars.next().ok_or_else(invalid)?;
        let index: u8 = chars.as_str().parse().map_err(|_| invalid())?;
        match file {
            'R' | 'r' => Ok(Self::Int(index)),
            'F' | 'f' => Ok(Self::Fp(index)),
            _ => Err(invalid()),
        }
    }
}
