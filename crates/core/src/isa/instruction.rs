//! Decoded instruction records and the static routing table.
//!
//! An `Instruction` is created once by the program source and then copied
//! freely between pipeline components. It carries everything the rename stage
//! needs: opcode, destination, sources, immediate and its own address.

use std::fmt;

use crate::common::reg::ArchReg;

/// Size of one instruction slot in bytes.
pub const INSTRUCTION_BYTES: u64 = 4;

/// Functional unit kinds that own reservation stations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitKind {
    /// Integer adder; also evaluates branch comparisons.
    IntAdder,
    /// Double-precision adder.
    FpAdder,
    /// Double-precision multiplier.
    FpMultiplier,
}

impl UnitKind {
    /// Every unit kind in dispatch-table order.
    pub const ALL: [Self; 3] = [Self::IntAdder, Self::FpAdder, Self::FpMultiplier];

    /// Configuration key of this unit kind.
    pub const fn key(self) -> &'static str {
        match self {
            Self::IntAdder => "int_adder",
            Self::FpAdder => "fp_adder",
            Self::FpMultiplier => "fp_multiplier",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IntAdder => "integer adder",
            Self::FpAdder => "floating-point adder",
            Self::FpMultiplier => "floating-point multiplier",
        })
    }
}

/// Where the rename stage sends an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// A reservation-station functional unit.
    Unit(UnitKind),
    /// The load/store queue.
    Lsq,
    /// Nowhere; the instruction only consumes a fetch slot.
    None,
}

/// Supported operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    /// Integer add.
    Add,
    /// Integer subtract.
    Sub,
    /// Integer add immediate.
    Addi,
    /// Double-precision add.
    AddD,
    /// Double-precision subtract.
    SubD,
    /// Double-precision multiply.
    MultD,
    /// Load word.
    Ld,
    /// Store word.
    Sd,
    /// Branch if equal.
    Beq,
    /// Branch if not equal.
    Bne,
    /// No operation.
    Nop,
}

impl Opcode {
    /// Every opcode, in table order.
    pub const ALL: [Self; 11] = [
        Self::Add,
        Self::Sub,
        Self::Addi,
        Self::AddD,
        Self::SubD,
        Self::MultD,
        Self::Ld,
        Self::Sd,
        Self::Beq,
        Self::Bne,
        Self::Nop,
    ];

    /// Canonical assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Sub => "Sub",
            Self::Addi => "Addi",
            Self::AddD => "Add.d",
            Self::SubD => "Sub.d",
            Self::MultD => "Mult.d",
            Self::Ld => "Ld",
            Self::Sd => "Sd",
            Self::Beq => "Beq",
            Self::Bne => "Bne",
            Self::Nop => "Nop",
        }
    }

    /// Looks up an opcode by mnemonic, ignoring case.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
    }

    /// Static opcode to unit routing table.
    pub const fn route(self) -> Route {
        match self {
            Self::Add | Self::Sub | Self::Addi | Self::Beq | Self::Bne => {
                Route::Unit(UnitKind::IntAdder)
            }
            Self::AddD | Self::SubD => Route::Unit(UnitKind::FpAdder),
            Self::MultD => Route::Unit(UnitKind::FpMultiplier),
            Self::Ld | Self::Sd => Route::Lsq,
            Self::Nop => Route::None,
        }
    }

    /// Returns true for conditional branches.
    #[inline]
    pub const fn is_branch(self) -> bool {
        matches!(self, Self::Beq | Self::Bne)
    }

    /// Returns true if the opcode produces a register result.
    #[inline]
    pub const fn writes_register(self) -> bool {
        !matches!(self, Self::Sd | Self::Beq | Self::Bne | Self::Nop)
    }

    /// Decides a branch outcome from the difference `rs - rt`.
    ///
    /// Returns `None` for non-branch opcodes.
    pub const fn branch_taken(self, difference: i64) -> Option<bool> {
        match self {
            Self::Beq => Some(difference == 0),
            Self::Bne => Some(difference != 0),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction.
///
/// Operand placement by opcode:
/// - register ops: `dest = Rd`, `src1 = Rs`, `src2 = Rt`
/// - `Addi`: `dest = Rt`, `src1 = Rs`, `imm`
/// - `Ld`: `dest = Xt`, `src1 = base`, `imm = displacement`
/// - `Sd`: `src1 = base`, `src2 = data`, `imm = displacement`
/// - branches: `src1 = Rs`, `src2 = Rt`, `imm = offset in instructions`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Operation.
    pub opcode: Opcode,
    /// Destination register, for result-producing opcodes.
    pub dest: Option<ArchReg>,
    /// First source register.
    pub src1: Option<ArchReg>,
    /// Second source register.
    pub src2: Option<ArchReg>,
    /// Immediate, displacement or branch offset.
    pub imm: i64,
    /// Byte address of the instruction.
    pub pc: u64,
}

impl Instruction {
    /// A no-op at the given address.
    pub const fn nop(pc: u64) -> Self {
        Self {
            opcode: Opcode::Nop,
            dest: None,
            src1: None,
            src2: None,
            imm: 0,
            pc,
        }
    }

    /// Returns a copy relocated to `pc`.
    #[must_use]
    pub const fn at(mut self, pc: u64) -> Self {
        self.pc = pc;
        self
    }

    /// Address of the next sequential instruction.
    #[inline]
    pub const fn fall_through(&self) -> u64 {
        self.pc.wrapping_add(INSTRUCTION_BYTES)
    }

    /// Address reached when a branch is taken.
    ///
    /// Offsets count instructions relative to the fall-through address.
    pub const fn branch_target(&self) -> u64 {
        self.fall_through()
            .wrapping_add_signed(self.imm.wrapping_mul(INSTRUCTION_BYTES as i64))
    }

    /// Destination register, excluding the discarded `R0`.
    pub fn renamed_dest(&self) -> Option<ArchReg> {
        self.dest.filter(|reg| !reg.is_zero())
    }

    /// Every register the instruction names.
    pub fn registers(&self) -> impl Iterator<Item = ArchReg> {
        [self.dest, self.src1, self.src2].into_iter().flatten()
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::nop(0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode;
        let reg = |r: Option<ArchReg>| r.map_or_else(|| "?".to_string(), |r| r.to_string());
        match op {
            Opcode::Nop => write!(f, "{op}"),
            Opcode::Addi => write!(
                f,
                "{op} {}, {}, #{}",
                reg(self.dest),
                reg(self.src1),
                self.imm
            ),
            Opcode::Ld => write!(f, "{op} {}, {}({})", reg(self.dest), self.imm, reg(self.src1)),
            Opcode::Sd => write!(f, "{op} {}, {}({})", reg(self.src2), self.imm, reg(self.src1)),
            Opcode::Beq | Opcode::Bne => write!(
                f,
                "{op} {}, {}, {}",
                reg(self.src1),
                reg(self.src2),
                self.imm
            ),
            Opcode::Add | Opcode::Sub | Opcode::AddD | Opcode::SubD | Opcode::MultD => write!(
                f,
                "{op} {}, {}, {}",
                reg(self.dest),
                reg(self.src1),
                reg(self.src2)
            ),
        }
    }
}
