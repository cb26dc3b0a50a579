//! Decoded instruction model.

use std::fmt;

use crate::alu::{AluOp, RotateOp};
use crate::encode::ClassId;
use crate::flags::Flags;
use crate::registers::{RegGroup, register_field};

/// Branch condition in bits 4..3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    Nz,
    Z,
    Nc,
    C,
}

impl Cond {
    pub const ALL: [Self; 4] = [Self::Nz, Self::Z, Self::Nc, Self::C];

    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 3) as usize]
    }

    #[must_use]
    pub const fn holds(self, flags: Flags) -> bool {
        match self {
            Self::Nz => !flags.zero(),
            Self::Z => flags.zero(),
            Self::Nc => !flags.carry(),
            Self::C => flags.carry(),
        }
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Nz => "NZ",
            Self::Z => "Z",
            Self::Nc => "NC",
            Self::C => "C",
        }
    }
}

/// Address source of `LD (pp),A` / `LD A,(pp)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pointer {
    Bc,
    De,
    HlInc,
    HlDec,
}

impl Pointer {
    pub const ALL: [Self; 4] = [Self::Bc, Self::De, Self::HlInc, Self::HlDec];

    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 3) as usize]
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Bc => "(BC)",
            Self::De => "(DE)",
            Self::HlInc => "(HL+)",
            Self::HlDec => "(HL-)",
        }
    }
}

/// Operand addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Register,
    /// Through HL, BC or DE.
    Indirect,
    Immediate8,
    Immediate16,
    /// Signed 8-bit displacement.
    Relative,
    /// `0xFF00 + n` or `0xFF00 + C`.
    HighPage,
    Absolute,
    Stack,
}

/// Decoded operation. 8-bit operands are 3-bit field indices into the
/// register-field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    Stop,
    Halt,
    Di,
    Ei,
    /// `CB` page prefix.
    Prefix,
    Illegal,
    LdRR { dst: u8, src: u8 },
    LdRImm { dst: u8 },
    LdRrImm { group: RegGroup },
    LdPtrA { ptr: Pointer },
    LdAPtr { ptr: Pointer },
    LdAbsSp,
    LdAbsA,
    LdAAbs,
    LdhImmA,
    LdhAImm,
    LdhCA,
    LdhAC,
    LdSpHl,
    LdHlSpE,
    Alu { op: AluOp, src: u8 },
    AluImm { op: AluOp },
    Inc { dst: u8 },
    Dec { dst: u8 },
    IncRr { group: RegGroup },
    DecRr { group: RegGroup },
    AddHl { group: RegGroup },
    AddSpE,
    Rotate(RotateOp),
    Daa,
    Cpl,
    Scf,
    Ccf,
    Jr { cond: Option<Cond> },
    Jp { cond: Option<Cond> },
    JpHl,
    Call { cond: Option<Cond> },
    Ret { cond: Option<Cond> },
    Reti,
    Rst { vector: u8 },
    Push { group: RegGroup },
    Pop { group: RegGroup },
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = |index: u8| register_field(index).symbol;
        let cc = |cond: Option<Cond>| cond.map_or(String::new(), |c| format!("{},", c.mnemonic()));
        match *self {
            Self::Nop => write!(f, "NOP"),
            Self::Stop => write!(f, "STOP"),
            Self::Halt => write!(f, "HALT"),
            Self::Di => write!(f, "DI"),
            Self::Ei => write!(f, "EI"),
            Self::Prefix => write!(f, "PREFIX CB"),
            Self::Illegal => write!(f, "ILLEGAL"),
            Self::LdRR { dst, src } => write!(f, "LD {},{}", r(dst), r(src)),
            Self::LdRImm { dst } => write!(f, "LD {},n", r(dst)),
            Self::LdRrImm { group } => write!(f, "LD {group},nn"),
            Self::LdPtrA { ptr } => write!(f, "LD {},A", ptr.symbol()),
            Self::LdAPtr { ptr } => write!(f, "LD A,{}", ptr.symbol()),
            Self::LdAbsSp => write!(f, "LD (nn),SP"),
            Self::LdAbsA => write!(f, "LD (nn),A"),
            Self::LdAAbs => write!(f, "LD A,(nn)"),
            Self::LdhImmA => write!(f, "LDH (n),A"),
            Self::LdhAImm => write!(f, "LDH A,(n)"),
            Self::LdhCA => write!(f, "LDH (C),A"),
            Self::LdhAC => write!(f, "LDH A,(C)"),
            Self::LdSpHl => write!(f, "LD SP,HL"),
            Self::LdHlSpE => write!(f, "LD HL,SP+e"),
            Self::Alu { op, src } => write!(f, "{op} A,{}", r(src)),
            Self::AluImm { op } => write!(f, "{op} A,n"),
            Self::Inc { dst } => write!(f, "INC {}", r(dst)),
            Self::Dec { dst } => write!(f, "DEC {}", r(dst)),
            Self::IncRr { group } => write!(f, "INC {group}"),
            Self::DecRr { group } => write!(f, "DEC {group}"),
            Self::AddHl { group } => write!(f, "ADD HL,{group}"),
            Self::AddSpE => write!(f, "ADD SP,e"),
            Self::Rotate(op) => write!(f, "{}", op.mnemonic()),
            Self::Daa => write!(f, "DAA"),
            Self::Cpl => write!(f, "CPL"),
            Self::Scf => write!(f, "SCF"),
            Self::Ccf => write!(f, "CCF"),
            Self::Jr { cond } => write!(f, "JR {}e", cc(cond)),
            Self::Jp { cond } => write!(f, "JP {}nn", cc(cond)),
            Self::JpHl => write!(f, "JP HL"),
            Self::Call { cond } => write!(f, "CALL {}nn", cc(cond)),
            Self::Ret { cond: None } => write!(f, "RET"),
            Self::Ret { cond: Some(c) } => write!(f, "RET {}", c.mnemonic()),
            Self::Reti => write!(f, "RETI"),
            Self::Rst { vector } => write!(f, "RST {vector:02X}h"),
            Self::Push { group } => write!(f, "PUSH {group}"),
            Self::Pop { group } => write!(f, "POP {group}"),
        }
    }
}

/// One entry of the 256-slot opcode map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub class: ClassId,
    /// Primary operand field (row, pair, condition or list index).
    pub primary: u8,
    /// Secondary operand field (column of two-field classes).
    pub secondary: u8,
    pub op: Op,
    /// Length in bytes including the opcode.
    pub length: u8,
    /// M-cycles when a conditional branch is not taken, or always otherwise.
    pub cycles: u8,
    /// M-cycles when a conditional branch is taken.
    pub cycles_taken: u8,
    pub mode: AddressingMode,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {}", self.opcode, self.op)
    }
}
