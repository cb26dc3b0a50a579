//! Opcode encoder and the 256-slot opcode map.
//!
//! Every unprefixed opcode belongs to exactly one [`OpcodeClass`]: a base
//! bit pattern plus a layout saying where the operand fields go. Case
//! synthesis encodes through this table, and the reference core decodes
//! through the [`OpcodeMap`] built from it, so the two can never disagree.

use std::fmt;

use crate::alu::{AluOp, RotateOp};
use crate::instruction::{AddressingMode, Cond, Instruction, Op, Pointer};
use crate::registers::{HL_INDIRECT, REG16_GROUPS, STACK_GROUPS};

/// Instruction class identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassId {
    Nop,
    LdRrImm,
    LdPtrA,
    IncRr,
    IncR,
    DecR,
    LdRImm,
    /// RLCA, RRCA, RLA, RRA, DAA, CPL, SCF, CCF.
    AccMisc,
    LdAbsSp,
    AddHl,
    LdAPtr,
    DecRr,
    Stop,
    Jr,
    JrCond,
    LdRR,
    Halt,
    Alu,
    RetCond,
    Pop,
    JpCond,
    Jp,
    CallCond,
    Push,
    AluImm,
    Rst,
    Ret,
    Prefix,
    Call,
    Reti,
    LdhImmA,
    LdhCA,
    AddSpE,
    JpHl,
    LdAbsA,
    LdhAImm,
    LdhAC,
    Di,
    LdHlSpE,
    LdSpHl,
    LdAAbs,
    Ei,
    Illegal,
}

/// Where a class puts its operand fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No operands.
    Fixed,
    /// One 3-bit field at bits 5..3.
    Row,
    /// One 2-bit register-pair field at bits 5..4.
    Pair,
    /// One 2-bit condition field at bits 4..3.
    Cond,
    /// Row field (bits 5..3) and column field (bits 2..0).
    RowColumn,
    /// Irregular opcodes listed explicitly; the operand is the list index.
    Listed(&'static [u8]),
}

/// Base pattern and field layout of one instruction class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeClass {
    pub id: ClassId,
    pub name: &'static str,
    pub base: u8,
    pub layout: Layout,
    /// Operand combinations owned by another class.
    pub excluded: &'static [(u8, u8)],
}

impl OpcodeClass {
    const fn new(id: ClassId, name: &'static str, base: u8, layout: Layout) -> Self {
        Self {
            id,
            name,
            base,
            layout,
            excluded: &[],
        }
    }

    /// Every `(primary, secondary)` operand pair this class encodes.
    #[must_use]
    pub fn operand_space(&self) -> Vec<(u8, u8)> {
        let pairs: Vec<(u8, u8)> = match self.layout {
            Layout::Fixed => vec![(0, 0)],
            Layout::Row => (0..8).map(|p| (p, 0)).collect(),
            Layout::Pair | Layout::Cond => (0..4).map(|p| (p, 0)).collect(),
            Layout::RowColumn => (0..8).flat_map(|p| (0..8).map(move |s| (p, s))).collect(),
            Layout::Listed(list) => (0..list.len() as u8).map(|p| (p, 0)).collect(),
        };
        pairs
            .into_iter()
            .filter(|pair| !self.excluded.contains(pair))
            .collect()
    }
}

impl fmt::Display for OpcodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const ILLEGAL_OPCODES: &[u8] = &[
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

/// All unprefixed instruction classes.
pub const CLASSES: &[OpcodeClass] = &[
    OpcodeClass::new(ClassId::Nop, "NOP", 0x00, Layout::Fixed),
    OpcodeClass::new(ClassId::LdRrImm, "LD rr,nn", 0x01, Layout::Pair),
    OpcodeClass::new(ClassId::LdPtrA, "LD (pp),A", 0x02, Layout::Pair),
    OpcodeClass::new(ClassId::IncRr, "INC rr", 0x03, Layout::Pair),
    OpcodeClass::new(ClassId::IncR, "INC r", 0x04, Layout::Row),
    OpcodeClass::new(ClassId::DecR, "DEC r", 0x05, Layout::Row),
    OpcodeClass::new(ClassId::LdRImm, "LD r,n", 0x06, Layout::Row),
    OpcodeClass::new(ClassId::AccMisc, "accumulator misc", 0x07, Layout::Row),
    OpcodeClass::new(ClassId::LdAbsSp, "LD (nn),SP", 0x08, Layout::Fixed),
    OpcodeClass::new(ClassId::AddHl, "ADD HL,rr", 0x09, Layout::Pair),
    OpcodeClass::new(ClassId::LdAPtr, "LD A,(pp)", 0x0A, Layout::Pair),
    OpcodeClass::new(ClassId::DecRr, "DEC rr", 0x0B, Layout::Pair),
    OpcodeClass::new(ClassId::Stop, "STOP", 0x10, Layout::Fixed),
    OpcodeClass::new(ClassId::Jr, "JR e", 0x18, Layout::Fixed),
    OpcodeClass::new(ClassId::JrCond, "JR cc,e", 0x20, Layout::Cond),
    OpcodeClass {
        excluded: &[(HL_INDIRECT, HL_INDIRECT)],
        ..OpcodeClass::new(ClassId::LdRR, "LD r,r'", 0x40, Layout::RowColumn)
    },
    OpcodeClass::new(ClassId::Halt, "HALT", 0x76, Layout::Fixed),
    OpcodeClass::new(ClassId::Alu, "ALU A,r", 0x80, Layout::RowColumn),
    OpcodeClass::new(ClassId::RetCond, "RET cc", 0xC0, Layout::Cond),
    OpcodeClass::new(ClassId::Pop, "POP qq", 0xC1, Layout::Pair),
    OpcodeClass::new(ClassId::JpCond, "JP cc,nn", 0xC2, Layout::Cond),
    OpcodeClass::new(ClassId::Jp, "JP nn", 0xC3, Layout::Fixed),
    OpcodeClass::new(ClassId::CallCond, "CALL cc,nn", 0xC4, Layout::Cond),
    OpcodeClass::new(ClassId::Push, "PUSH qq", 0xC5, Layout::Pair),
    OpcodeClass::new(ClassId::AluImm, "ALU A,n", 0xC6, Layout::Row),
    OpcodeClass::new(ClassId::Rst, "RST", 0xC7, Layout::Row),
    OpcodeClass::new(ClassId::Ret, "RET", 0xC9, Layout::Fixed),
    OpcodeClass::new(ClassId::Prefix, "PREFIX CB", 0xCB, Layout::Fixed),
    OpcodeClass::new(ClassId::Call, "CALL nn", 0xCD, Layout::Fixed),
    OpcodeClass::new(ClassId::Reti, "RETI", 0xD9, Layout::Fixed),
    OpcodeClass::new(ClassId::LdhImmA, "LDH (n),A", 0xE0, Layout::Fixed),
    OpcodeClass::new(ClassId::LdhCA, "LDH (C),A", 0xE2, Layout::Fixed),
    OpcodeClass::new(ClassId::AddSpE, "ADD SP,e", 0xE8, Layout::Fixed),
    OpcodeClass::new(ClassId::JpHl, "JP HL", 0xE9, Layout::Fixed),
    OpcodeClass::new(ClassId::LdAbsA, "LD (nn),A", 0xEA, Layout::Fixed),
    OpcodeClass::new(ClassId::LdhAImm, "LDH A,(n)", 0xF0, Layout::Fixed),
    OpcodeClass::new(ClassId::LdhAC, "LDH A,(C)", 0xF2, Layout::Fixed),
    OpcodeClass::new(ClassId::Di, "DI", 0xF3, Layout::Fixed),
    OpcodeClass::new(ClassId::LdHlSpE, "LD HL,SP+e", 0xF8, Layout::Fixed),
    OpcodeClass::new(ClassId::LdSpHl, "LD SP,HL", 0xF9, Layout::Fixed),
    OpcodeClass::new(ClassId::LdAAbs, "LD A,(nn)", 0xFA, Layout::Fixed),
    OpcodeClass::new(ClassId::Ei, "EI", 0xFB, Layout::Fixed),
    OpcodeClass::new(ClassId::Illegal, "illegal", 0x00, Layout::Listed(ILLEGAL_OPCODES)),
];

/// Encoding table defects. Any of these is fatal before simulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("{class}: operand {value} does not fit a {bits}-bit field")]
    FieldOverflow {
        class: &'static str,
        value: u8,
        bits: u8,
    },
    #[error("{class}: operands ({primary}, {secondary}) belong to another class")]
    Excluded {
        class: &'static str,
        primary: u8,
        secondary: u8,
    },
    #[error("{class}: no class registered")]
    UnknownClass { class: String },
    #[error("opcode {opcode:#04X} claimed by both {first} and {second}")]
    Collision {
        opcode: u8,
        first: &'static str,
        second: &'static str,
    },
    #[error("opcode {opcode:#04X} is not claimed by any class")]
    Gap { opcode: u8 },
}

fn field(class: &OpcodeClass, value: u8, bits: u8) -> Result<u8, EncodingError> {
    if u16::from(value) >> bits != 0 {
        return Err(EncodingError::FieldOverflow {
            class: class.name,
            value,
            bits,
        });
    }
    Ok(value)
}

/// Pack operand fields onto a class's base pattern.
pub fn encode(class: &OpcodeClass, primary: u8, secondary: u8) -> Result<u8, EncodingError> {
    if class.excluded.contains(&(primary, secondary)) {
        return Err(EncodingError::Excluded {
            class: class.name,
            primary,
            secondary,
        });
    }
    let byte = match class.layout {
        Layout::Fixed => {
            field(class, primary, 0)?;
            field(class, secondary, 0)?;
            class.base
        }
        Layout::Row => {
            field(class, secondary, 0)?;
            class.base | field(class, primary, 3)? << 3
        }
        Layout::Pair => {
            field(class, secondary, 0)?;
            class.base | field(class, primary, 2)? << 4
        }
        Layout::Cond => {
            field(class, secondary, 0)?;
            class.base | field(class, primary, 2)? << 3
        }
        Layout::RowColumn => {
            class.base | field(class, primary, 3)? << 3 | field(class, secondary, 3)?
        }
        Layout::Listed(list) => {
            field(class, secondary, 0)?;
            match list.get(usize::from(primary)) {
                Some(&byte) => byte,
                None => {
                    return Err(EncodingError::FieldOverflow {
                        class: class.name,
                        value: primary,
                        bits: list.len().next_power_of_two().trailing_zeros() as u8,
                    });
                }
            }
        }
    };
    Ok(byte)
}

/// Look up a class by identifier.
#[must_use]
pub fn class(id: ClassId) -> Option<&'static OpcodeClass> {
    CLASSES.iter().find(|class| class.id == id)
}

/// Encode by class identifier.
pub fn opcode(id: ClassId, primary: u8, secondary: u8) -> Result<u8, EncodingError> {
    let class = class(id).ok_or_else(|| EncodingError::UnknownClass {
        class: format!("{id:?}"),
    })?;
    encode(class, primary, secondary)
}

fn decode_op(id: ClassId, primary: u8, secondary: u8) -> Op {
    let pair = usize::from(primary & 3);
    match id {
        ClassId::Nop => Op::Nop,
        ClassId::LdRrImm => Op::LdRrImm {
            group: REG16_GROUPS[pair],
        },
        ClassId::LdPtrA => Op::LdPtrA {
            ptr: Pointer::from_index(primary),
        },
        ClassId::IncRr => Op::IncRr {
            group: REG16_GROUPS[pair],
        },
        ClassId::IncR => Op::Inc { dst: primary },
        ClassId::DecR => Op::Dec { dst: primary },
        ClassId::LdRImm => Op::LdRImm { dst: primary },
        ClassId::AccMisc => match primary {
            0..=3 => Op::Rotate(RotateOp::ALL[usize::from(primary)]),
            4 => Op::Daa,
            5 => Op::Cpl,
            6 => Op::Scf,
            _ => Op::Ccf,
        },
        ClassId::LdAbsSp => Op::LdAbsSp,
        ClassId::AddHl => Op::AddHl {
            group: REG16_GROUPS[pair],
        },
        ClassId::LdAPtr => Op::LdAPtr {
            ptr: Pointer::from_index(primary),
        },
        ClassId::DecRr => Op::DecRr {
            group: REG16_GROUPS[pair],
        },
        ClassId::Stop => Op::Stop,
        ClassId::Jr => Op::Jr { cond: None },
        ClassId::JrCond => Op::Jr {
            cond: Some(Cond::from_index(primary)),
        },
        ClassId::LdRR => Op::LdRR {
            dst: primary,
            src: secondary,
        },
        ClassId::Halt => Op::Halt,
        ClassId::Alu => Op::Alu {
            op: AluOp::from_index(primary),
            src: secondary,
        },
        ClassId::RetCond => Op::Ret {
            cond: Some(Cond::from_index(primary)),
        },
        ClassId::Pop => Op::Pop {
            group: STACK_GROUPS[pair],
        },
        ClassId::JpCond => Op::Jp {
            cond: Some(Cond::from_index(primary)),
        },
        ClassId::Jp => Op::Jp { cond: None },
        ClassId::CallCond => Op::Call {
            cond: Some(Cond::from_index(primary)),
        },
        ClassId::Push => Op::Push {
            group: STACK_GROUPS[pair],
        },
        ClassId::AluImm => Op::AluImm {
            op: AluOp::from_index(primary),
        },
        ClassId::Rst => Op::Rst {
            vector: (primary & 7) << 3,
        },
        ClassId::Ret => Op::Ret { cond: None },
        ClassId::Prefix => Op::Prefix,
        ClassId::Call => Op::Call { cond: None },
        ClassId::Reti => Op::Reti,
        ClassId::LdhImmA => Op::LdhImmA,
        ClassId::LdhCA => Op::LdhCA,
        ClassId::AddSpE => Op::AddSpE,
        ClassId::JpHl => Op::JpHl,
        ClassId::LdAbsA => Op::LdAbsA,
        ClassId::LdhAImm => Op::LdhAImm,
        ClassId::LdhAC => Op::LdhAC,
        ClassId::Di => Op::Di,
        ClassId::LdHlSpE => Op::LdHlSpE,
        ClassId::LdSpHl => Op::LdSpHl,
        ClassId::LdAAbs => Op::LdAAbs,
        ClassId::Ei => Op::Ei,
        ClassId::Illegal => Op::Illegal,
    }
}

/// `(length, cycles, cycles_taken, mode)` for a decoded operation.
fn timing(op: Op) -> (u8, u8, u8, AddressingMode) {
    use AddressingMode::{
        Absolute, HighPage, Immediate8, Immediate16, Implied, Indirect, Register, Relative, Stack,
    };

    let hl = |field: u8| field == HL_INDIRECT;
    match op {
        Op::Nop | Op::Halt | Op::Di | Op::Ei | Op::Illegal => (1, 1, 1, Implied),
        Op::Daa | Op::Cpl | Op::Scf | Op::Ccf | Op::Rotate(_) => (1, 1, 1, Implied),
        Op::Stop | Op::Prefix => (2, 2, 2, Implied),
        Op::LdRR { dst, src } if hl(dst) || hl(src) => (1, 2, 2, Indirect),
        Op::LdRR { .. } => (1, 1, 1, Register),
        Op::LdRImm { dst } if hl(dst) => (2, 3, 3, Immediate8),
        Op::LdRImm { .. } => (2, 2, 2, Immediate8),
        Op::LdRrImm { .. } => (3, 3, 3, Immediate16),
        Op::LdPtrA { .. } | Op::LdAPtr { .. } => (1, 2, 2, Indirect),
        Op::LdAbsSp => (3, 5, 5, Absolute),
        Op::LdAbsA | Op::LdAAbs => (3, 4, 4, Absolute),
        Op::LdhImmA | Op::LdhAImm => (2, 3, 3, HighPage),
        Op::LdhCA | Op::LdhAC => (1, 2, 2, HighPage),
        Op::LdSpHl => (1, 2, 2, Register),
        Op::LdHlSpE => (2, 3, 3, Relative),
        Op::Alu { src, .. } if hl(src) => (1, 2, 2, Indirect),
        Op::Alu { .. } => (1, 1, 1, Register),
        Op::AluImm { .. } => (2, 2, 2, Immediate8),
        Op::Inc { dst } | Op::Dec { dst } if hl(dst) => (1, 3, 3, Indirect),
        Op::Inc { .. } | Op::Dec { .. } => (1, 1, 1, Register),
        Op::IncRr { .. } | Op::DecRr { .. } | Op::AddHl { .. } => (1, 2, 2, Register),
        Op::AddSpE => (2, 4, 4, Relative),
        Op::Jr { cond: None } => (2, 3, 3, Relative),
        Op::Jr { cond: Some(_) } => (2, 2, 3, Relative),
        Op::Jp { cond: None } => (3, 4, 4, Absolute),
        Op::Jp { cond: Some(_) } => (3, 3, 4, Absolute),
        Op::JpHl => (1, 1, 1, Register),
        Op::Call { cond: None } => (3, 6, 6, Absolute),
        Op::Call { cond: Some(_) } => (3, 3, 6, Absolute),
        Op::Ret { cond: None } | Op::Reti | Op::Rst { .. } | Op::Push { .. } => (1, 4, 4, Stack),
        Op::Ret { cond: Some(_) } => (1, 2, 5, Stack),
        Op::Pop { .. } => (1, 3, 3, Stack),
    }
}

/// Decoded view of every unprefixed opcode.
#[derive(Debug, Clone)]
pub struct OpcodeMap {
    entries: Vec<Instruction>,
}

impl OpcodeMap {
    /// Run every class over its operand space and fill the 256-slot table.
    ///
    /// Fails on the first opcode claimed twice, or on any opcode left
    /// unclaimed.
    pub fn build() -> Result<Self, EncodingError> {
        Self::from_classes(CLASSES)
    }

    /// Build from an explicit class list.
    pub fn from_classes(classes: &[OpcodeClass]) -> Result<Self, EncodingError> {
        let mut slots: [Option<Instruction>; 256] = [None; 256];
        let mut owners: [Option<&'static str>; 256] = [None; 256];

        for class in classes {
            for (primary, secondary) in class.operand_space() {
                let opcode = encode(class, primary, secondary)?;
                let slot = usize::from(opcode);
                if let Some(first) = owners[slot] {
                    return Err(EncodingError::Collision {
                        opcode,
                        first,
                        second: class.name,
                    });
                }
                let op = decode_op(class.id, primary, secondary);
                let (length, cycles, cycles_taken, mode) = timing(op);
                owners[slot] = Some(class.name);
                slots[slot] = Some(Instruction {
                    opcode,
                    class: class.id,
                    primary,
                    secondary,
                    op,
                    length,
                    cycles,
                    cycles_taken,
                    mode,
                });
            }
        }

        let mut entries = Vec::with_capacity(256);
        for (opcode, slot) in slots.into_iter().enumerate() {
            let instruction = slot.ok_or(EncodingError::Gap {
                opcode: opcode as u8,
            })?;
            entries.push(instruction);
        }
        Ok(Self { entries })
    }

    /// Class, operand fields and timing of an opcode byte.
    #[must_use]
    pub fn decode(&self, opcode: u8) -> &Instruction {
        &self.entries[usize::from(opcode)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_field_overflow_is_rejected() {
        let result = opcode(ClassId::IncR, 8, 0);
        assert!(matches!(
            result,
            Err(EncodingError::FieldOverflow { bits: 3, .. })
        ));
    }

    #[test]
    fn halt_slot_is_excluded_from_loads() {
        assert!(matches!(
            opcode(ClassId::LdRR, HL_INDIRECT, HL_INDIRECT),
            Err(EncodingError::Excluded { .. })
        ));
    }

    #[test]
    fn colliding_classes_are_reported() {
        let mut classes = CLASSES.to_vec();
        classes.push(OpcodeClass::new(ClassId::Nop, "shadow NOP", 0x00, Layout::Fixed));
        assert_eq!(
            OpcodeMap::from_classes(&classes).err(),
            Some(EncodingError::Collision {
                opcode: 0x00,
                first: "NOP",
                second: "shadow NOP",
            })
        );
    }

    #[test]
    fn missing_class_leaves_a_gap() {
        let classes: Vec<OpcodeClass> = CLASSES
            .iter()
            .copied()
            .filter(|class| class.id != ClassId::Halt)
            .collect();
        assert_eq!(
            OpcodeMap::from_classes(&classes).err(),
            Some(EncodingError::Gap { opcode: 0x76 })
        );
    }

    #[test]
    fn known_encodings() {
        assert_eq!(opcode(ClassId::Alu, AluOp::Xor.index(), 7), Ok(0xAF));
        assert_eq!(opcode(ClassId::LdRR, 7, HL_INDIRECT), Ok(0x7E));
        assert_eq!(opcode(ClassId::Push, 3, 0), Ok(0xF5));
        assert_eq!(opcode(ClassId::Rst, 7, 0), Ok(0xFF));
        assert_eq!(opcode(ClassId::JrCond, 3, 0), Ok(0x38));
        assert_eq!(opcode(ClassId::Illegal, 10, 0), Ok(0xFD));
    }
}
