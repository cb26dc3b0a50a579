//! SM83 register set and operand-field tables.

use std::fmt;

use crate::flags::Flags;

/// 16-bit register group, as reached through the register backdoor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum RegGroup {
    Af,
    Bc,
    De,
    Hl,
    Sp,
    Pc,
}

impl RegGroup {
    pub const ALL: [Self; 6] = [Self::Af, Self::Bc, Self::De, Self::Hl, Self::Sp, Self::Pc];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Af => "AF",
            Self::Bc => "BC",
            Self::De => "DE",
            Self::Hl => "HL",
            Self::Sp => "SP",
            Self::Pc => "PC",
        }
    }
}

impl fmt::Display for RegGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a 3-bit operand field reaches its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    /// Byte `shift..shift+8` of a register group.
    Register { group: RegGroup, shift: u8 },
    /// Memory byte addressed by HL.
    Indirect,
}

/// One entry of the 3-bit register-field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterField {
    pub symbol: &'static str,
    pub encoding: FieldEncoding,
}

impl RegisterField {
    #[must_use]
    pub const fn is_indirect(&self) -> bool {
        matches!(self.encoding, FieldEncoding::Indirect)
    }

    /// Lower-case symbol used in case names (`(HL)` becomes `hl_ind`).
    #[must_use]
    pub const fn case_symbol(&self) -> &'static str {
        match self.encoding {
            FieldEncoding::Indirect => "hl_ind",
            FieldEncoding::Register { group, shift } => match (group, shift) {
                (RegGroup::Af, _) => "a",
                (RegGroup::Bc, 8) => "b",
                (RegGroup::Bc, _) => "c",
                (RegGroup::De, 8) => "d",
                (RegGroup::De, _) => "e",
                (RegGroup::Hl, 8) => "h",
                (RegGroup::Hl, _) => "l",
                (RegGroup::Sp, _) => "sp",
                (RegGroup::Pc, _) => "pc",
            },
        }
    }
}

const fn reg(symbol: &'static str, group: RegGroup, shift: u8) -> RegisterField {
    RegisterField {
        symbol,
        encoding: FieldEncoding::Register { group, shift },
    }
}

/// Field index of `(HL)`.
pub const HL_INDIRECT: u8 = 6;

/// Operand field table, indexed by the 3-bit field value.
pub const REGISTER_FIELDS: [RegisterField; 8] = [
    reg("B", RegGroup::Bc, 8),
    reg("C", RegGroup::Bc, 0),
    reg("D", RegGroup::De, 8),
    reg("E", RegGroup::De, 0),
    reg("H", RegGroup::Hl, 8),
    reg("L", RegGroup::Hl, 0),
    RegisterField {
        symbol: "(HL)",
        encoding: FieldEncoding::Indirect,
    },
    reg("A", RegGroup::Af, 8),
];

/// Look up a 3-bit operand field. Only the low three bits are used.
#[must_use]
pub const fn register_field(index: u8) -> &'static RegisterField {
    &REGISTER_FIELDS[(index & 7) as usize]
}

/// 16-bit operand set for `LD rr,nn`, `INC rr`, `DEC rr`, `ADD HL,rr`.
pub const REG16_GROUPS: [RegGroup; 4] = [RegGroup::Bc, RegGroup::De, RegGroup::Hl, RegGroup::Sp];

/// 16-bit operand set for `PUSH`/`POP`.
pub const STACK_GROUPS: [RegGroup; 4] = [RegGroup::Bc, RegGroup::De, RegGroup::Hl, RegGroup::Af];

/// SM83 registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    /// Flags in bits 7..4. The low nibble always reads as zero.
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    /// Set AF. The low nibble of F is forced to zero.
    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8 & 0xF0;
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    #[must_use]
    pub const fn flags(&self) -> Flags {
        Flags::from_f(self.f)
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.f = flags.to_f();
    }

    #[must_use]
    pub const fn group(&self, group: RegGroup) -> u16 {
        match group {
            RegGroup::Af => self.af(),
            RegGroup::Bc => self.bc(),
            RegGroup::De => self.de(),
            RegGroup::Hl => self.hl(),
            RegGroup::Sp => self.sp,
            RegGroup::Pc => self.pc,
        }
    }

    pub fn set_group(&mut self, group: RegGroup, value: u16) {
        match group {
            RegGroup::Af => self.set_af(value),
            RegGroup::Bc => self.set_bc(value),
            RegGroup::De => self.set_de(value),
            RegGroup::Hl => self.set_hl(value),
            RegGroup::Sp => self.sp = value,
            RegGroup::Pc => self.pc = value,
        }
    }

    /// Read an 8-bit register by field index. `(HL)` is not a register and
    /// reads as `None`.
    #[must_use]
    pub const fn get8(&self, field: u8) -> Option<u8> {
        match field & 7 {
            0 => Some(self.b),
            1 => Some(self.c),
            2 => Some(self.d),
            3 => Some(self.e),
            4 => Some(self.h),
            5 => Some(self.l),
            7 => Some(self.a),
            _ => None,
        }
    }

    /// Write an 8-bit register by field index. Writes to `(HL)` are ignored.
    pub fn set8(&mut self, field: u8, value: u8) {
        match field & 7 {
            0 => self.b = value,
            1 => self.c = value,
            2 => self.d = value,
            3 => self.e = value,
            4 => self.h = value,
            5 => self.l = value,
            7 => self.a = value,
            _ => {}
        }
    }
}
