//! Golden ALU model for the SM83.
//!
//! Every arithmetic expectation in the conformance suite comes from here, and
//! the reference core executes through the same functions.

#![allow(clippy::verbose_bit_mask)] // Clearer to read mask comparisons.

use std::fmt;

use crate::flags::{CF, Flags, HF, NF, ZF};

/// The eight accumulator operations selected by bits 5..3 of `ALU A,r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    /// In encoding order.
    pub const ALL: [Self; 8] = [
        Self::Add,
        Self::Adc,
        Self::Sub,
        Self::Sbc,
        Self::And,
        Self::Xor,
        Self::Or,
        Self::Cp,
    ];

    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 7) as usize]
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Adc => "ADC",
            Self::Sub => "SUB",
            Self::Sbc => "SBC",
            Self::And => "AND",
            Self::Xor => "XOR",
            Self::Or => "OR",
            Self::Cp => "CP",
        }
    }

    /// Whether the carry flag feeds the operation.
    #[must_use]
    pub const fn uses_carry(self) -> bool {
        matches!(self, Self::Adc | Self::Sbc)
    }

    /// CP only sets flags.
    #[must_use]
    pub const fn writes_accumulator(self) -> bool {
        !matches!(self, Self::Cp)
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Result of an 8-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    pub result: u8,
    pub flags: Flags,
}

/// Result of a 16-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alu16Output {
    pub result: u16,
    pub flags: Flags,
}

/// Evaluate one accumulator operation.
///
/// `carry_in` only matters for ADC and SBC. For CP the result is `a`
/// unchanged and the flags are those of SUB.
#[must_use]
pub fn compute(op: AluOp, a: u8, b: u8, carry_in: bool) -> AluOutput {
    match op {
        AluOp::Add => add8(a, b, false),
        AluOp::Adc => add8(a, b, carry_in),
        AluOp::Sub => sub8(a, b, false),
        AluOp::Sbc => sub8(a, b, carry_in),
        AluOp::And => logic(a & b, HF),
        AluOp::Xor => logic(a ^ b, 0),
        AluOp::Or => logic(a | b, 0),
        AluOp::Cp => AluOutput {
            result: a,
            flags: sub8(a, b, false).flags,
        },
    }
}

fn add8(a: u8, b: u8, carry: bool) -> AluOutput {
    let c = u8::from(carry);
    let result16 = u16::from(a) + u16::from(b) + u16::from(c);
    let result = result16 as u8;

    let mut flags = Flags::NONE;
    flags.set_if(ZF, result == 0);
    flags.set_if(HF, (a & 0x0F) + (b & 0x0F) + c > 0x0F);
    flags.set_if(CF, result16 > 0xFF);

    AluOutput { result, flags }
}

fn sub8(a: u8, b: u8, carry: bool) -> AluOutput {
    let c = u8::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = Flags::from_nibble(NF);
    flags.set_if(ZF, result == 0);
    // Borrow from bit 4
    flags.set_if(HF, (a & 0x0F) < (b & 0x0F) + c);
    flags.set_if(CF, u16::from(a) < u16::from(b) + u16::from(c));

    AluOutput { result, flags }
}

fn logic(result: u8, base: u8) -> AluOutput {
    let mut flags = Flags::from_nibble(base);
    flags.set_if(ZF, result == 0);
    AluOutput { result, flags }
}

/// INC r. Carry is carried over from `flags`.
#[must_use]
pub fn inc8(value: u8, flags: Flags) -> AluOutput {
    let result = value.wrapping_add(1);
    let flags = flags
        .with(ZF, result == 0)
        .with(NF, false)
        .with(HF, value & 0x0F == 0x0F);
    AluOutput { result, flags }
}

/// DEC r. Carry is carried over from `flags`.
#[must_use]
pub fn dec8(value: u8, flags: Flags) -> AluOutput {
    let result = value.wrapping_sub(1);
    let flags = flags
        .with(ZF, result == 0)
        .with(NF, true)
        .with(HF, value & 0x0F == 0);
    AluOutput { result, flags }
}

/// ADD HL,rr. Z is carried over; H from bit 11, C from bit 15.
#[must_use]
pub fn add16(hl: u16, rr: u16, flags: Flags) -> Alu16Output {
    let (result, carry) = hl.overflowing_add(rr);
    let flags = flags
        .with(NF, false)
        .with(HF, (hl & 0x0FFF) + (rr & 0x0FFF) > 0x0FFF)
        .with(CF, carry);
    Alu16Output { result, flags }
}

/// SP plus a signed offset, shared by `ADD SP,e` and `LD HL,SP+e`.
///
/// H and C come from the unsigned low-byte addition; Z and N are cleared.
#[must_use]
pub fn add_sp_e(sp: u16, offset: i8) -> Alu16Output {
    let e = offset as u8;
    let low = sp as u8;
    let result = sp.wrapping_add(offset as i16 as u16);

    let mut flags = Flags::NONE;
    flags.set_if(HF, (low & 0x0F) + (e & 0x0F) > 0x0F);
    flags.set_if(CF, u16::from(low) + u16::from(e) > 0xFF);

    Alu16Output { result, flags }
}

/// Accumulator rotates selected by bits 5..3 of `00yyy111`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotateOp {
    Rlca,
    Rrca,
    Rla,
    Rra,
}

impl RotateOp {
    pub const ALL: [Self; 4] = [Self::Rlca, Self::Rrca, Self::Rla, Self::Rra];

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Rlca => "RLCA",
            Self::Rrca => "RRCA",
            Self::Rla => "RLA",
            Self::Rra => "RRA",
        }
    }
}

/// Rotate the accumulator. Z, N and H are cleared; C takes the evicted bit.
#[must_use]
pub fn rotate(op: RotateOp, a: u8, flags: Flags) -> AluOutput {
    let carry_in = u8::from(flags.carry());
    let (result, carry_out) = match op {
        RotateOp::Rlca => (a.rotate_left(1), a & 0x80 != 0),
        RotateOp::Rrca => (a.rotate_right(1), a & 0x01 != 0),
        RotateOp::Rla => ((a << 1) | carry_in, a & 0x80 != 0),
        RotateOp::Rra => ((a >> 1) | (carry_in << 7), a & 0x01 != 0),
    };
    AluOutput {
        result,
        flags: Flags::NONE.with(CF, carry_out),
    }
}

/// Decimal adjust after an addition or subtraction, steered by N, H and C.
#[must_use]
pub fn daa(a: u8, flags: Flags) -> AluOutput {
    let mut adjust = 0u8;
    let mut carry = flags.carry();

    let result = if flags.subtract() {
        if flags.carry() {
            adjust |= 0x60;
        }
        if flags.half_carry() {
            adjust |= 0x06;
        }
        a.wrapping_sub(adjust)
    } else {
        if flags.carry() || a > 0x99 {
            adjust |= 0x60;
            carry = true;
        }
        if flags.half_carry() || a & 0x0F > 0x09 {
            adjust |= 0x06;
        }
        a.wrapping_add(adjust)
    };

    let flags = flags
        .with(ZF, result == 0)
        .with(HF, false)
        .with(CF, carry);
    AluOutput { result, flags }
}

/// Complement the accumulator. N and H are set; Z and C are kept.
#[must_use]
pub fn cpl(a: u8, flags: Flags) -> AluOutput {
    AluOutput {
        result: !a,
        flags: flags.with(NF, true).with(HF, true),
    }
}

/// Set carry. Z is kept.
#[must_use]
pub const fn scf(flags: Flags) -> Flags {
    flags.with(NF, false).with(HF, false).with(CF, true)
}

/// Complement carry. Z is kept.
#[must_use]
pub const fn ccf(flags: Flags) -> Flags {
    flags.with(NF, false).with(HF, false).with(CF, !flags.carry())
}
