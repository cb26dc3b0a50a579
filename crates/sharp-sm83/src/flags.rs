//! SM83 flag nibble.
//!
//! The four architectural flags live in bits 7..4 of F. Everywhere else in
//! the model they travel as a nibble, Z in bit 3 down to C in bit 0, which
//! is also how conformance checks compare them.

use std::fmt;

/// Zero flag (nibble bit 3) - set if the result is zero.
pub const ZF: u8 = 0b1000;

/// Subtract flag (nibble bit 2) - set by subtract-type operations.
pub const NF: u8 = 0b0100;

/// Half-carry flag (nibble bit 1) - carry/borrow across bit 3.
pub const HF: u8 = 0b0010;

/// Carry flag (nibble bit 0) - carry/borrow out of bit 7.
pub const CF: u8 = 0b0001;

/// Flag nibble.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Self = Self(0);

    /// Build from a nibble. Bits above 3 are dropped.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Self {
        Self(nibble & 0x0F)
    }

    /// Build from the F register (flags in bits 7..4).
    #[must_use]
    pub const fn from_f(f: u8) -> Self {
        Self(f >> 4)
    }

    #[must_use]
    pub const fn nibble(self) -> u8 {
        self.0
    }

    /// F register image: flags in bits 7..4, low nibble zero.
    #[must_use]
    pub const fn to_f(self) -> u8 {
        self.0 << 4
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[must_use]
    pub const fn zero(self) -> bool {
        self.is_set(ZF)
    }

    #[must_use]
    pub const fn subtract(self) -> bool {
        self.is_set(NF)
    }

    #[must_use]
    pub const fn half_carry(self) -> bool {
        self.is_set(HF)
    }

    #[must_use]
    pub const fn carry(self) -> bool {
        self.is_set(CF)
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Copy of `self` with `flag` forced to `condition`.
    #[must_use]
    pub const fn with(self, flag: u8, condition: bool) -> Self {
        if condition {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }
}

impl fmt::Display for Flags {
    /// Per-bit rendering, e.g. `Z1 N0 H1 C0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Z{} N{} H{} C{}",
            u8::from(self.zero()),
            u8::from(self.subtract()),
            u8::from(self.half_carry()),
            u8::from(self.carry())
        )
    }
}
