//! Conformance case data model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sharp_sm83::{FieldEncoding, Flags, RegGroup, RegisterField};

/// Where a check reads its actual value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// One byte of a register group.
    Reg8 { group: RegGroup, shift: u8 },
    /// A whole 16-bit register group.
    Group(RegGroup),
    /// Flag nibble, Z in bit 3 down to C in bit 0.
    Flags,
    /// Overlay byte. Addresses the DUT never wrote read as zero.
    Memory(u16),
}

impl Location {
    /// The accumulator.
    pub const A: Self = Self::Reg8 {
        group: RegGroup::Af,
        shift: 8,
    };

    /// Register byte addressed by an operand field. `None` for `(HL)`.
    #[must_use]
    pub const fn from_field(field: &RegisterField) -> Option<Self> {
        match field.encoding {
            FieldEncoding::Register { group, shift } => Some(Self::Reg8 { group, shift }),
            FieldEncoding::Indirect => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Reg8 { group, shift } => {
                let name = group.name();
                let index = if shift >= 8 { 0 } else { 1 };
                match (group, name.chars().nth(index)) {
                    (RegGroup::Sp | RegGroup::Pc, _) | (_, None) => {
                        write!(f, "{name}[{shift}..{}]", shift + 8)
                    }
                    (_, Some(c)) => write!(f, "{c}"),
                }
            }
            Self::Group(group) => write!(f, "{group}"),
            Self::Flags => write!(f, "flags"),
            Self::Memory(address) => write!(f, "mem[{address:#06X}]"),
        }
    }
}

/// One expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub location: Location,
    pub expected: u16,
    /// Only bits set here are compared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<u16>,
}

impl Check {
    #[must_use]
    pub const fn new(location: Location, expected: u16) -> Self {
        Self {
            location,
            expected,
            mask: None,
        }
    }

    #[must_use]
    pub const fn a(expected: u8) -> Self {
        Self::new(Location::A, expected as u16)
    }

    #[must_use]
    pub const fn group(group: RegGroup, expected: u16) -> Self {
        Self::new(Location::Group(group), expected)
    }

    #[must_use]
    pub const fn flags(expected: Flags) -> Self {
        Self::new(Location::Flags, expected.nibble() as u16)
    }

    #[must_use]
    pub const fn memory(address: u16, expected: u8) -> Self {
        Self::new(Location::Memory(address), expected as u16)
    }

    #[must_use]
    pub const fn reg8(group: RegGroup, shift: u8, expected: u8) -> Self {
        Self::new(Location::Reg8 { group, shift }, expected as u16)
    }

    #[must_use]
    pub const fn masked(self, mask: u16) -> Self {
        Self {
            mask: Some(mask),
            ..self
        }
    }

    /// Compare an observed value under the mask.
    #[must_use]
    pub const fn matches(&self, actual: u16) -> bool {
        let mask = match self.mask {
            Some(mask) => mask,
            None => 0xFFFF,
        };
        actual & mask == self.expected & mask
    }
}

/// `advance(cycles)` followed by its checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub cycles: u32,
    pub checks: Vec<Check>,
}

/// A self-contained conformance scenario.
///
/// The program is loaded at address 0, which is where the DUT starts
/// fetching after reset. `setup` is applied through the register backdoor
/// between reset and the first phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub description: String,
    pub program: Vec<u8>,
    #[serde(default)]
    pub overlay: BTreeMap<u16, u8>,
    #[serde(default)]
    pub setup: Vec<(RegGroup, u16)>,
    pub phases: Vec<Phase>,
}

impl TestCase {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, program: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            program,
            overlay: BTreeMap::new(),
            setup: Vec::new(),
            phases: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_setup(mut self, group: RegGroup, value: u16) -> Self {
        self.setup.push((group, value));
        self
    }

    #[must_use]
    pub fn with_memory(mut self, address: u16, value: u8) -> Self {
        self.overlay.insert(address, value);
        self
    }

    #[must_use]
    pub fn phase(mut self, cycles: u32, checks: Vec<Check>) -> Self {
        self.phases.push(Phase { cycles, checks });
        self
    }

    /// Clock cycles across all phases.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.phases.iter().map(|phase| u64::from(phase.cycles)).sum()
    }
}
