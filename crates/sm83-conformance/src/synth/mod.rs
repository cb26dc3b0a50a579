//! Conformance case synthesis.
//!
//! Every opcode byte comes from [`sharp_sm83::encode`], every phase length
//! from the [`OpcodeMap`] timing table and every arithmetic expectation from
//! [`sharp_sm83::alu`]. Variant constants are fixed, so a
//! case name always denotes the same program, pre-state and expectations.

mod alu;
mod control;
mod fixed;
mod inc_dec;
mod loads;

use log::debug;
use sharp_sm83::{CF, FieldEncoding, Flags, OpcodeMap, RegGroup, RegisterField};

use crate::error::SynthesisError;
use crate::registry::Registry;

/// Data address used by `(HL)` operands.
pub(crate) const HL_DATA: u16 = 0x8000;

type Generator = fn(&mut Registry, &OpcodeMap) -> Result<(), SynthesisError>;

const GENERATORS: [(&str, Generator); 5] = [
    ("alu", alu::generate),
    ("loads", loads::generate),
    ("inc_dec", inc_dec::generate),
    ("fixed", fixed::generate),
    ("control", control::generate),
];

/// Build the full case registry.
pub fn synthesize() -> Result<Registry, SynthesisError> {
    let map = OpcodeMap::build()?;
    let mut registry = Registry::new();
    for (name, generate) in GENERATORS {
        let before = registry.len();
        generate(&mut registry, &map)?;
        debug!("{name}: {} cases", registry.len() - before);
    }
    Ok(registry)
}

/// M-cycles of `opcode` from the decode table; the not-taken count for
/// conditional branches.
pub(crate) fn cycles(map: &OpcodeMap, opcode: u8) -> u32 {
    u32::from(map.decode(opcode).cycles)
}

pub(crate) fn cycles_taken(map: &OpcodeMap, opcode: u8) -> u32 {
    u32::from(map.decode(opcode).cycles_taken)
}

/// AF holding `a` and `flags`.
pub(crate) fn af(a: u8, flags: Flags) -> u16 {
    (u16::from(a) << 8) | u16::from(flags.to_f())
}

/// Flags with only carry set as given.
pub(crate) const fn carry(carry_in: bool) -> Flags {
    Flags::NONE.with(CF, carry_in)
}

/// Register write that places `value` in the byte an operand field names.
/// `None` for `(HL)`.
pub(crate) fn field_setup(field: &RegisterField, value: u8) -> Option<(RegGroup, u16)> {
    match field.encoding {
        FieldEncoding::Register { group, shift } => Some((group, u16::from(value) << shift)),
        FieldEncoding::Indirect => None,
    }
}

/// One generator's cases on their own.
#[cfg(test)]
fn generated(generate: Generator) -> Registry {
    let map = OpcodeMap::build().expect("opcode map");
    let mut registry = Registry::new();
    generate(&mut registry, &map).expect("generator succeeds");
    registry
}
