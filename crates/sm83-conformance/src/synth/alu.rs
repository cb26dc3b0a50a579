//! `ALU A,r` and `ALU A,n` cases.

use sharp_sm83::{AluOp, ClassId, OpcodeMap, REGISTER_FIELDS, RegGroup, RegisterField, alu, encode};

use super::{HL_DATA, af, carry, cycles, field_setup};
use crate::case::{Check, Location, TestCase};
use crate::error::SynthesisError;
use crate::registry::Registry;

/// One operand combination. `b` is ignored when the operand is A itself.
struct Variant {
    name: &'static str,
    a: u8,
    b: u8,
    carry: bool,
}

const fn variant(name: &'static str, a: u8, b: u8, carry: bool) -> Variant {
    Variant { name, a, b, carry }
}

const ADD: &[Variant] = &[
    variant("normal", 0x42, 0x01, false),
    variant("half_carry", 0x42, 0x0F, false),
    variant("carry", 0xF0, 0x11, false),
    variant("zero", 0x00, 0x00, false),
];

const ADC: &[Variant] = &[
    variant("with_carry", 0x42, 0x01, true),
    variant("without_carry", 0x42, 0x01, false),
    variant("carry_chain", 0x0F, 0x00, true),
    variant("zero", 0xFF, 0x00, true),
];

const SUB: &[Variant] = &[
    variant("normal", 0x50, 0x20, false),
    variant("half_carry", 0x50, 0x01, false),
    variant("carry", 0x20, 0x50, false),
    variant("zero", 0x42, 0x42, false),
];

const SBC: &[Variant] = &[
    variant("with_carry", 0x50, 0x20, true),
    variant("without_carry", 0x50, 0x20, false),
    variant("borrow", 0x00, 0x00, true),
    variant("zero", 0x21, 0x20, true),
];

const AND: &[Variant] = &[
    variant("normal", 0x5A, 0x3C, false),
    variant("zero", 0xF0, 0x0F, false),
];

const XOR: &[Variant] = &[
    variant("normal", 0x5A, 0x3C, false),
    variant("zero", 0x42, 0x42, false),
];

const OR: &[Variant] = &[
    variant("normal", 0x50, 0x20, false),
    variant("zero", 0x00, 0x00, false),
];

// `op A,A`: only the accumulator value matters.
const ADD_A: &[Variant] = &[
    variant("normal", 0x42, 0, false),
    variant("half_carry", 0x0F, 0, false),
    variant("carry", 0xF0, 0, false),
    variant("zero", 0x00, 0, false),
];

const ADC_A: &[Variant] = &[
    variant("with_carry", 0x42, 0, true),
    variant("without_carry", 0x42, 0, false),
    variant("carry", 0x80, 0, true),
];

const SBC_A: &[Variant] = &[
    variant("without_carry", 0x50, 0, false),
    variant("with_carry", 0x50, 0, true),
];

const SELF_ZERO: &[Variant] = &[variant("zero", 0x50, 0, false)];

const LOGIC_A: &[Variant] = &[variant("normal", 0x5A, 0, false), variant("zero", 0x00, 0, false)];

/// Variants for a second operand distinct from A.
const fn variants(op: AluOp) -> &'static [Variant] {
    match op {
        AluOp::Add => ADD,
        AluOp::Adc => ADC,
        AluOp::Sub | AluOp::Cp => SUB,
        AluOp::Sbc => SBC,
        AluOp::And => AND,
        AluOp::Xor => XOR,
        AluOp::Or => OR,
    }
}

/// Variants for `op A,A`.
const fn accumulator_variants(op: AluOp) -> &'static [Variant] {
    match op {
        AluOp::Add => ADD_A,
        AluOp::Adc => ADC_A,
        AluOp::Sub | AluOp::Xor | AluOp::Cp => SELF_ZERO,
        AluOp::Sbc => SBC_A,
        AluOp::And | AluOp::Or => LOGIC_A,
    }
}

pub(super) fn generate(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    for op in AluOp::ALL {
        for (index, field) in (0u8..).zip(REGISTER_FIELDS.iter()) {
            let opcode = encode::opcode(ClassId::Alu, op.index(), index)?;
            let accumulator = Location::from_field(field) == Some(Location::A);
            let table = if accumulator {
                accumulator_variants(op)
            } else {
                variants(op)
            };
            for v in table {
                let b = if accumulator { v.a } else { v.b };
                registry.register(register_case(map, op, field, opcode, v, b))?;
            }
        }

        let opcode = encode::opcode(ClassId::AluImm, op.index(), 0)?;
        for v in variants(op) {
            let out = alu::compute(op, v.a, v.b, v.carry);
            let mnemonic = op.mnemonic();
            let case = TestCase::new(
                format!("alu_imm_{}_a_n_{}", mnemonic.to_ascii_lowercase(), v.name),
                format!("{mnemonic} A,n {}", v.name),
                vec![opcode, v.b, 0x00],
            )
            .with_setup(RegGroup::Af, af(v.a, carry(v.carry)))
            .phase(cycles(map, opcode), vec![Check::a(out.result), Check::flags(out.flags)]);
            registry.register(case)?;
        }
    }
    Ok(())
}

fn register_case(
    map: &OpcodeMap,
    op: AluOp,
    field: &RegisterField,
    opcode: u8,
    v: &Variant,
    b: u8,
) -> TestCase {
    let out = alu::compute(op, v.a, b, v.carry);
    let mnemonic = op.mnemonic();
    let case = TestCase::new(
        format!(
            "alu_{}_a_{}_{}",
            mnemonic.to_ascii_lowercase(),
            field.case_symbol(),
            v.name
        ),
        format!("{mnemonic} A,{} {}", field.symbol, v.name),
        vec![opcode, 0x00],
    )
    .with_setup(RegGroup::Af, af(v.a, carry(v.carry)));

    let case = match field_setup(field, b) {
        // A itself is already in place.
        Some((RegGroup::Af, _)) => case,
        Some((group, value)) => case.with_setup(group, value),
        None => case.with_setup(RegGroup::Hl, HL_DATA).with_memory(HL_DATA, b),
    };
    case.phase(
        cycles(map, opcode),
        vec![Check::a(out.result), Check::flags(out.flags)],
    )
}
