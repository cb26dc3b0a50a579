//! `LD r,n`, `LD rr,nn` and the `LD r,r'` block.

use sharp_sm83::{ClassId, FieldEncoding, HL_INDIRECT, OpcodeMap, REG16_GROUPS, REGISTER_FIELDS, RegGroup, encode};

use super::{HL_DATA, cycles, field_setup};
use crate::case::{Check, TestCase};
use crate::error::SynthesisError;
use crate::registry::Registry;

const IMMEDIATE: u8 = 0x42;
const SOURCE: u8 = 0x33;
const STORED: u8 = 0x55;
const LOADED: u8 = 0x99;
/// HL for `LD (HL),H` and `LD (HL),L`, where the stored byte is part of the
/// address.
const HL_SELF: u16 = 0x8042;

pub(super) fn generate(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    load_immediate(registry, map)?;
    load_immediate_16(registry, map)?;
    load_register(registry, map)
}

fn load_immediate(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    for (index, field) in (0u8..).zip(REGISTER_FIELDS.iter()) {
        let opcode = encode::opcode(ClassId::LdRImm, index, 0)?;
        let case = match field.encoding {
            FieldEncoding::Indirect => TestCase::new("ld_hl_ind_n8", "LD (HL),n", vec![opcode, IMMEDIATE])
                .with_setup(RegGroup::Hl, HL_DATA)
                .phase(cycles(map, opcode), vec![Check::memory(HL_DATA, IMMEDIATE)]),
            FieldEncoding::Register { group, shift } => TestCase::new(
                format!("ld_{}_n8", field.case_symbol()),
                format!("LD {},n", field.symbol),
                vec![opcode, IMMEDIATE],
            )
            .with_setup(group, 0)
            .phase(cycles(map, opcode), vec![Check::reg8(group, shift, IMMEDIATE)]),
        };
        registry.register(case)?;
    }
    Ok(())
}

fn load_immediate_16(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    for (index, group) in (0u8..).zip(REG16_GROUPS) {
        let opcode = encode::opcode(ClassId::LdRrImm, index, 0)?;
        let case = TestCase::new(
            format!("ld_16bit_{}_n16", group.name().to_ascii_lowercase()),
            format!("LD {group},nn"),
            vec![opcode, 0x34, 0x12],
        )
        .phase(cycles(map, opcode), vec![Check::group(group, 0x1234)]);
        registry.register(case)?;
    }
    Ok(())
}

fn load_register(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    for (dst_index, dst) in (0u8..).zip(REGISTER_FIELDS.iter()) {
        for (src_index, src) in (0u8..).zip(REGISTER_FIELDS.iter()) {
            if dst_index == HL_INDIRECT && src_index == HL_INDIRECT {
                continue;
            }
            let opcode = encode::opcode(ClassId::LdRR, dst_index, src_index)?;
            let program = vec![opcode, 0x00];
            let timing = cycles(map, opcode);

            let case = match (dst.encoding, src.encoding) {
                // LD (HL),r
                (FieldEncoding::Indirect, FieldEncoding::Register { group, shift }) => {
                    let name = format!("ld_hl_ind_{}", src.case_symbol());
                    let description = format!("LD (HL),{}", src.symbol);
                    if group == RegGroup::Hl {
                        let expected = (HL_SELF >> shift) as u8;
                        TestCase::new(name, description, program)
                            .with_setup(RegGroup::Hl, HL_SELF)
                            .phase(timing, vec![Check::memory(HL_SELF, expected)])
                    } else {
                        TestCase::new(name, description, program)
                            .with_setup(RegGroup::Hl, HL_DATA)
                            .with_setup(group, u16::from(STORED) << shift)
                            .phase(timing, vec![Check::memory(HL_DATA, STORED)])
                    }
                }
                // LD r,(HL)
                (FieldEncoding::Register { group, shift }, FieldEncoding::Indirect) => {
                    let case = TestCase::new(
                        format!("ld_{}_hl_ind", dst.case_symbol()),
                        format!("LD {},(HL)", dst.symbol),
                        program,
                    )
                    .with_memory(HL_DATA, LOADED)
                    .with_setup(RegGroup::Hl, HL_DATA);
                    let case = if group == RegGroup::Hl {
                        case
                    } else {
                        case.with_setup(group, u16::from(STORED) << shift)
                    };
                    case.phase(timing, vec![Check::reg8(group, shift, LOADED)])
                }
                // LD r,r'
                (FieldEncoding::Register { group, shift }, FieldEncoding::Register { .. }) => {
                    let mut case = TestCase::new(
                        format!("ld_{}_{}", dst.case_symbol(), src.case_symbol()),
                        format!("LD {},{}", dst.symbol, src.symbol),
                        program,
                    )
                    .with_setup(group, 0);
                    // A same-group source overwrites the clear, so LD r,r
                    // must leave the value in place.
                    if let Some((src_group, value)) = field_setup(src, SOURCE) {
                        case = case.with_setup(src_group, value);
                    }
                    case.phase(timing, vec![Check::reg8(group, shift, SOURCE)])
                }
                // HALT
                (FieldEncoding::Indirect, FieldEncoding::Indirect) => continue,
            };
            registry.register(case)?;
        }
    }
    Ok(())
}
