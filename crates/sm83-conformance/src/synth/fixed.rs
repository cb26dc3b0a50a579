//! Hand-picked scenarios outside the regular operand grids.

use sharp_sm83::{ClassId, Flags, OpcodeMap, RegGroup, RotateOp, STACK_GROUPS, alu, encode};

use super::{af, cycles};
use crate::case::{Check, TestCase};
use crate::error::SynthesisError;
use crate::registry::Registry;

/// Bits 5..3 of the accumulator-misc row.
const DAA: u8 = 4;
const CPL: u8 = 5;
const SCF: u8 = 6;
const CCF: u8 = 7;

const STACK_TOP: u16 = 0xBFFE;

fn fixed(id: ClassId) -> Result<u8, SynthesisError> {
    Ok(encode::opcode(id, 0, 0)?)
}

fn misc(row: u8) -> Result<u8, SynthesisError> {
    Ok(encode::opcode(ClassId::AccMisc, row, 0)?)
}

pub(super) fn generate(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    let nop = fixed(ClassId::Nop)?;
    registry.register(
        TestCase::new("nop", "NOP", vec![nop]).phase(cycles(map, nop), vec![Check::group(RegGroup::Pc, 1)]),
    )?;

    let ld_a16_sp = fixed(ClassId::LdAbsSp)?;
    registry.register(
        TestCase::new("ld_a16_sp", "LD (a16),SP", vec![ld_a16_sp, 0x34, 0x12])
            .with_setup(RegGroup::Sp, 0xABCD)
            .phase(
                cycles(map, ld_a16_sp),
                vec![Check::memory(0x1234, 0xCD), Check::memory(0x1235, 0xAB)],
            ),
    )?;

    pointer_loads(registry, map)?;

    let ld_sp_hl = fixed(ClassId::LdSpHl)?;
    registry.register(
        TestCase::new("ld_sp_hl", "LD SP,HL", vec![ld_sp_hl])
            .with_setup(RegGroup::Hl, 0xBEEF)
            .with_setup(RegGroup::Sp, 0x0000)
            .phase(cycles(map, ld_sp_hl), vec![Check::group(RegGroup::Sp, 0xBEEF)]),
    )?;

    accumulator(registry, map)?;
    add_hl(registry, map)?;
    stack(registry, map)?;
    high_page(registry, map)?;
    restarts(registry, map)?;

    // HALT and the lock-up run for a watch window past their own cycle.
    registry.register(
        TestCase::new("halt", "HALT stops fetching", vec![fixed(ClassId::Halt)?, 0x3C])
            .with_setup(RegGroup::Af, 0x0000)
            .phase(4, vec![Check::group(RegGroup::Pc, 1), Check::a(0x00)]),
    )?;

    registry.register(
        TestCase::new(
            "illegal_opcode_locks",
            "illegal opcode locks the core",
            vec![encode::opcode(ClassId::Illegal, 0, 0)?, 0x3C],
        )
        .with_setup(RegGroup::Af, 0x0000)
        .phase(3, vec![Check::group(RegGroup::Pc, 1), Check::a(0x00)]),
    )
}

/// `LD (pp),A` and `LD A,(pp)` for BC, DE, HL+ and HL-.
fn pointer_loads(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    const POINTERS: [(&str, &str, RegGroup, u16); 4] = [
        ("bc", "BC", RegGroup::Bc, 0x8000),
        ("de", "DE", RegGroup::De, 0x8000),
        ("hl_inc", "HL+", RegGroup::Hl, 0x8001),
        ("hl_dec", "HL-", RegGroup::Hl, 0x7FFF),
    ];

    for (index, (name, symbol, group, after)) in (0u8..).zip(POINTERS) {
        let mut store_checks = vec![Check::memory(0x8000, 0x42)];
        let mut load_checks = vec![Check::a(0x42)];
        if group == RegGroup::Hl {
            store_checks.push(Check::group(RegGroup::Hl, after));
            load_checks.push(Check::group(RegGroup::Hl, after));
        }

        let store = encode::opcode(ClassId::LdPtrA, index, 0)?;
        registry.register(
            TestCase::new(format!("ld_{name}_ind_a"), format!("LD ({symbol}),A"), vec![store])
                .with_setup(group, 0x8000)
                .with_setup(RegGroup::Af, 0x4200)
                .phase(cycles(map, store), store_checks),
        )?;

        let load = encode::opcode(ClassId::LdAPtr, index, 0)?;
        registry.register(
            TestCase::new(format!("ld_a_{name}_ind"), format!("LD A,({symbol})"), vec![load])
                .with_memory(0x8000, 0x42)
                .with_setup(group, 0x8000)
                .with_setup(RegGroup::Af, 0x0000)
                .phase(cycles(map, load), load_checks),
        )?;
    }
    Ok(())
}

/// Rotates, DAA, CPL, SCF and CCF.
fn accumulator(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    // (op, A with carry clear, A with carry set)
    const ROTATES: [(RotateOp, u8, u8); 4] = [
        (RotateOp::Rlca, 0x85, 0x42),
        (RotateOp::Rrca, 0x85, 0x84),
        (RotateOp::Rla, 0x85, 0x85),
        (RotateOp::Rra, 0x85, 0x85),
    ];
    for (row, (op, a_clear, a_set)) in (0u8..).zip(ROTATES) {
        let opcode = misc(row)?;
        for (carry_in, a) in [(false, a_clear), (true, a_set)] {
            let flags = super::carry(carry_in);
            let out = alu::rotate(op, a, flags);
            registry.register(
                TestCase::new(
                    format!("{}_carry_{}", op.mnemonic().to_ascii_lowercase(), u8::from(carry_in)),
                    format!("{} with carry {}", op.mnemonic(), u8::from(carry_in)),
                    vec![opcode],
                )
                .with_setup(RegGroup::Af, af(a, flags))
                .phase(cycles(map, opcode), vec![Check::a(out.result), Check::flags(out.flags)]),
            )?;
        }
    }

    // Worked examples: 45h + 38h, then 83h - 38h, then an overflow.
    let daa = misc(DAA)?;
    for (name, description, a, flags) in [
        ("daa_1", "DAA after addition", 0x7D, Flags::NONE),
        ("daa_2", "DAA after subtraction", 0x4B, Flags::from_nibble(0b0110)),
        ("daa_3", "DAA decimal overflow", 0x9A, Flags::NONE),
    ] {
        let out = alu::daa(a, flags);
        registry.register(
            TestCase::new(name, description, vec![daa])
                .with_setup(RegGroup::Af, af(a, flags))
                .phase(cycles(map, daa), vec![Check::a(out.result), Check::flags(out.flags)]),
        )?;
    }

    let cpl = misc(CPL)?;
    let out = alu::cpl(0xAA, Flags::NONE);
    registry.register(
        TestCase::new("cpl", "CPL", vec![cpl])
            .with_setup(RegGroup::Af, 0xAA00)
            .phase(cycles(map, cpl), vec![Check::a(out.result), Check::flags(out.flags)]),
    )?;

    let scf = misc(SCF)?;
    registry.register(
        TestCase::new("scf", "SCF", vec![scf])
            .with_setup(RegGroup::Af, 0x0000)
            .phase(cycles(map, scf), vec![Check::flags(alu::scf(Flags::NONE))]),
    )?;

    let ccf = misc(CCF)?;
    for carry_in in [true, false] {
        let flags = super::carry(carry_in);
        let expected = alu::ccf(flags);
        registry.register(
            TestCase::new(
                format!("ccf_{}", u8::from(expected.carry())),
                format!("CCF to carry {}", u8::from(expected.carry())),
                vec![ccf],
            )
            .with_setup(RegGroup::Af, af(0, flags))
            .phase(cycles(map, ccf), vec![Check::flags(expected)]),
        )?;
    }
    Ok(())
}

fn add_hl(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    // (name, pair index, HL, operand, AF)
    const CASES: [(&str, u8, u16, u16, u16); 5] = [
        ("add_hl_bc_no_carry_no_halfcarry", 0, 0x1234, 0x1111, 0x5580),
        ("add_hl_bc_halfcarry", 0, 0x0FFF, 0x0001, 0x0080),
        ("add_hl_de_carry_and_halfcarry", 1, 0xFFFF, 0x0001, 0x0080),
        ("add_hl_hl_carry_only", 2, 0x8000, 0x8000, 0x0000),
        ("add_hl_sp_halfcarry", 3, 0x8FFF, 0x0001, 0x0000),
    ];

    for (name, pair, hl, operand, af_in) in CASES {
        let group = sharp_sm83::REG16_GROUPS[usize::from(pair)];
        let flags = Flags::from_f(af_in as u8);
        let out = alu::add16(hl, operand, flags);
        let opcode = encode::opcode(ClassId::AddHl, pair, 0)?;
        let mut case =
            TestCase::new(name, format!("ADD HL,{group}"), vec![opcode]).with_setup(RegGroup::Af, af_in);
        if group != RegGroup::Hl {
            case = case.with_setup(group, operand);
        }
        registry.register(
            case.with_setup(RegGroup::Hl, hl).phase(
                cycles(map, opcode),
                vec![
                    Check::group(RegGroup::Hl, out.result),
                    Check::a((af_in >> 8) as u8),
                    Check::flags(out.flags),
                ],
            ),
        )?;
    }
    Ok(())
}

fn stack_index(group: RegGroup) -> u8 {
    (0u8..)
        .zip(STACK_GROUPS)
        .find_map(|(index, g)| (g == group).then_some(index))
        .unwrap_or_default()
}

/// PUSH, POP and a push-then-pop round trip.
fn stack(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    // (group, value, SP before)
    const PUSHES: [(RegGroup, u16, u16); 4] = [
        (RegGroup::Bc, 0x1234, 0xC010),
        (RegGroup::De, 0x5678, 0xC010),
        (RegGroup::Hl, 0x9ABC, 0xC010),
        (RegGroup::Af, 0x42B0, 0xC100),
    ];
    for (group, value, sp) in PUSHES {
        let below = sp.wrapping_sub(2);
        let push = encode::opcode(ClassId::Push, stack_index(group), 0)?;
        registry.register(
            TestCase::new(
                format!("push_{}", group.name().to_ascii_lowercase()),
                format!("PUSH {group}"),
                vec![push],
            )
            .with_setup(group, value)
            .with_setup(RegGroup::Sp, sp)
            .phase(
                cycles(map, push),
                vec![
                    Check::group(RegGroup::Sp, below),
                    Check::memory(below, value as u8),
                    Check::memory(below.wrapping_add(1), (value >> 8) as u8),
                ],
            ),
        )?;
    }

    // (name, group, SP before, low byte, high byte, expected)
    const POPS: [(&str, RegGroup, u16, u8, u8, u16); 4] = [
        ("pop_bc", RegGroup::Bc, 0xC000, 0x22, 0x11, 0x1122),
        ("pop_de", RegGroup::De, 0xC000, 0x78, 0x56, 0x5678),
        ("pop_hl", RegGroup::Hl, 0xBFFE, 0xCD, 0xAB, 0xABCD),
        ("pop_af_masks_low_nibble_of_f", RegGroup::Af, 0xC000, 0xFF, 0x12, 0x12F0),
    ];
    for (name, group, sp, low, high, expected) in POPS {
        let pop = encode::opcode(ClassId::Pop, stack_index(group), 0)?;
        registry.register(
            TestCase::new(name, format!("POP {group}"), vec![pop])
                .with_memory(sp, low)
                .with_memory(sp.wrapping_add(1), high)
                .with_setup(RegGroup::Sp, sp)
                .with_setup(group, 0x0000)
                .phase(
                    cycles(map, pop),
                    vec![
                        Check::group(group, expected),
                        Check::group(RegGroup::Sp, sp.wrapping_add(2)),
                    ],
                ),
        )?;
    }

    let push_bc = encode::opcode(ClassId::Push, stack_index(RegGroup::Bc), 0)?;
    let pop_de = encode::opcode(ClassId::Pop, stack_index(RegGroup::De), 0)?;
    registry.register(
        TestCase::new(
            "push_then_pop_roundtrip_bc_to_de",
            "PUSH BC; POP DE",
            vec![push_bc, pop_de],
        )
        .with_setup(RegGroup::Bc, 0x9A31)
        .with_setup(RegGroup::De, 0x0000)
        .with_setup(RegGroup::Sp, 0xC200)
        .phase(
            cycles(map, push_bc),
            vec![
                Check::group(RegGroup::Sp, 0xC1FE),
                Check::memory(0xC1FE, 0x31),
                Check::memory(0xC1FF, 0x9A),
            ],
        )
        .phase(
            cycles(map, pop_de),
            vec![
                Check::group(RegGroup::De, 0x9A31),
                Check::group(RegGroup::Sp, 0xC200),
            ],
        ),
    )
}

/// LDH forms and the absolute accumulator loads.
fn high_page(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    let opcode = fixed(ClassId::LdhImmA)?;
    registry.register(
        TestCase::new("ldh_a8_ind_a", "LDH (a8),A", vec![opcode, 0x42])
            .with_setup(RegGroup::Af, 0xAB00)
            .phase(cycles(map, opcode), vec![Check::memory(0xFF42, 0xAB)]),
    )?;
    let opcode = fixed(ClassId::LdhAImm)?;
    registry.register(
        TestCase::new("ldh_a_ind_a8", "LDH A,(a8)", vec![opcode, 0x80])
            .with_memory(0xFF80, 0x5E)
            .with_setup(RegGroup::Af, 0x0000)
            .phase(cycles(map, opcode), vec![Check::a(0x5E)]),
    )?;
    let opcode = fixed(ClassId::LdhCA)?;
    registry.register(
        TestCase::new("ldh_c_ind_a", "LDH (C),A", vec![opcode])
            .with_setup(RegGroup::Af, 0x7700)
            .with_setup(RegGroup::Bc, 0x0033)
            .phase(cycles(map, opcode), vec![Check::memory(0xFF33, 0x77)]),
    )?;
    let opcode = fixed(ClassId::LdhAC)?;
    registry.register(
        TestCase::new("ldh_a_ind_c", "LDH A,(C)", vec![opcode])
            .with_memory(0xFF10, 0xC4)
            .with_setup(RegGroup::Af, 0x0000)
            .with_setup(RegGroup::Bc, 0x0010)
            .phase(cycles(map, opcode), vec![Check::a(0xC4)]),
    )?;
    let opcode = fixed(ClassId::LdAbsA)?;
    registry.register(
        TestCase::new("ld_a16_ind_a", "LD (a16),A", vec![opcode, 0x34, 0x12])
            .with_setup(RegGroup::Af, 0x9B00)
            .phase(cycles(map, opcode), vec![Check::memory(0x1234, 0x9B), Check::a(0x9B)]),
    )?;
    let opcode = fixed(ClassId::LdAAbs)?;
    registry.register(
        TestCase::new("ld_a_ind_a16", "LD A,(a16)", vec![opcode, 0x78, 0x56])
            .with_memory(0x5678, 0x3C)
            .with_setup(RegGroup::Af, 0x0000)
            .phase(cycles(map, opcode), vec![Check::a(0x3C)]),
    )
}

/// All eight RST vectors. Checked one cycle early, before the fetch at the
/// vector.
fn restarts(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    let pushed = STACK_TOP.wrapping_sub(2);
    for row in 0u8..8 {
        let vector = row * 8;
        let rst = encode::opcode(ClassId::Rst, row, 0)?;
        registry.register(
            TestCase::new(format!("rst_{vector:02x}"), format!("RST {vector:02X}h"), vec![rst, 0x00])
                .with_setup(RegGroup::Sp, STACK_TOP)
                .phase(
                    cycles(map, rst) - 1,
                    vec![
                        Check::group(RegGroup::Pc, u16::from(vector)),
                        Check::group(RegGroup::Sp, pushed),
                        Check::memory(pushed, 0x01),
                        Check::memory(pushed.wrapping_add(1), 0x00),
                    ],
                ),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        crate::synth::generated(generate)
    }

    #[test]
    fn rotate_expectations() {
        let registry = registry();
        let case = registry.get("rlca_carry_0").expect("case");
        assert_eq!(case.program, [0x07]);
        assert_eq!(
            case.phases[0].checks,
            [Check::a(0x0B), Check::flags(Flags::from_nibble(0b0001))]
        );
        let case = registry.get("rra_carry_1").expect("case");
        assert_eq!(case.program, [0x1F]);
        assert_eq!(case.phases[0].checks[0], Check::a(0xC2));
    }

    #[test]
    fn daa_worked_examples() {
        let registry = registry();
        let first = registry.get("daa_1").expect("case");
        assert_eq!(first.phases[0].checks, [Check::a(0x83), Check::flags(Flags::NONE)]);
        let second = registry.get("daa_2").expect("case");
        assert_eq!(
            second.phases[0].checks,
            [Check::a(0x45), Check::flags(Flags::from_nibble(0b0100))]
        );
    }

    #[test]
    fn every_rst_vector() {
        let registry = registry();
        let opcodes: Vec<u8> = (0..8)
            .map(|row| {
                let name = format!("rst_{:02x}", row * 8);
                registry.get(&name).expect("rst case").program[0]
            })
            .collect();
        assert_eq!(opcodes, [0xC7, 0xCF, 0xD7, 0xDF, 0xE7, 0xEF, 0xF7, 0xFF]);
    }

    #[test]
    fn ccf_names_follow_resulting_carry() {
        let registry = registry();
        let set = registry.get("ccf_1").expect("case");
        assert_eq!(set.setup, [(RegGroup::Af, 0x0000)]);
        let cleared = registry.get("ccf_0").expect("case");
        assert_eq!(cleared.setup, [(RegGroup::Af, 0x0010)]);
    }

    #[test]
    fn pop_af_drops_low_nibble() {
        let registry = registry();
        let case = registry.get("pop_af_masks_low_nibble_of_f").expect("case");
        assert_eq!(case.program, [0xF1]);
        assert_eq!(case.phases[0].checks[0], Check::group(RegGroup::Af, 0x12F0));
    }
}
