//! Jumps, calls, returns and SP-relative arithmetic.

use sharp_sm83::{CF, ClassId, Cond, Flags, NF, OpcodeMap, RegGroup, ZF, alu, encode};

use super::{af, cycles, cycles_taken};
use crate::case::{Check, TestCase};
use crate::error::SynthesisError;
use crate::registry::Registry;

const TARGET: u16 = 0x1000;
const STACK: u16 = 0xC000;

/// Flag states that satisfy and fail `cond`, in that order.
fn flag_states(cond: Cond) -> (Flags, Flags) {
    let set = Flags::from_nibble(ZF | CF);
    if cond.holds(Flags::NONE) {
        (Flags::NONE, set)
    } else {
        (set, Flags::NONE)
    }
}

fn fixed(id: ClassId) -> Result<u8, SynthesisError> {
    Ok(encode::opcode(id, 0, 0)?)
}

pub(super) fn generate(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    jumps(registry, map)?;
    calls(registry, map)?;
    returns(registry, map)?;
    stack_offsets(registry, map)
}

fn jumps(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    let [lo, hi] = TARGET.to_le_bytes();
    let jp = fixed(ClassId::Jp)?;
    registry.register(
        TestCase::new("jp_a16", "JP a16", vec![jp, lo, hi])
            .phase(cycles(map, jp), vec![Check::group(RegGroup::Pc, TARGET)]),
    )?;
    let jp_hl = fixed(ClassId::JpHl)?;
    registry.register(
        TestCase::new("jp_hl", "JP HL", vec![jp_hl])
            .with_setup(RegGroup::Hl, 0x4000)
            .phase(cycles(map, jp_hl), vec![Check::group(RegGroup::Pc, 0x4000)]),
    )?;

    let jr = fixed(ClassId::Jr)?;
    registry.register(
        TestCase::new("jr_forward", "JR +5", vec![jr, 0x05])
            .phase(cycles(map, jr), vec![Check::group(RegGroup::Pc, 0x0007)]),
    )?;
    registry.register(
        TestCase::new("jr_backward", "JR -4", vec![jr, 0xFC])
            .phase(cycles(map, jr), vec![Check::group(RegGroup::Pc, 0xFFFE)]),
    )?;

    for (index, cond) in (0u8..).zip(Cond::ALL) {
        let (taken, not_taken) = flag_states(cond);
        let name = cond.mnemonic().to_ascii_lowercase();

        let opcode = encode::opcode(ClassId::JrCond, index, 0)?;
        registry.register(
            TestCase::new(
                format!("jr_{name}_taken"),
                format!("JR {},e taken", cond.mnemonic()),
                vec![opcode, 0x10],
            )
            .with_setup(RegGroup::Af, af(0, taken))
            .phase(cycles_taken(map, opcode), vec![Check::group(RegGroup::Pc, 0x0012)]),
        )?;
        registry.register(
            TestCase::new(
                format!("jr_{name}_not_taken"),
                format!("JR {},e not taken", cond.mnemonic()),
                vec![opcode, 0x10],
            )
            .with_setup(RegGroup::Af, af(0, not_taken))
            .phase(cycles(map, opcode), vec![Check::group(RegGroup::Pc, 0x0002)]),
        )?;

        let opcode = encode::opcode(ClassId::JpCond, index, 0)?;
        registry.register(
            TestCase::new(
                format!("jp_{name}_taken"),
                format!("JP {},a16 taken", cond.mnemonic()),
                vec![opcode, lo, hi],
            )
            .with_setup(RegGroup::Af, af(0, taken))
            .phase(cycles_taken(map, opcode), vec![Check::group(RegGroup::Pc, TARGET)]),
        )?;
        registry.register(
            TestCase::new(
                format!("jp_{name}_not_taken"),
                format!("JP {},a16 not taken", cond.mnemonic()),
                vec![opcode, lo, hi],
            )
            .with_setup(RegGroup::Af, af(0, not_taken))
            .phase(cycles(map, opcode), vec![Check::group(RegGroup::Pc, 0x0003)]),
        )?;
    }
    Ok(())
}

/// Checks after a completed call from address 0 to `TARGET`.
fn called() -> Vec<Check> {
    let pushed = STACK.wrapping_sub(2);
    vec![
        Check::group(RegGroup::Pc, TARGET),
        Check::group(RegGroup::Sp, pushed),
        Check::memory(pushed, 0x03),
        Check::memory(pushed.wrapping_add(1), 0x00),
    ]
}

fn calls(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    let [lo, hi] = TARGET.to_le_bytes();
    let call = fixed(ClassId::Call)?;
    registry.register(
        TestCase::new("call_a16", "CALL a16", vec![call, lo, hi])
            .with_setup(RegGroup::Sp, STACK)
            .phase(cycles(map, call), called()),
    )?;

    for (index, cond) in (0u8..).zip(Cond::ALL) {
        let (taken, not_taken) = flag_states(cond);
        let name = cond.mnemonic().to_ascii_lowercase();
        let opcode = encode::opcode(ClassId::CallCond, index, 0)?;
        registry.register(
            TestCase::new(
                format!("call_{name}_taken"),
                format!("CALL {},a16 taken", cond.mnemonic()),
                vec![opcode, lo, hi],
            )
            .with_setup(RegGroup::Af, af(0, taken))
            .with_setup(RegGroup::Sp, STACK)
            .phase(cycles_taken(map, opcode), called()),
        )?;
        registry.register(
            TestCase::new(
                format!("call_{name}_not_taken"),
                format!("CALL {},a16 not taken", cond.mnemonic()),
                vec![opcode, lo, hi],
            )
            .with_setup(RegGroup::Af, af(0, not_taken))
            .with_setup(RegGroup::Sp, STACK)
            .phase(
                cycles(map, opcode),
                vec![
                    Check::group(RegGroup::Pc, 0x0003),
                    Check::group(RegGroup::Sp, STACK),
                ],
            ),
        )?;
    }

    // CALL 0010h with a RET at the target.
    let ret = fixed(ClassId::Ret)?;
    let mut program = vec![0x00; 0x11];
    program[..3].copy_from_slice(&[call, 0x10, 0x00]);
    program[0x10] = ret;
    registry.register(
        TestCase::new("call_then_ret", "CALL 0010h; RET", program)
            .with_setup(RegGroup::Sp, STACK)
            .phase(
                cycles(map, call),
                vec![
                    Check::group(RegGroup::Pc, 0x0010),
                    Check::group(RegGroup::Sp, STACK.wrapping_sub(2)),
                ],
            )
            .phase(
                cycles(map, ret),
                vec![
                    Check::group(RegGroup::Pc, 0x0003),
                    Check::group(RegGroup::Sp, STACK),
                ],
            ),
    )
}

fn returns(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    let returned = vec![
        Check::group(RegGroup::Pc, 0x1234),
        Check::group(RegGroup::Sp, STACK.wrapping_add(2)),
    ];
    let with_frame = |case: TestCase| {
        case.with_memory(STACK, 0x34)
            .with_memory(STACK.wrapping_add(1), 0x12)
            .with_setup(RegGroup::Sp, STACK)
    };

    let ret = fixed(ClassId::Ret)?;
    registry.register(
        with_frame(TestCase::new("ret", "RET", vec![ret])).phase(cycles(map, ret), returned.clone()),
    )?;
    let reti = fixed(ClassId::Reti)?;
    registry.register(
        with_frame(TestCase::new("reti", "RETI", vec![reti])).phase(cycles(map, reti), returned.clone()),
    )?;

    for (index, cond) in (0u8..).zip(Cond::ALL) {
        let (taken, not_taken) = flag_states(cond);
        let name = cond.mnemonic().to_ascii_lowercase();
        let opcode = encode::opcode(ClassId::RetCond, index, 0)?;
        registry.register(
            with_frame(TestCase::new(
                format!("ret_{name}_taken"),
                format!("RET {} taken", cond.mnemonic()),
                vec![opcode],
            ))
            .with_setup(RegGroup::Af, af(0, taken))
            .phase(cycles_taken(map, opcode), returned.clone()),
        )?;
        registry.register(
            with_frame(TestCase::new(
                format!("ret_{name}_not_taken"),
                format!("RET {} not taken", cond.mnemonic()),
                vec![opcode],
            ))
            .with_setup(RegGroup::Af, af(0, not_taken))
            .phase(
                cycles(map, opcode),
                vec![
                    Check::group(RegGroup::Pc, 0x0001),
                    Check::group(RegGroup::Sp, STACK),
                ],
            ),
        )?;
    }
    Ok(())
}

/// `LD HL,SP+e` and `ADD SP,e`.
fn stack_offsets(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    const OFFSETS: [(&str, u16, i8); 3] = [
        ("positive", 0xFFF8, 2),
        ("negative", 0xD000, -1),
        ("carry", 0x00FF, 1),
    ];

    let ld_hl_sp_e = fixed(ClassId::LdHlSpE)?;
    let add_sp_e = fixed(ClassId::AddSpE)?;
    for (variant, sp, offset) in OFFSETS {
        let out = alu::add_sp_e(sp, offset);
        let e = offset as u8;
        // Z and N must be cleared whatever they were before.
        let before = af(0, Flags::from_nibble(ZF | NF));

        registry.register(
            TestCase::new(
                format!("ld_hl_sp_e_{variant}"),
                format!("LD HL,SP{offset:+}"),
                vec![ld_hl_sp_e, e],
            )
            .with_setup(RegGroup::Af, before)
            .with_setup(RegGroup::Sp, sp)
            .phase(
                cycles(map, ld_hl_sp_e),
                vec![
                    Check::group(RegGroup::Hl, out.result),
                    Check::group(RegGroup::Sp, sp),
                    Check::flags(out.flags),
                ],
            ),
        )?;

        registry.register(
            TestCase::new(
                format!("add_sp_e_{variant}"),
                format!("ADD SP,{offset}"),
                vec![add_sp_e, e],
            )
            .with_setup(RegGroup::Af, before)
            .with_setup(RegGroup::Sp, sp)
            .phase(
                cycles(map, add_sp_e),
                vec![Check::group(RegGroup::Sp, out.result), Check::flags(out.flags)],
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
    fn conditions_split_on_flags() {
        for cond in Cond::ALL {
            let (taken, not_taken) = flag_states(cond);
            assert!(cond.holds(taken), "{cond:?}");
            assert!(!cond.holds(not_taken), "{cond:?}");
        }
    }

    #[test]
    fn conditional_opcodes() {
        let registry = registry();
        let opcode = |name: &str| registry.get(name).expect("case").program[0];
        assert_eq!(opcode("jr_nz_taken"), 0x20);
        assert_eq!(opcode("jp_c_not_taken"), 0xDA);
        assert_eq!(opcode("call_nc_taken"), 0xD4);
        assert_eq!(opcode("ret_z_taken"), 0xC8);
    }

    #[test]
    fn call_then_ret_layout() {
        let registry = registry();
        let case = registry.get("call_then_ret").expect("case");
        assert_eq!(&case.program[..3], &[0xCD, 0x10, 0x00]);
        assert_eq!(case.program[0x10], 0xC9);
        assert_eq!(case.total_cycles(), 10);
    }

    #[test]
    fn sp_offset_flags_come_from_low_byte() {
        let registry = registry();
        let case = registry.get("add_sp_e_carry").expect("case");
        assert_eq!(
            case.phases[0].checks,
            [
                Check::group(RegGroup::Sp, 0x0100),
                Check::flags(Flags::from_nibble(0b0011))
            ]
        );
    }
}
