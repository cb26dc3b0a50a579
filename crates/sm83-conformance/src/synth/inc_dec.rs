//! 8- and 16-bit `INC`/`DEC`.

use sharp_sm83::{
    AluOutput, CF, ClassId, FieldEncoding, Flags, OpcodeMap, REG16_GROUPS, REGISTER_FIELDS, RegGroup, alu, encode,
};

use super::{HL_DATA, af, cycles};
use crate::case::{Check, TestCase};
use crate::error::SynthesisError;
use crate::registry::Registry;

#[derive(Clone, Copy)]
enum Step {
    Inc,
    Dec,
}

impl Step {
    const BOTH: [Self; 2] = [Self::Inc, Self::Dec];

    const fn name(self) -> &'static str {
        match self {
            Self::Inc => "inc",
            Self::Dec => "dec",
        }
    }

    const fn mnemonic(self) -> &'static str {
        match self {
            Self::Inc => "INC",
            Self::Dec => "DEC",
        }
    }

    fn apply8(self, value: u8, flags: Flags) -> AluOutput {
        match self {
            Self::Inc => alu::inc8(value, flags),
            Self::Dec => alu::dec8(value, flags),
        }
    }

    const fn apply16(self, value: u16) -> u16 {
        match self {
            Self::Inc => value.wrapping_add(1),
            Self::Dec => value.wrapping_sub(1),
        }
    }

    /// `(variant, value)` pairs for the 8-bit forms.
    const fn variants8(self) -> [(&'static str, u8); 3] {
        match self {
            Self::Inc => [("normal", 0x42), ("half_carry", 0x0F), ("zero", 0xFF)],
            Self::Dec => [("normal", 0x42), ("half_carry", 0x10), ("zero", 0x01)],
        }
    }

    /// Operand that wraps around.
    const fn wrap16(self) -> u16 {
        match self {
            Self::Inc => 0xFFFF,
            Self::Dec => 0x0000,
        }
    }
}

/// INC/DEC r never touch carry; every 8-bit case starts with it set.
const CARRY_IN: Flags = Flags::NONE.with(CF, true);

pub(super) fn generate(registry: &mut Registry, map: &OpcodeMap) -> Result<(), SynthesisError> {
    for (index, group) in (0u8..).zip(REG16_GROUPS) {
        for step in Step::BOTH {
            let class = match step {
                Step::Inc => ClassId::IncRr,
                Step::Dec => ClassId::DecRr,
            };
            let opcode = encode::opcode(class, index, 0)?;
            register_16(registry, step, group, opcode, cycles(map, opcode))?;
        }
    }

    for (index, field) in (0u8..).zip(REGISTER_FIELDS.iter()) {
        for step in Step::BOTH {
            let class = match step {
                Step::Inc => ClassId::IncR,
                Step::Dec => ClassId::DecR,
            };
            let opcode = encode::opcode(class, index, 0)?;
            let timing = cycles(map, opcode);
            for (variant, value) in step.variants8() {
                let out = step.apply8(value, CARRY_IN);
                let name = format!("{}_8bit_{}_{variant}", step.name(), field.case_symbol());
                let description = format!("{} {} {variant}", step.mnemonic(), field.symbol);
                let program = vec![opcode, 0x00];
                let case = match field.encoding {
                    FieldEncoding::Indirect => TestCase::new(name, description, program)
                        .with_setup(RegGroup::Af, af(0, CARRY_IN))
                        .with_setup(RegGroup::Hl, HL_DATA)
                        .with_memory(HL_DATA, value)
                        .phase(timing, vec![Check::memory(HL_DATA, out.result), Check::flags(out.flags)]),
                    FieldEncoding::Register {
                        group: RegGroup::Af, ..
                    } => TestCase::new(name, description, program)
                        .with_setup(RegGroup::Af, af(value, CARRY_IN))
                        .phase(timing, vec![Check::a(out.result), Check::flags(out.flags)]),
                    FieldEncoding::Register { group, shift } => TestCase::new(name, description, program)
                        .with_setup(RegGroup::Af, af(0, CARRY_IN))
                        .with_setup(group, u16::from(value) << shift)
                        .phase(
                            timing,
                            vec![Check::reg8(group, shift, out.result), Check::flags(out.flags)],
                        ),
                };
                registry.register(case)?;
            }
        }
    }
    Ok(())
}

fn register_16(
    registry: &mut Registry,
    step: Step,
    group: RegGroup,
    opcode: u8,
    timing: u32,
) -> Result<(), SynthesisError> {
    let prefix = format!("{}_16bit_{}", step.name(), group.name().to_ascii_lowercase());
    let mnemonic = format!("{} {group}", step.mnemonic());

    registry.register(
        TestCase::new(prefix.clone(), mnemonic.clone(), vec![opcode, 0x00])
            .with_setup(group, 0x1000)
            .phase(timing, vec![Check::group(group, step.apply16(0x1000))]),
    )?;

    let wrap = step.wrap16();
    registry.register(
        TestCase::new(format!("{prefix}_wrap"), format!("{mnemonic} wrap"), vec![opcode, 0x00])
            .with_setup(group, wrap)
            .phase(timing, vec![Check::group(group, step.apply16(wrap))]),
    )?;

    // 16-bit INC/DEC leave every flag alone.
    let all = Flags::from_nibble(0x0F);
    registry.register(
        TestCase::new(
            format!("{prefix}_flags_preserved"),
            format!("{mnemonic} keeps flags"),
            vec![opcode, 0x00],
        )
        .with_setup(RegGroup::Af, af(0, all))
        .with_setup(group, wrap)
        .phase(timing, vec![Check::flags(all)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        crate::synth::generated(generate)
    }

    #[test]
    fn dec_wraps_to_ffff() {
        let registry = registry();
        let case = registry.get("dec_16bit_sp_wrap").expect("case");
        assert_eq!(case.program[0], 0x3B);
        assert_eq!(case.phases[0].checks, [Check::group(RegGroup::Sp, 0xFFFF)]);
    }

    #[test]
    fn inc_zero_keeps_carry() {
        let registry = registry();
        let case = registry.get("inc_8bit_c_zero").expect("case");
        assert_eq!(case.program[0], 0x0C);
        assert_eq!(
            case.phases[0].checks,
            [
                Check::reg8(RegGroup::Bc, 0, 0x00),
                Check::flags(Flags::from_nibble(0b1011))
            ]
        );
    }

    #[test]
    fn indirect_forms_write_back() {
        let registry = registry();
        let case = registry.get("dec_8bit_hl_ind_normal").expect("case");
        assert_eq!(case.program[0], 0x35);
        assert_eq!(case.phases[0].cycles, 3);
        assert_eq!(case.phases[0].checks[0], Check::memory(HL_DATA, 0x41));
    }
}
