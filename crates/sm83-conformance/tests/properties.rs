//! Randomized properties driven through the testbench.

use std::collections::BTreeMap;
use std::sync::Arc;

use emu_core::Ticks;
use proptest::prelude::*;
use sharp_sm83::{CF, Flags, OpcodeMap, RegGroup, RotateOp, Sm83, alu};
use sm83_conformance::runner::Runner;
use sm83_conformance::{
    BusPolicy, CaseOutcome, Check, Location, MemoryImage, ReferenceBackend, RunConfig, TestCase,
    Testbench,
};

fn map() -> Arc<OpcodeMap> {
    Arc::new(OpcodeMap::build().expect("opcode map"))
}

fn run(case: &TestCase) -> CaseOutcome {
    let backend = ReferenceBackend::new(map());
    Runner::new(&backend, &RunConfig::default()).run_case(case).outcome
}

const GROUPS: [RegGroup; 6] = [
    RegGroup::Af,
    RegGroup::Bc,
    RegGroup::De,
    RegGroup::Hl,
    RegGroup::Sp,
    RegGroup::Pc,
];

proptest! {
    #[test]
    fn push_then_pop_round_trips(value in any::<u16>(), sp in 4u32..=0x1_0000) {
        // SP of 0x10000 wraps to 0; the pushed bytes land at FFFE/FFFF.
        let sp = sp as u16;
        let below = sp.wrapping_sub(2);
        // PUSH BC; POP DE
        let case = TestCase::new("push_pop", "PUSH BC; POP DE", vec![0xC5, 0xD1])
            .with_setup(RegGroup::Bc, value)
            .with_setup(RegGroup::Sp, sp)
            .phase(4, vec![
                Check::group(RegGroup::Sp, below),
                Check::memory(below, value as u8),
                Check::memory(below.wrapping_add(1), (value >> 8) as u8),
            ])
            .phase(3, vec![
                Check::group(RegGroup::De, value),
                Check::group(RegGroup::Sp, sp),
            ]);
        prop_assert_eq!(run(&case), CaseOutcome::Passed, "value={:#06X} sp={:#06X}", value, sp);
    }

    #[test]
    fn reset_lands_on_zero_from_any_state(
        program in prop::collection::vec(any::<u8>(), 1..32),
        state in prop::array::uniform6(any::<u16>()),
        cycles in 0u32..24,
    ) {
        let mut tb = Testbench::new(
            Box::new(Sm83::new(map())),
            MemoryImage::new(program, BTreeMap::new()),
            BusPolicy::Lenient,
            Ticks::new(5),
        );
        tb.reset();
        for (group, value) in GROUPS.into_iter().zip(state) {
            tb.inject(group, value);
        }
        tb.advance(cycles);

        tb.reset();
        prop_assert_eq!(tb.observe(Location::Group(RegGroup::Pc)), 0);
    }

    #[test]
    fn rlca_and_rrca_move_the_evicted_bit_into_carry(a in any::<u8>(), carry_in in any::<bool>()) {
        for (opcode, op) in [(0x07, RotateOp::Rlca), (0x0F, RotateOp::Rrca)] {
            let before = Flags::NONE.with(CF, carry_in);
            let out = alu::rotate(op, a, before);
            let case = TestCase::new("rotate", format!("{op:?}"), vec![opcode])
                .with_setup(RegGroup::Af, u16::from_be_bytes([a, before.to_f()]))
                .phase(1, vec![Check::a(out.result), Check::flags(out.flags)]);
            prop_assert_eq!(run(&case), CaseOutcome::Passed, "{:?} a={:#04X}", op, a);
            let evicted = if op == RotateOp::Rlca { a >> 7 } else { a & 1 };
            prop_assert_eq!(out.flags.carry(), evicted == 1);
        }
    }
}

#[test]
fn rst_vectors_follow_the_opcode() {
    for opcode in (0xC7..=0xFFu8).step_by(8) {
        let vector = u16::from(opcode & 0x38);
        let case = TestCase::new(format!("rst_{vector:02x}"), "RST", vec![opcode])
            .with_setup(RegGroup::Sp, 0xD000)
            .phase(
                3,
                vec![
                    Check::group(RegGroup::Pc, vector),
                    Check::group(RegGroup::Sp, 0xCFFE),
                    Check::memory(0xCFFE, 0x01),
                    Check::memory(0xCFFF, 0x00),
                ],
            );
        assert_eq!(run(&case), CaseOutcome::Passed, "RST {vector:02X}h");
    }
}
