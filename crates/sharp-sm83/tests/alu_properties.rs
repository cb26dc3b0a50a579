//! Exhaustive properties of the golden ALU.

use sharp_sm83::alu::{self, AluOp, RotateOp};
use sharp_sm83::{CF, Flags, HF, NF, ZF};

fn all_inputs() -> impl Iterator<Item = (u8, u8, bool)> {
    (0..=255u8).flat_map(|a| {
        (0..=255u8).flat_map(move |b| [false, true].into_iter().map(move |c| (a, b, c)))
    })
}

#[test]
fn add_family_matches_wide_arithmetic() {
    for (a, b, c) in all_inputs() {
        for op in [AluOp::Add, AluOp::Adc] {
            let carry = op == AluOp::Adc && c;
            let wide = u16::from(a) + u16::from(b) + u16::from(carry);
            let out = alu::compute(op, a, b, c);
            assert_eq!(u16::from(out.result), wide & 0xFF, "{op} {a:02X},{b:02X},{c}");
            assert_eq!(out.flags.zero(), wide & 0xFF == 0);
            assert!(!out.flags.subtract());
            assert_eq!(out.flags.carry(), wide > 0xFF);
        }
    }
}

#[test]
fn sub_family_matches_wide_arithmetic() {
    for (a, b, c) in all_inputs() {
        for op in [AluOp::Sub, AluOp::Sbc, AluOp::Cp] {
            let borrow = op == AluOp::Sbc && c;
            let wide = i16::from(a) - i16::from(b) - i16::from(borrow);
            let out = alu::compute(op, a, b, c);
            let expected = if op == AluOp::Cp { a } else { wide as u8 };
            assert_eq!(out.result, expected, "{op} {a:02X},{b:02X},{c}");
            assert_eq!(out.flags.zero(), wide as u8 == 0);
            assert!(out.flags.subtract());
            assert_eq!(out.flags.carry(), wide < 0);
            assert_eq!(
                out.flags.half_carry(),
                i16::from(a & 0x0F) - i16::from(b & 0x0F) - i16::from(borrow) < 0
            );
        }
    }
}

#[test]
fn logic_ops_clear_carry() {
    for (a, b, c) in all_inputs() {
        for (op, expected) in [(AluOp::And, a & b), (AluOp::Xor, a ^ b), (AluOp::Or, a | b)] {
            let out = alu::compute(op, a, b, c);
            assert_eq!(out.result, expected);
            let h = if op == AluOp::And { HF } else { 0 };
            let z = if expected == 0 { ZF } else { 0 };
            assert_eq!(out.flags.nibble(), z | h, "{op} {a:02X},{b:02X}");
        }
    }
}

#[test]
fn cp_flags_equal_sub_flags() {
    for (a, b, _) in all_inputs() {
        assert_eq!(
            alu::compute(AluOp::Cp, a, b, false).flags,
            alu::compute(AluOp::Sub, a, b, false).flags
        );
    }
}

#[test]
fn inc_dec_never_touch_carry() {
    for value in 0..=255u8 {
        for carry in [Flags::NONE, Flags::from_nibble(CF)] {
            let inc = alu::inc8(value, carry);
            let dec = alu::dec8(value, carry);
            assert_eq!(inc.flags.carry(), carry.carry());
            assert_eq!(dec.flags.carry(), carry.carry());
            assert_eq!(inc.result, value.wrapping_add(1));
            assert_eq!(dec.result, value.wrapping_sub(1));
            assert_eq!(dec.flags.half_carry(), value & 0x0F == 0);
        }
    }
}

#[test]
fn rotates_move_evicted_bit_into_carry() {
    for a in 0..=255u8 {
        for carry_in in [false, true] {
            let flags = Flags::from_nibble(ZF | NF | HF).with(CF, carry_in);
            for op in RotateOp::ALL {
                let out = alu::rotate(op, a, flags);
                let (expected, evicted) = match op {
                    RotateOp::Rlca => (a.rotate_left(1), a >> 7),
                    RotateOp::Rrca => (a.rotate_right(1), a & 1),
                    RotateOp::Rla => ((a << 1) | u8::from(carry_in), a >> 7),
                    RotateOp::Rra => ((a >> 1) | (u8::from(carry_in) << 7), a & 1),
                };
                assert_eq!(out.result, expected, "{} {a:02X}", op.mnemonic());
                assert_eq!(out.flags.nibble(), evicted, "Z, N and H are cleared");
            }
        }
    }
}

#[test]
fn daa_produces_packed_bcd_after_add() {
    for x in 0..100u8 {
        for y in 0..100u8 {
            let bx = (x / 10) << 4 | x % 10;
            let by = (y / 10) << 4 | y % 10;
            let sum = alu::compute(AluOp::Add, bx, by, false);
            let adjusted = alu::daa(sum.result, sum.flags);
            let total = u16::from(x) + u16::from(y);
            let digits = (total % 100) as u8;
            assert_eq!(adjusted.result, (digits / 10) << 4 | digits % 10, "{x} + {y}");
            assert_eq!(adjusted.flags.carry(), total >= 100);
        }
    }
}

#[test]
fn scf_ccf_keep_zero() {
    let flags = Flags::from_nibble(ZF | NF | HF);
    assert_eq!(alu::scf(flags).nibble(), ZF | CF);
    assert_eq!(alu::ccf(flags).nibble(), ZF | CF);
    assert_eq!(alu::ccf(Flags::from_nibble(CF)).nibble(), 0);
}

mod wide {
    use proptest::prelude::*;
    use sharp_sm83::alu;
    use sharp_sm83::{Flags, ZF};

    proptest! {
        #[test]
        fn add16_keeps_zero_and_carries_from_bit_15(hl in any::<u16>(), rr in any::<u16>(), z in any::<bool>()) {
            let before = Flags::NONE.with(ZF, z);
            let out = alu::add16(hl, rr, before);
            let wide = u32::from(hl) + u32::from(rr);
            prop_assert_eq!(u32::from(out.result), wide & 0xFFFF);
            prop_assert_eq!(out.flags.zero(), z);
            prop_assert!(!out.flags.subtract());
            prop_assert_eq!(out.flags.carry(), wide > 0xFFFF);
        }

        #[test]
        fn add_sp_e_is_signed_with_low_byte_flags(sp in any::<u16>(), e in any::<i8>()) {
            let out = alu::add_sp_e(sp, e);
            prop_assert_eq!(i32::from(out.result), (i32::from(sp) + i32::from(e)).rem_euclid(0x1_0000));
            prop_assert!(!out.flags.zero());
            prop_assert!(!out.flags.subtract());
            prop_assert_eq!(out.flags.carry(), (sp & 0xFF) + u16::from(e as u8) > 0xFF);
        }
    }
}
