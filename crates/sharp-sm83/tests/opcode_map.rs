//! Opcode map construction and round trip.

use sharp_sm83::encode::{self, ClassId};
use sharp_sm83::{AluOp, CLASSES, Op, OpcodeMap, RegGroup};

#[test]
fn every_byte_round_trips() {
    let map = OpcodeMap::build().expect("opcode map builds");
    for byte in 0..=255u8 {
        let instr = map.decode(byte);
        let class = encode::class(instr.class).expect("class is registered");
        let encoded = encode::encode(class, instr.primary, instr.secondary).expect("encodes");
        assert_eq!(encoded, byte, "{instr}");
        assert_eq!(instr.opcode, byte);
    }
}

#[test]
fn classes_cover_exactly_256_opcodes() {
    let total: usize = CLASSES.iter().map(|class| class.operand_space().len()).sum();
    assert_eq!(total, 256);
}

#[test]
fn halt_owns_the_hl_hl_slot() {
    let map = OpcodeMap::build().expect("opcode map builds");
    assert_eq!(map.decode(0x76).op, Op::Halt);
    assert_eq!(map.decode(0x77).op, Op::LdRR { dst: 6, src: 7 });
}

#[test]
fn illegal_opcodes_are_one_class() {
    let map = OpcodeMap::build().expect("opcode map builds");
    let illegal: Vec<u8> = map
        .iter()
        .filter(|instr| instr.class == ClassId::Illegal)
        .map(|instr| instr.opcode)
        .collect();
    assert_eq!(
        illegal,
        vec![0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD]
    );
}

#[test]
fn decoded_operands() {
    let map = OpcodeMap::build().expect("opcode map builds");
    assert_eq!(
        map.decode(0x9E).op,
        Op::Alu {
            op: AluOp::Sbc,
            src: 6
        }
    );
    assert_eq!(map.decode(0xF1).op, Op::Pop { group: RegGroup::Af });
    assert_eq!(map.decode(0x39).op, Op::AddHl { group: RegGroup::Sp });
    assert_eq!(map.decode(0xEF).op, Op::Rst { vector: 0x28 });
    assert_eq!(map.decode(0xFE).op, Op::AluImm { op: AluOp::Cp });
}

#[test]
fn timing_table() {
    let map = OpcodeMap::build().expect("opcode map builds");
    let cases = [
        (0x00, 1, 1, 1),
        (0x08, 3, 5, 5),
        (0x34, 1, 3, 3),
        (0x36, 2, 3, 3),
        (0x7E, 1, 2, 2),
        (0xC0, 1, 2, 5),
        (0xC4, 3, 3, 6),
        (0xCD, 3, 6, 6),
        (0xE8, 2, 4, 4),
        (0x20, 2, 2, 3),
    ];
    for (opcode, length, cycles, taken) in cases {
        let instr = map.decode(opcode);
        assert_eq!(
            (instr.length, instr.cycles, instr.cycles_taken),
            (length, cycles, taken),
            "{instr}"
        );
    }
}
