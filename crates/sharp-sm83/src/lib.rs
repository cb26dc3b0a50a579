//! Sharp SM83 instruction-set reference model.
//!
//! The golden ALU, the register-field table and the opcode encoder are the
//! single source of truth for conformance expectations. The reference core
//! in [`Sm83`] executes one bus transaction per clock through the same
//! pin-level protocol an HDL core exposes.

pub mod alu;
mod cpu;
pub mod encode;
mod flags;
mod instruction;
mod microcode;
mod registers;

pub use alu::{AluOp, AluOutput, RotateOp};
pub use cpu::Sm83;
pub use encode::{ClassId, EncodingError, Layout, OpcodeClass, OpcodeMap, CLASSES};
pub use flags::{CF, Flags, HF, NF, ZF};
pub use instruction::{AddressingMode, Cond, Instruction, Op, Pointer};
pub use registers::{
    FieldEncoding, HL_INDIRECT, REG16_GROUPS, REGISTER_FIELDS, RegGroup, RegisterField, Registers,
    STACK_GROUPS, register_field,
};
