//! Instruction execution for the SM83.
//!
//! `execute_unprefixed` runs when the opcode fetch completes and queues the
//! remaining bus cycles. Work that needs data from a later cycle happens in
//! `execute_followup`, keyed by `followup_stage`.

use crate::alu::{self, AluOp};
use crate::instruction::{Cond, Op, Pointer};
use crate::microcode::MicroOp;
use crate::registers::HL_INDIRECT;

use super::Sm83;

impl Sm83 {
    /// Execute a freshly fetched opcode.
    pub(super) fn execute_unprefixed(&mut self) {
        if self.ime_pending {
            self.ime = true;
            self.ime_pending = false;
        }

        match self.instr.op {
            Op::Nop => {}

            Op::Stop | Op::Prefix => {
                self.micro_ops.push(MicroOp::ReadImm8);
                self.queue_execute_followup();
            }

            Op::Halt => self.halted = true,

            Op::Di => {
                self.ime = false;
                self.ime_pending = false;
            }

            Op::Ei => self.ime_pending = true,

            Op::Illegal => {
                log::warn!(
                    "illegal opcode {:02X} at {:04X}, core locked",
                    self.instr.opcode,
                    self.regs.pc.wrapping_sub(1)
                );
                self.locked = true;
            }

            // LD r, r'
            Op::LdRR { dst, src } => {
                if src == HL_INDIRECT {
                    self.addr = self.regs.hl();
                    self.micro_ops.push(MicroOp::ReadMem);
                    self.queue_execute_followup();
                } else if dst == HL_INDIRECT {
                    self.addr = self.regs.hl();
                    self.data_lo = self.reg8(src);
                    self.micro_ops.push(MicroOp::WriteMem);
                } else {
                    let value = self.reg8(src);
                    self.regs.set8(dst, value);
                }
            }

            Op::LdRImm { .. }
            | Op::AluImm { .. }
            | Op::Jr { .. }
            | Op::LdhImmA
            | Op::LdhAImm
            | Op::LdHlSpE
            | Op::AddSpE => {
                self.micro_ops.push(MicroOp::ReadImm8);
                self.queue_execute_followup();
            }

            Op::LdRrImm { .. }
            | Op::LdAbsSp
            | Op::LdAbsA
            | Op::LdAAbs
            | Op::Jp { .. }
            | Op::Call { .. } => {
                self.micro_ops.push(MicroOp::ReadImm16Lo);
                self.micro_ops.push(MicroOp::ReadImm16Hi);
                self.queue_execute_followup();
            }

            // LD (BC)/(DE)/(HL+)/(HL-), A
            Op::LdPtrA { ptr } => {
                self.addr = self.pointer_address(ptr);
                self.data_lo = self.regs.a;
                self.micro_ops.push(MicroOp::WriteMem);
            }

            // LD A, (BC)/(DE)/(HL+)/(HL-)
            Op::LdAPtr { ptr } => {
                self.addr = self.pointer_address(ptr);
                self.micro_ops.push(MicroOp::ReadMem);
                self.queue_execute_followup();
            }

            // LDH (C), A
            Op::LdhCA => {
                self.addr = 0xFF00 | u16::from(self.regs.c);
                self.data_lo = self.regs.a;
                self.micro_ops.push(MicroOp::WriteMem);
            }

            // LDH A, (C)
            Op::LdhAC => {
                self.addr = 0xFF00 | u16::from(self.regs.c);
                self.micro_ops.push(MicroOp::ReadMem);
                self.queue_execute_followup();
            }

            Op::LdSpHl => {
                self.queue_internal(1);
                self.regs.sp = self.regs.hl();
            }

            Op::Alu { op, src } => {
                if src == HL_INDIRECT {
                    self.addr = self.regs.hl();
                    self.micro_ops.push(MicroOp::ReadMem);
                    self.queue_execute_followup();
                } else {
                    let value = self.reg8(src);
                    self.alu_a(op, value);
                }
            }

            Op::Inc { dst } | Op::Dec { dst } if dst == HL_INDIRECT => {
                self.addr = self.regs.hl();
                self.micro_ops.push(MicroOp::ReadMem);
                self.queue_execute_followup();
            }

            Op::Inc { dst } => {
                let result = alu::inc8(self.reg8(dst), self.regs.flags());
                self.regs.set8(dst, result.result);
                self.regs.set_flags(result.flags);
            }

            Op::Dec { dst } => {
                let result = alu::dec8(self.reg8(dst), self.regs.flags());
                self.regs.set8(dst, result.result);
                self.regs.set_flags(result.flags);
            }

            Op::IncRr { group } => {
                self.queue_internal(1);
                let value = self.regs.group(group).wrapping_add(1);
                self.regs.set_group(group, value);
            }

            Op::DecRr { group } => {
                self.queue_internal(1);
                let value = self.regs.group(group).wrapping_sub(1);
                self.regs.set_group(group, value);
            }

            Op::AddHl { group } => {
                self.queue_internal(1);
                let result = alu::add16(self.regs.hl(), self.regs.group(group), self.regs.flags());
                self.regs.set_hl(result.result);
                self.regs.set_flags(result.flags);
            }

            Op::Rotate(rotate) => {
                let result = alu::rotate(rotate, self.regs.a, self.regs.flags());
                self.regs.a = result.result;
                self.regs.set_flags(result.flags);
            }

            Op::Daa => {
                let result = alu::daa(self.regs.a, self.regs.flags());
                self.regs.a = result.result;
                self.regs.set_flags(result.flags);
            }

            Op::Cpl => {
                let result = alu::cpl(self.regs.a, self.regs.flags());
                self.regs.a = result.result;
                self.regs.set_flags(result.flags);
            }

            Op::Scf => self.regs.set_flags(alu::scf(self.regs.flags())),

            Op::Ccf => self.regs.set_flags(alu::ccf(self.regs.flags())),

            Op::JpHl => self.regs.pc = self.regs.hl(),

            // RET cc: one internal cycle to evaluate the condition
            Op::Ret { cond: Some(_) } => {
                self.queue_internal(1);
                self.queue_execute_followup();
            }

            Op::Ret { cond: None } | Op::Reti => {
                self.micro_ops.push(MicroOp::PopLo);
                self.micro_ops.push(MicroOp::PopHi);
                self.queue_execute_followup();
            }

            // RST: the stack writes start right after the fetch
            Op::Rst { .. } => {
                self.regs.sp = self.regs.sp.wrapping_sub(1);
                self.set_data_word(self.regs.pc);
                self.micro_ops.push(MicroOp::PushHi);
                self.micro_ops.push(MicroOp::PushLo);
                self.queue_execute_followup();
            }

            Op::Push { group } => {
                self.set_data_word(self.regs.group(group));
                self.micro_ops.push(MicroOp::DecSp);
                self.micro_ops.push(MicroOp::PushHi);
                self.micro_ops.push(MicroOp::PushLo);
            }

            Op::Pop { .. } => {
                self.micro_ops.push(MicroOp::PopLo);
                self.micro_ops.push(MicroOp::PopHi);
                self.queue_execute_followup();
            }
        }
    }

    /// Followup after the queued bus cycles have delivered their data.
    pub(super) fn execute_followup(&mut self) {
        let stage = self.followup_stage;

        match self.instr.op {
            Op::Stop => {
                log::debug!("STOP at {:04X}", self.regs.pc.wrapping_sub(2));
                self.halted = true;
            }

            Op::Prefix => {
                log::warn!(
                    "CB {:02X} at {:04X} is outside the modelled instruction set",
                    self.data_lo,
                    self.regs.pc.wrapping_sub(2)
                );
            }

            Op::LdRR { dst, .. } => self.regs.set8(dst, self.data_lo),

            Op::LdRImm { dst } => {
                if dst == HL_INDIRECT {
                    self.addr = self.regs.hl();
                    self.micro_ops.push(MicroOp::WriteMem);
                } else {
                    self.regs.set8(dst, self.data_lo);
                }
            }

            Op::LdRrImm { group } => self.regs.set_group(group, self.data_word()),

            Op::LdAPtr { .. } | Op::LdhAC => self.regs.a = self.data_lo,

            // LD (nn), SP
            Op::LdAbsSp => {
                self.addr = self.data_word();
                self.set_data_word(self.regs.sp);
                self.micro_ops.push(MicroOp::WriteMem);
                self.micro_ops.push(MicroOp::WriteMemHi);
            }

            Op::LdAbsA => {
                self.addr = self.data_word();
                self.data_lo = self.regs.a;
                self.micro_ops.push(MicroOp::WriteMem);
            }

            Op::LdAAbs if stage == 1 => {
                self.addr = self.data_word();
                self.micro_ops.push(MicroOp::ReadMem);
                self.queue_execute_followup();
            }

            Op::LdhImmA => {
                self.addr = 0xFF00 | u16::from(self.data_lo);
                self.data_lo = self.regs.a;
                self.micro_ops.push(MicroOp::WriteMem);
            }

            Op::LdhAImm if stage == 1 => {
                self.addr = 0xFF00 | u16::from(self.data_lo);
                self.micro_ops.push(MicroOp::ReadMem);
                self.queue_execute_followup();
            }

            Op::LdAAbs | Op::LdhAImm => self.regs.a = self.data_lo,

            Op::LdHlSpE => {
                let result = alu::add_sp_e(self.regs.sp, self.data_lo as i8);
                self.regs.set_hl(result.result);
                self.regs.set_flags(result.flags);
                self.queue_internal(1);
            }

            Op::AddSpE => {
                let result = alu::add_sp_e(self.regs.sp, self.data_lo as i8);
                self.regs.sp = result.result;
                self.regs.set_flags(result.flags);
                self.queue_internal(2);
            }

            Op::Alu { op, .. } | Op::AluImm { op } => self.alu_a(op, self.data_lo),

            // INC (HL) / DEC (HL): modify, then write back
            Op::Inc { .. } => {
                let result = alu::inc8(self.data_lo, self.regs.flags());
                self.data_lo = result.result;
                self.regs.set_flags(result.flags);
                self.micro_ops.push(MicroOp::WriteMem);
            }

            Op::Dec { .. } => {
                let result = alu::dec8(self.data_lo, self.regs.flags());
                self.data_lo = result.result;
                self.regs.set_flags(result.flags);
                self.micro_ops.push(MicroOp::WriteMem);
            }

            Op::Jr { cond } => {
                if self.taken(cond) {
                    let offset = self.data_lo as i8;
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    self.queue_internal(1);
                }
            }

            Op::Jp { cond } => {
                if self.taken(cond) {
                    self.regs.pc = self.data_word();
                    self.queue_internal(1);
                }
            }

            Op::Call { cond } if stage == 1 => {
                if self.taken(cond) {
                    self.addr = self.data_word();
                    self.set_data_word(self.regs.pc);
                    self.micro_ops.push(MicroOp::DecSp);
                    self.micro_ops.push(MicroOp::PushHi);
                    self.micro_ops.push(MicroOp::PushLo);
                    self.queue_execute_followup();
                }
            }

            Op::Call { .. } => self.regs.pc = self.addr,

            Op::Ret { cond: Some(cond) } if stage == 1 => {
                if cond.holds(self.regs.flags()) {
                    self.micro_ops.push(MicroOp::PopLo);
                    self.micro_ops.push(MicroOp::PopHi);
                    self.queue_execute_followup();
                }
            }

            Op::Ret { .. } | Op::Reti => {
                self.regs.pc = self.data_word();
                if self.instr.op == Op::Reti {
                    self.ime = true;
                }
                self.queue_internal(1);
            }

            Op::Rst { vector } => {
                self.regs.pc = u16::from(vector);
                self.queue_internal(1);
            }

            Op::Pop { group } => self.regs.set_group(group, self.data_word()),

            _ => {}
        }
    }

    /// 8-bit register by field index. `(HL)` is resolved through the bus.
    fn reg8(&self, field: u8) -> u8 {
        self.regs.get8(field).unwrap_or_default()
    }

    fn alu_a(&mut self, op: AluOp, value: u8) {
        let result = alu::compute(op, self.regs.a, value, self.regs.flags().carry());
        if op.writes_accumulator() {
            self.regs.a = result.result;
        }
        self.regs.set_flags(result.flags);
    }

    /// Address for `LD (pp),A` / `LD A,(pp)`, applying HL post-increment or
    /// post-decrement.
    fn pointer_address(&mut self, ptr: Pointer) -> u16 {
        match ptr {
            Pointer::Bc => self.regs.bc(),
            Pointer::De => self.regs.de(),
            Pointer::HlInc => {
                let hl = self.regs.hl();
                self.regs.set_hl(hl.wrapping_add(1));
                hl
            }
            Pointer::HlDec => {
                let hl = self.regs.hl();
                self.regs.set_hl(hl.wrapping_sub(1));
                hl
            }
        }
    }

    fn taken(&self, cond: Option<Cond>) -> bool {
        cond.is_none_or(|cond| cond.holds(self.regs.flags()))
    }
}
