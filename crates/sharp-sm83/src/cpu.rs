//! SM83 reference core with per-clock execution.

mod execute;

use std::sync::Arc;

use emu_core::{BusPins, Logic, Observable, Value};

use crate::encode::OpcodeMap;
use crate::instruction::Instruction;
use crate::microcode::{MicroOp, MicroOpQueue};
use crate::registers::{RegGroup, Registers};

/// SM83 reference core.
///
/// The core does not own a bus. It presents [`BusPins`] computed from the
/// micro-op at the head of its queue and samples `data_in` on each rising
/// edge, exactly like an HDL core under a simulator. One bus transaction
/// per clock; instructions never overlap.
pub struct Sm83 {
    pub(crate) regs: Registers,
    map: Arc<OpcodeMap>,

    // === Execution state ===
    micro_ops: MicroOpQueue,
    /// Instruction being executed.
    instr: Instruction,
    /// Temporary address register.
    addr: u16,
    /// Temporary data (low byte).
    data_lo: u8,
    /// Temporary data (high byte).
    data_hi: u8,
    /// Followup stage counter for multi-stage instructions (1, 2, 3...).
    followup_stage: u8,

    // === Pins ===
    reset: bool,
    data_in: Logic<u8>,
    /// Set from power-on or reset until the first rising edge with reset
    /// deasserted. Outputs are undefined meanwhile.
    booting: bool,

    // === Control state ===
    ime: bool,
    /// EI takes effect after the following instruction.
    ime_pending: bool,
    halted: bool,
    /// An illegal opcode was executed. Only reset recovers.
    locked: bool,
    /// Rising edges since the boot edge.
    cycles: u64,
}

impl Sm83 {
    /// Create a core in its power-on state. The first rising edge boots it.
    #[must_use]
    pub fn new(map: Arc<OpcodeMap>) -> Self {
        let instr = *map.decode(0x00);
        Self {
            regs: Registers::default(),
            map,
            micro_ops: MicroOpQueue::new(),
            instr,
            addr: 0,
            data_lo: 0,
            data_hi: 0,
            followup_stage: 0,
            reset: false,
            data_in: Logic::Undefined,
            booting: true,
            ime: false,
            ime_pending: false,
            halted: false,
            locked: false,
            cycles: 0,
        }
    }

    /// Drive the active-high reset input.
    pub fn set_reset(&mut self, asserted: bool) {
        self.reset = asserted;
    }

    /// Drive the data-in bus, sampled on the next rising edge.
    pub fn set_data_in(&mut self, value: Logic<u8>) {
        self.data_in = value;
    }

    /// Current output pins.
    #[must_use]
    pub fn pins(&self) -> BusPins {
        if self.reset || self.booting {
            return BusPins {
                read_enable: Logic::Driven(true),
                ..BusPins::default()
            };
        }
        let pc = self.regs.pc;
        let sp = self.regs.sp;
        match self.micro_ops.current() {
            Some(
                MicroOp::FetchOpcode
                | MicroOp::ReadImm8
                | MicroOp::ReadImm16Lo
                | MicroOp::ReadImm16Hi,
            ) => BusPins::read(pc),
            Some(MicroOp::ReadMem) => BusPins::read(self.addr),
            Some(MicroOp::WriteMem) => BusPins::write(self.addr, self.data_lo),
            Some(MicroOp::WriteMemHi) => BusPins::write(self.addr, self.data_hi),
            Some(MicroOp::PushHi) => BusPins::write(sp, self.data_hi),
            Some(MicroOp::PushLo) => BusPins::write(sp, self.data_lo),
            Some(MicroOp::PopLo | MicroOp::PopHi) => BusPins::read(sp),
            Some(MicroOp::DecSp | MicroOp::Internal) | None => BusPins::idle(),
        }
    }

    /// Complete the current bus cycle and move to the next.
    pub fn rising_edge(&mut self) {
        if self.reset {
            self.apply_reset();
            return;
        }
        if self.booting {
            self.booting = false;
            self.queue_fetch();
            return;
        }

        self.cycles += 1;
        if let Some(op) = self.micro_ops.current() {
            self.micro_ops.advance();
            self.complete(op);
        }
        while self.micro_ops.take_followup() {
            self.execute_followup();
        }
        if self.micro_ops.is_empty() {
            self.queue_next();
        }
    }

    /// Nothing is latched on the falling edge.
    pub fn falling_edge(&mut self) {}

    /// Register backdoor read.
    #[must_use]
    pub const fn read_group(&self, group: RegGroup) -> u16 {
        self.regs.group(group)
    }

    /// Register backdoor write. A pending fetch sees a new PC immediately.
    pub fn write_group(&mut self, group: RegGroup, value: u16) {
        self.regs.set_group(group, value);
    }

    /// True when the next bus cycle is an opcode fetch.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        !self.reset && !self.booting && self.micro_ops.current() == Some(MicroOp::FetchOpcode)
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Rising edges since the core left reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    fn apply_reset(&mut self) {
        self.regs = Registers::default();
        self.micro_ops.clear();
        self.instr = *self.map.decode(0x00);
        self.addr = 0;
        self.data_lo = 0;
        self.data_hi = 0;
        self.followup_stage = 0;
        self.booting = true;
        self.ime = false;
        self.ime_pending = false;
        self.halted = false;
        self.locked = false;
        self.cycles = 0;
    }

    /// Finish a bus cycle with the value sampled from `data_in`.
    fn complete(&mut self, op: MicroOp) {
        // An undriven bus latches as zero.
        let data = self.data_in.unwrap_or(0);
        match op {
            MicroOp::FetchOpcode => {
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.instr = *self.map.decode(data);
                self.execute_unprefixed();
            }
            MicroOp::ReadImm8 | MicroOp::ReadImm16Lo => {
                self.data_lo = data;
                self.regs.pc = self.regs.pc.wrapping_add(1);
            }
            MicroOp::ReadImm16Hi => {
                self.data_hi = data;
                self.regs.pc = self.regs.pc.wrapping_add(1);
            }
            MicroOp::ReadMem => self.data_lo = data,
            MicroOp::WriteMem => self.addr = self.addr.wrapping_add(1),
            MicroOp::DecSp | MicroOp::PushHi => self.regs.sp = self.regs.sp.wrapping_sub(1),
            MicroOp::PopLo => {
                self.data_lo = data;
                self.regs.sp = self.regs.sp.wrapping_add(1);
            }
            MicroOp::PopHi => {
                self.data_hi = data;
                self.regs.sp = self.regs.sp.wrapping_add(1);
            }
            MicroOp::WriteMemHi | MicroOp::PushLo | MicroOp::Internal => {}
        }
    }

    /// Queue micro-ops for the next instruction fetch.
    fn queue_fetch(&mut self) {
        self.micro_ops.clear();
        self.followup_stage = 0;
        self.micro_ops.push(MicroOp::FetchOpcode);
    }

    /// Fetch, or idle while halted or locked up.
    fn queue_next(&mut self) {
        if self.halted || self.locked {
            self.micro_ops.clear();
            self.micro_ops.push(MicroOp::Internal);
        } else {
            self.queue_fetch();
        }
    }

    fn queue_execute_followup(&mut self) {
        self.followup_stage += 1;
        self.micro_ops.request_followup();
    }

    fn queue_internal(&mut self, cycles: u8) {
        for _ in 0..cycles {
            self.micro_ops.push(MicroOp::Internal);
        }
    }

    /// 16-bit word from the temporary data registers.
    fn data_word(&self) -> u16 {
        u16::from(self.data_hi) << 8 | u16::from(self.data_lo)
    }

    fn set_data_word(&mut self, value: u16) {
        self.data_hi = (value >> 8) as u8;
        self.data_lo = value as u8;
    }
}

impl Observable for Sm83 {
    fn query(&self, path: &str) -> Option<Value> {
        let flags = self.regs.flags();
        match path {
            "a" => Some(self.regs.a.into()),
            "f" => Some(self.regs.f.into()),
            "b" => Some(self.regs.b.into()),
            "c" => Some(self.regs.c.into()),
            "d" => Some(self.regs.d.into()),
            "e" => Some(self.regs.e.into()),
            "h" => Some(self.regs.h.into()),
            "l" => Some(self.regs.l.into()),

            "af" => Some(self.regs.af().into()),
            "bc" => Some(self.regs.bc().into()),
            "de" => Some(self.regs.de().into()),
            "hl" => Some(self.regs.hl().into()),
            "sp" => Some(self.regs.sp.into()),
            "pc" => Some(self.regs.pc.into()),

            "flags.z" => Some(flags.zero().into()),
            "flags.n" => Some(flags.subtract().into()),
            "flags.h" => Some(flags.half_carry().into()),
            "flags.c" => Some(flags.carry().into()),

            "ime" => Some(self.ime.into()),
            "halted" => Some(self.halted.into()),
            "locked" => Some(self.locked.into()),
            "cycles" => Some(self.cycles.into()),
            "pending_cycles" => Some((self.micro_ops.remaining() as u64).into()),
            "instruction" => Some(Value::String(self.instr.to_string())),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "a",
            "f",
            "b",
            "c",
            "d",
            "e",
            "h",
            "l",
            "af",
            "bc",
            "de",
            "hl",
            "sp",
            "pc",
            "flags.z",
            "flags.n",
            "flags.h",
            "flags.c",
            "ime",
            "halted",
            "locked",
            "cycles",
            "pending_cycles",
            "instruction",
        ]
    }
}
