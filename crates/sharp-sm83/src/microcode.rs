//! Bus cycles of an SM83 instruction.
//!
//! The opcode fetch decodes the instruction and queues the bus cycles it
//! still needs. The cycle at the head of the queue drives the pins; it
//! completes on the next rising edge. An instruction that needs the data
//! those cycles deliver asks for a followup, which runs in zero time once
//! the queue drains and may queue further cycles.

/// One M-cycle of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    /// Read opcode at PC, increment PC, decode.
    FetchOpcode,

    /// Read byte at PC into `data_lo`, increment PC.
    ReadImm8,

    /// Read byte at PC into `data_lo`, increment PC.
    ReadImm16Lo,

    /// Read byte at PC into `data_hi`, increment PC.
    ReadImm16Hi,

    /// Read byte at `addr` into `data_lo`.
    ReadMem,

    /// Write `data_lo` to `addr`, then increment `addr`.
    WriteMem,

    /// Write `data_hi` to `addr`.
    WriteMemHi,

    /// Decrement SP without touching the bus.
    DecSp,

    /// Write `data_hi` to SP, then decrement SP.
    PushHi,

    /// Write `data_lo` to SP.
    PushLo,

    /// Read byte at SP into `data_lo`, increment SP.
    PopLo,

    /// Read byte at SP into `data_hi`, increment SP.
    PopHi,

    /// Idle bus cycle.
    Internal,
}

/// CALL queues the most: its fetch, two immediates and three stack cycles.
const CAPACITY: usize = 8;

/// Pending bus cycles of the current instruction.
#[derive(Debug, Clone)]
pub struct MicroOpQueue {
    ops: [MicroOp; CAPACITY],
    len: u8,
    pos: u8,
    followup: bool,
}

impl Default for MicroOpQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MicroOpQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ops: [MicroOp::Internal; CAPACITY],
            len: 0,
            pos: 0,
            followup: false,
        }
    }

    /// Drop everything queued, including a requested followup.
    pub fn clear(&mut self) {
        self.len = 0;
        self.pos = 0;
        self.followup = false;
    }

    pub fn push(&mut self, op: MicroOp) {
        debug_assert!(usize::from(self.len) < CAPACITY, "micro-op queue overflow");
        self.ops[usize::from(self.len)] = op;
        self.len += 1;
    }

    /// Run the instruction's followup once the queued cycles complete.
    pub fn request_followup(&mut self) {
        self.followup = true;
    }

    /// The cycle driving the bus, if any.
    #[must_use]
    pub fn current(&self) -> Option<MicroOp> {
        (self.pos < self.len).then(|| self.ops[usize::from(self.pos)])
    }

    pub fn advance(&mut self) {
        if self.pos < self.len {
            self.pos += 1;
        }
    }

    /// True once per requested followup, after the queued cycles drain.
    pub fn take_followup(&mut self) -> bool {
        let due = self.followup && self.pos >= self.len;
        if due {
            self.followup = false;
        }
        due
    }

    /// Nothing left of the current instruction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.len && !self.followup
    }

    /// Bus cycles still queued, including the current one.
    #[must_use]
    pub fn remaining(&self) -> usize {
        usize::from(self.len - self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_drains_in_order() {
        let mut queue = MicroOpQueue::new();
        queue.push(MicroOp::FetchOpcode);
        queue.push(MicroOp::Internal);
        assert_eq!(queue.remaining(), 2);

        queue.advance();
        assert_eq!(queue.current(), Some(MicroOp::Internal));
        queue.advance();
        queue.advance();
        assert!(queue.is_empty());
        assert_eq!(queue.current(), None);
        assert_eq!(queue.remaining(), 0);
    }

    #[test]
    fn followup_waits_for_the_queue_to_drain() {
        let mut queue = MicroOpQueue::new();
        queue.push(MicroOp::PopLo);
        queue.push(MicroOp::PopHi);
        queue.request_followup();

        assert!(!queue.take_followup());
        queue.advance();
        queue.advance();
        assert!(!queue.is_empty());
        assert!(queue.take_followup());
        assert!(!queue.take_followup());
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_drops_a_pending_followup() {
        let mut queue = MicroOpQueue::new();
        queue.push(MicroOp::ReadImm8);
        queue.request_followup();
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.take_followup());
    }
}
