//! Per-case clock, DUT and bus harness.

use emu_core::{Clock, Edge, Logic, Observable, Ticks};
use sharp_sm83::RegGroup;

use crate::case::Location;
use crate::dut::Dut;
use crate::harness::{BusPolicy, Harness};
use crate::memory::MemoryImage;

/// Owns everything one case touches. Dropping it ends the case; nothing
/// outlives it.
pub struct Testbench {
    clock: Clock,
    dut: Box<dyn Dut>,
    harness: Harness,
}

impl Testbench {
    #[must_use]
    pub fn new(dut: Box<dyn Dut>, memory: MemoryImage, policy: BusPolicy, half_period: Ticks) -> Self {
        Self {
            clock: Clock::new(half_period),
            dut,
            harness: Harness::new(memory, policy),
        }
    }

    /// Advance to the next clock transition.
    ///
    /// The DUT samples on the rising edge. The harness answers the pins the
    /// DUT presents on the falling edge.
    fn half_cycle(&mut self) -> Edge {
        let edge = self.clock.toggle();
        match edge {
            Edge::Rising => self.dut.rising_edge(),
            Edge::Falling => {
                let pins = self.dut.pins();
                if let Some(data) = self.harness.service(self.clock.rising_edges(), &pins) {
                    self.dut.set_data_in(Logic::Driven(data));
                }
                self.dut.falling_edge();
            }
        }
        edge
    }

    fn wait_for(&mut self, edge: Edge) {
        while self.half_cycle() != edge {}
    }

    /// Reset sequence: hold reset for two rising edges with data-in at zero,
    /// release it, then wait one more rising edge. The DUT's PC is 0 after.
    pub fn reset(&mut self) {
        self.dut.set_reset(true);
        self.dut.set_data_in(Logic::Driven(0));
        self.wait_for(Edge::Rising);
        self.wait_for(Edge::Rising);
        self.dut.set_reset(false);
        self.wait_for(Edge::Rising);
        self.harness.arm();
    }

    /// Wait for `cycles` rising edges, then one falling edge, so state is
    /// stable and bus writes from the last cycle are captured.
    pub fn advance(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.wait_for(Edge::Rising);
        }
        self.wait_for(Edge::Falling);
    }

    /// Register backdoor write, for pre-state injection.
    pub fn inject(&mut self, group: RegGroup, value: u16) {
        self.dut.write_group(group, value);
    }

    /// Actual value at a check location.
    #[must_use]
    pub fn observe(&self, location: Location) -> u16 {
        match location {
            Location::Reg8 { group, shift } => (self.dut.read_group(group) >> shift) & 0xFF,
            Location::Group(group) => self.dut.read_group(group),
            Location::Flags => (self.dut.read_group(RegGroup::Af) >> 4) & 0x0F,
            Location::Memory(address) => u16::from(self.harness.memory().overlay_byte(address)),
        }
    }

    /// Register dump for failure reports.
    #[must_use]
    pub fn dump(&self) -> String {
        self.dut.dump()
    }

    #[must_use]
    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    #[must_use]
    pub fn dut(&self) -> &dyn Dut {
        self.dut.as_ref()
    }

    /// Simulated time since the testbench was created.
    #[must_use]
    pub fn now(&self) -> Ticks {
        self.clock.now()
    }

    /// Rising edges since the testbench was created, reset included.
    #[must_use]
    pub fn rising_edges(&self) -> u64 {
        self.clock.rising_edges()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use sharp_sm83::{OpcodeMap, Sm83};

    use super::*;

    fn bench(program: Vec<u8>) -> Testbench {
        let map = Arc::new(OpcodeMap::build().expect("opcode map"));
        Testbench::new(
            Box::new(Sm83::new(map)),
            MemoryImage::new(program, BTreeMap::new()),
            BusPolicy::Strict,
            Ticks::new(5),
        )
    }

    #[test]
    fn reset_takes_three_rising_edges() {
        let mut tb = bench(vec![0x00]);
        tb.reset();
        assert_eq!(tb.rising_edges(), 3);
        assert_eq!(tb.now(), Ticks::new(25));
        assert_eq!(tb.observe(Location::Group(RegGroup::Pc)), 0);
        assert!(tb.harness().faults().is_empty());
    }

    #[test]
    fn advance_ends_on_falling_edge() {
        let mut tb = bench(vec![0x00, 0x00]);
        tb.reset();
        tb.advance(1);
        assert_eq!(tb.rising_edges(), 4);
        assert_eq!(tb.now(), Ticks::new(40));
        assert_eq!(tb.observe(Location::Group(RegGroup::Pc)), 1);
    }

    #[test]
    fn injected_state_is_visible_to_first_fetch() {
        // LD A,(HL)
        let mut tb = bench(vec![0x7E]);
        tb.reset();
        tb.inject(RegGroup::Hl, 0x0000);
        tb.advance(2);
        assert_eq!(tb.observe(Location::A), 0x7E);
        assert!(tb.dump().contains("hl=0x0000"));
    }
}
