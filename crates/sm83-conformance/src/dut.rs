//! Pin-level contract of a device under test.

use emu_core::{BusPins, Logic, Observable};
use sharp_sm83::{RegGroup, Sm83};

/// A clocked SM83 core as seen from the testbench.
///
/// Outputs in [`pins`](Dut::pins) reflect the state after the most recent
/// edge. Inputs set with [`set_reset`](Dut::set_reset) and
/// [`set_data_in`](Dut::set_data_in) are sampled on the next rising edge.
/// The register backdoor bypasses the bus and is only used between reset
/// and the first cycle of a case, or when checking state.
pub trait Dut: Observable + Send {
    fn set_reset(&mut self, asserted: bool);
    fn set_data_in(&mut self, value: Logic<u8>);
    fn rising_edge(&mut self);
    fn falling_edge(&mut self);
    fn pins(&self) -> BusPins;
    fn read_group(&self, group: RegGroup) -> u16;
    fn write_group(&mut self, group: RegGroup, value: u16);
}

impl Dut for Sm83 {
    fn set_reset(&mut self, asserted: bool) {
        Sm83::set_reset(self, asserted);
    }

    fn set_data_in(&mut self, value: Logic<u8>) {
        Sm83::set_data_in(self, value);
    }

    fn rising_edge(&mut self) {
        Sm83::rising_edge(self);
    }

    fn falling_edge(&mut self) {
        Sm83::falling_edge(self);
    }

    fn pins(&self) -> BusPins {
        Sm83::pins(self)
    }

    fn read_group(&self, group: RegGroup) -> u16 {
        Sm83::read_group(self, group)
    }

    fn write_group(&mut self, group: RegGroup, value: u16) {
        Sm83::write_group(self, group, value);
    }
}
