//! Pin-level bus signals of a clocked device.

use crate::Logic;

/// Outputs a device presents on its bus during one clock cycle.
///
/// Read-enable and write-enable are mutually exclusive on a well-behaved
/// device. A responder treats an undefined enable line as deasserted and
/// may report it as a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusPins {
    /// 16-bit address of the current transaction.
    pub address: Logic<u16>,
    /// Byte supplied for a write.
    pub data_out: Logic<u8>,
    pub read_enable: Logic<bool>,
    pub write_enable: Logic<bool>,
}

impl BusPins {
    /// No transaction this cycle.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            address: Logic::Undefined,
            data_out: Logic::Undefined,
            read_enable: Logic::Driven(false),
            write_enable: Logic::Driven(false),
        }
    }

    /// A read request at `address`.
    #[must_use]
    pub const fn read(address: u16) -> Self {
        Self {
            address: Logic::Driven(address),
            data_out: Logic::Undefined,
            read_enable: Logic::Driven(true),
            write_enable: Logic::Driven(false),
        }
    }

    /// A write request of `value` to `address`.
    #[must_use]
    pub const fn write(address: u16, value: u8) -> Self {
        Self {
            address: Logic::Driven(address),
            data_out: Logic::Driven(value),
            read_enable: Logic::Driven(false),
            write_enable: Logic::Driven(true),
        }
    }

    /// The direction requested this cycle, if any. Read wins if a faulty
    /// device asserts both enables.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        if self.read_enable.is_high() {
            Some(Direction::Read)
        } else if self.write_enable.is_high() {
            Some(Direction::Write)
        } else {
            None
        }
    }
}

/// Direction of a bus transaction, from the device's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Read,
    Write,
}

/// One serviced bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    /// Rising-edge count at which the transaction was serviced.
    pub cycle: u64,
    pub address: u16,
    pub direction: Direction,
    pub data: u8,
}
