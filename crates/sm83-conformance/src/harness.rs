//! Bus responder servicing the DUT on falling edges.

use std::fmt;
use std::str::FromStr;

use emu_core::{Bus, BusPins, Direction, Transaction};
use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::error::{BusFault, ConfigError};
use crate::memory::MemoryImage;

/// What to do when the DUT leaves an enable, address or data line undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusPolicy {
    /// Read as zero, drop the write.
    #[default]
    Lenient,
    /// As lenient, and record a [`BusFault`] once reset has completed.
    Strict,
}

impl FromStr for BusPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for BusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        })
    }
}

/// Memory responder owned by one testbench.
#[derive(Debug)]
pub struct Harness {
    memory: MemoryImage,
    policy: BusPolicy,
    /// Faults are only recorded after the reset sequence.
    armed: bool,
    faults: Vec<BusFault>,
    log: Vec<Transaction>,
}

impl Harness {
    #[must_use]
    pub fn new(memory: MemoryImage, policy: BusPolicy) -> Self {
        Self {
            memory,
            policy,
            armed: false,
            faults: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Start enforcing the bus policy.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Service one falling edge.
    ///
    /// Returns the byte to drive onto data-in for a read, `None` when the
    /// DUT is not reading (data-in keeps its previous value). A floating
    /// enable line counts as deasserted.
    pub fn service(&mut self, cycle: u64, pins: &BusPins) -> Option<u8> {
        if !(pins.read_enable.is_driven() && pins.write_enable.is_driven()) {
            self.fault(BusFault::UndefinedEnable { cycle });
        }
        match pins.direction()? {
            Direction::Read => {
                let Some(address) = pins.address.resolve() else {
                    self.fault(BusFault::UndefinedAddress {
                        cycle,
                        direction: Direction::Read,
                    });
                    return Some(0);
                };
                let data = self.memory.read(address);
                self.record(cycle, address, Direction::Read, data);
                Some(data)
            }
            Direction::Write => {
                match (pins.address.resolve(), pins.data_out.resolve()) {
                    (Some(address), Some(data)) => {
                        self.memory.write(address, data);
                        self.record(cycle, address, Direction::Write, data);
                    }
                    (Some(address), None) => {
                        self.fault(BusFault::UndefinedData { cycle, address });
                    }
                    (None, _) => self.fault(BusFault::UndefinedAddress {
                        cycle,
                        direction: Direction::Write,
                    }),
                }
                None
            }
        }
    }

    fn record(&mut self, cycle: u64, address: u16, direction: Direction, data: u8) {
        trace!("cycle {cycle}: {direction:?} {address:04X} = {data:02X}");
        self.log.push(Transaction {
            cycle,
            address,
            direction,
            data,
        });
    }

    fn fault(&mut self, fault: BusFault) {
        if self.armed && self.policy == BusPolicy::Strict {
            warn!("bus fault: {fault}");
            self.faults.push(fault);
        }
    }

    #[must_use]
    pub fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    #[must_use]
    pub fn policy(&self) -> BusPolicy {
        self.policy
    }

    /// Faults recorded so far under the strict policy.
    #[must_use]
    pub fn faults(&self) -> &[BusFault] {
        &self.faults
    }

    /// Every serviced transaction, oldest first.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use emu_core::Logic;

    use super::*;

    fn harness(policy: BusPolicy) -> Harness {
        Harness::new(
            MemoryImage::new(vec![0x80, 0x3C], BTreeMap::from([(0x8000, 0x42)])),
            policy,
        )
    }

    #[test]
    fn reads_program_then_overlay() {
        let mut harness = harness(BusPolicy::Lenient);
        assert_eq!(harness.service(1, &BusPins::read(0x0001)), Some(0x3C));
        assert_eq!(harness.service(2, &BusPins::read(0x8000)), Some(0x42));
        assert_eq!(harness.service(3, &BusPins::read(0x9000)), Some(0x00));
        assert_eq!(harness.transactions().len(), 3);
    }

    #[test]
    fn writes_land_in_overlay() {
        let mut harness = harness(BusPolicy::Lenient);
        assert_eq!(harness.service(1, &BusPins::write(0xC000, 0x99)), None);
        assert_eq!(harness.memory().overlay_byte(0xC000), 0x99);
    }

    #[test]
    fn undefined_address_reads_zero() {
        let mut harness = harness(BusPolicy::Lenient);
        let pins = BusPins {
            read_enable: Logic::Driven(true),
            ..BusPins::default()
        };
        harness.arm();
        assert_eq!(harness.service(1, &pins), Some(0));
        assert!(harness.faults().is_empty());
    }

    #[test]
    fn strict_policy_records_faults_once_armed() {
        let mut harness = harness(BusPolicy::Strict);
        let pins = BusPins {
            read_enable: Logic::Driven(true),
            ..BusPins::default()
        };
        harness.service(1, &pins);
        assert!(harness.faults().is_empty(), "reset cycles are exempt");

        harness.arm();
        harness.service(2, &pins);
        let write = BusPins {
            data_out: Logic::Undefined,
            ..BusPins::write(0xC000, 0)
        };
        harness.service(3, &write);
        assert_eq!(
            harness.faults(),
            &[
                BusFault::UndefinedAddress {
                    cycle: 2,
                    direction: Direction::Read
                },
                BusFault::UndefinedData {
                    cycle: 3,
                    address: 0xC000
                },
            ]
        );
        assert_eq!(harness.memory().overlay_byte(0xC000), 0);
    }

    #[test]
    fn floating_enables_fault_only_when_strict() {
        let floating = BusPins {
            address: Logic::Driven(0x0000),
            ..BusPins::default()
        };
        let mut lenient = harness(BusPolicy::Lenient);
        lenient.arm();
        assert_eq!(lenient.service(1, &floating), None);
        assert!(lenient.faults().is_empty());

        let mut strict = harness(BusPolicy::Strict);
        strict.arm();
        assert_eq!(strict.service(4, &floating), None);
        let half = BusPins {
            write_enable: Logic::Undefined,
            ..BusPins::read(0x0001)
        };
        assert_eq!(strict.service(5, &half), Some(0x3C));
        assert_eq!(
            strict.faults(),
            &[
                BusFault::UndefinedEnable { cycle: 4 },
                BusFault::UndefinedEnable { cycle: 5 },
            ]
        );
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("STRICT".parse(), Ok(BusPolicy::Strict));
        assert!("loose".parse::<BusPolicy>().is_err());
    }
}
