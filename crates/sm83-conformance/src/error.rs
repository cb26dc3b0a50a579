//! Error types.

use emu_core::Direction;
use serde::{Deserialize, Serialize};
use sharp_sm83::{EncodingError, Flags};

use crate::case::Location;

/// Case synthesis failed. Nothing is simulated after this.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error("opcode encoding: {0}")]
    Encoding(#[from] EncodingError),
    #[error("duplicate case name: {0}")]
    DuplicateCase(String),
    #[error("case {case}: {reason}")]
    InvalidCase { case: String, reason: String },
}

/// Bad configuration from the environment or the command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown simulator backend {0:?} (available: reference)")]
    UnknownBackend(String),
    #[error("unknown bus policy {0:?} (expected lenient or strict)")]
    UnknownPolicy(String),
    #[error("invalid value {value:?} for {option}")]
    InvalidNumber { option: &'static str, value: String },
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Reading or writing a case file failed.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("case file I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("case file JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("case file format version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("case file: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// One failed state comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error(
    "{case}: {description}: {location} expected {} got {}{}",
    render(&self.location, self.expected),
    render(&self.location, self.actual),
    mask_suffix(self.mask)
)]
pub struct CheckFailure {
    pub case: String,
    pub description: String,
    pub location: Location,
    pub expected: u16,
    pub actual: u16,
    pub mask: Option<u16>,
}

fn mask_suffix(mask: Option<u16>) -> String {
    mask.map(|mask| format!(" (mask {mask:#06X})")).unwrap_or_default()
}

fn render(location: &Location, value: u16) -> String {
    match location {
        Location::Flags => format!("[{}]", Flags::from_nibble(value as u8)),
        Location::Group(_) => format!("{value:#06X}"),
        Location::Reg8 { .. } | Location::Memory(_) => format!("{value:#04X}"),
    }
}

/// The DUT put an undefined value on the bus after reset completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusFault {
    #[error("cycle {cycle}: undefined bus enable")]
    UndefinedEnable { cycle: u64 },
    #[error("cycle {cycle}: undefined address on {direction:?}")]
    UndefinedAddress { cycle: u64, direction: Direction },
    #[error("cycle {cycle}: undefined data written to {address:#06X}")]
    UndefinedData { cycle: u64, address: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharp_sm83::RegGroup;

    #[test]
    fn flag_failures_render_per_bit() {
        let failure = CheckFailure {
            case: "daa_1".to_string(),
            description: "DAA result".to_string(),
            location: Location::Flags,
            expected: 0b1001,
            actual: 0b0001,
            mask: None,
        };
        assert_eq!(
            failure.to_string(),
            "daa_1: DAA result: flags expected [Z1 N0 H0 C1] got [Z0 N0 H0 C1]"
        );
    }

    #[test]
    fn masked_group_failure() {
        let failure = CheckFailure {
            case: "pop_af".to_string(),
            description: "AF".to_string(),
            location: Location::Group(RegGroup::Af),
            expected: 0x12F0,
            actual: 0x12FF,
            mask: Some(0xFFF0),
        };
        assert_eq!(
            failure.to_string(),
            "pop_af: AF: AF expected 0x12F0 got 0x12FF (mask 0xFFF0)"
        );
        let boxed: Box<dyn std::error::Error> = Box::new(failure);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn enable_faults_name_the_cycle() {
        assert_eq!(
            BusFault::UndefinedEnable { cycle: 7 }.to_string(),
            "cycle 7: undefined bus enable"
        );
    }
}
