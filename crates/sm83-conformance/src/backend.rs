//! Simulator backends: factories for fresh DUT instances.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sharp_sm83::{OpcodeMap, Sm83};

use crate::dut::Dut;
use crate::error::ConfigError;

/// Backend selected by `SM83_SIM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// The behavioural core in `sharp-sm83`.
    #[default]
    Reference,
}

impl BackendKind {
    pub const ALL: [Self; 1] = [Self::Reference];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reference => "reference",
        }
    }

    /// Build the backend.
    #[must_use]
    pub fn create(self, map: Arc<OpcodeMap>) -> Box<dyn Backend> {
        match self {
            Self::Reference => Box::new(ReferenceBackend::new(map)),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownBackend(s.to_string()))
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Produces one independent DUT per case.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// A DUT in its power-on state.
    fn instantiate(&self) -> Box<dyn Dut>;
}

/// Reference core backend.
#[derive(Debug, Clone)]
pub struct ReferenceBackend {
    map: Arc<OpcodeMap>,
}

impl ReferenceBackend {
    #[must_use]
    pub fn new(map: Arc<OpcodeMap>) -> Self {
        Self { map }
    }
}

impl Backend for ReferenceBackend {
    fn name(&self) -> &'static str {
        BackendKind::Reference.name()
    }

    fn instantiate(&self) -> Box<dyn Dut> {
        Box::new(Sm83::new(Arc::clone(&self.map)))
    }
}
