//! SM83 conformance harness.
//!
//! Conformance cases are synthesized from the instruction-set model in
//! `sharp-sm83`, then replayed against a device under test one clock edge at
//! a time. Each case gets a fresh [`Testbench`]: reset, inject the
//! pre-state, advance a fixed number of cycles, compare architectural state.

pub mod backend;
pub mod case;
pub mod config;
pub mod dut;
pub mod error;
pub mod export;
pub mod filter;
pub mod harness;
pub mod memory;
pub mod registry;
pub mod report;
pub mod runner;
pub mod synth;
pub mod testbench;

pub use backend::{Backend, BackendKind, ReferenceBackend};
pub use case::{Check, Location, Phase, TestCase};
pub use config::RunConfig;
pub use dut::Dut;
pub use error::{BusFault, CheckFailure, ConfigError, ExportError, SynthesisError};
pub use harness::{BusPolicy, Harness};
pub use memory::MemoryImage;
pub use registry::Registry;
pub use report::{CaseOutcome, CaseResult, RunReport};
pub use testbench::Testbench;
