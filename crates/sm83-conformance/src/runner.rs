//! Case execution.
//!
//! Every case gets its own [`Testbench`]: a fresh DUT from the backend, a
//! fresh harness over the case's memory image, the reset sequence, then the
//! register pre-state. Phases advance the clock and compare state; the first
//! mismatch ends the case. Panics are caught per case so one broken core
//! path cannot take the whole run down.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use emu_core::Ticks;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::backend::Backend;
use crate::case::TestCase;
use crate::config::RunConfig;
use crate::error::CheckFailure;
use crate::harness::BusPolicy;
use crate::memory::MemoryImage;
use crate::registry::Registry;
use crate::report::{CaseOutcome, CaseResult, RunReport};
use crate::testbench::Testbench;

/// Runs cases against one backend.
pub struct Runner<'a> {
    backend: &'a dyn Backend,
    policy: BusPolicy,
    half_period: Ticks,
    jobs: usize,
}

impl<'a> Runner<'a> {
    #[must_use]
    pub fn new(backend: &'a dyn Backend, config: &RunConfig) -> Self {
        Self {
            backend,
            policy: config.policy,
            half_period: config.half_period,
            jobs: config.jobs.max(1),
        }
    }

    /// Run `names` in order. Names missing from the registry report as
    /// [`CaseOutcome::NotFound`].
    pub fn run(&self, registry: &Registry, names: &[String]) -> RunReport {
        let results = if self.jobs > 1 {
            self.run_parallel(registry, names)
        } else {
            names.iter().map(|name| self.run_named(registry, name)).collect()
        };
        let report = RunReport::new(self.backend.name(), results);
        info!(
            "{}: {}/{} cases passed",
            report.backend,
            report.passed(),
            report.total()
        );
        report
    }

    fn run_parallel(&self, registry: &Registry, names: &[String]) -> Vec<CaseResult> {
        match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool.install(|| {
                names
                    .par_iter()
                    .map(|name| self.run_named(registry, name))
                    .collect()
            }),
            Err(err) => {
                warn!("could not start {} worker threads ({err}), running serially", self.jobs);
                names.iter().map(|name| self.run_named(registry, name)).collect()
            }
        }
    }

    fn run_named(&self, registry: &Registry, name: &str) -> CaseResult {
        match registry.get(name) {
            Some(case) => self.run_case(case),
            None => {
                debug!("{name}: not registered");
                CaseResult::not_found(name)
            }
        }
    }

    /// Run one case on a fresh testbench.
    #[must_use]
    pub fn run_case(&self, case: &TestCase) -> CaseResult {
        debug!("{}: start ({} cycles)", case.name, case.total_cycles());
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute(case)))
            .unwrap_or_else(|payload| CaseResult {
                name: case.name.clone(),
                outcome: CaseOutcome::Crashed(panic_message(payload.as_ref())),
                cycles: 0,
                dump: None,
            });
        debug!("{}: {}", case.name, result.outcome);
        result
    }

    fn execute(&self, case: &TestCase) -> CaseResult {
        let memory = MemoryImage::new(case.program.clone(), case.overlay.clone());
        let mut tb = Testbench::new(self.backend.instantiate(), memory, self.policy, self.half_period);

        tb.reset();
        for &(group, value) in &case.setup {
            tb.inject(group, value);
        }

        let outcome = phases(&mut tb, case);
        debug!(
            "{}: {} bus transactions in {}",
            case.name,
            tb.harness().transactions().len(),
            tb.now()
        );
        let dump = (!outcome.is_pass()).then(|| tb.dump());
        CaseResult {
            name: case.name.clone(),
            outcome,
            cycles: tb.rising_edges(),
            dump,
        }
    }
}

fn phases(tb: &mut Testbench, case: &TestCase) -> CaseOutcome {
    for phase in &case.phases {
        tb.advance(phase.cycles);

        let faults = tb.harness().faults();
        if !faults.is_empty() {
            return CaseOutcome::BusFault(faults.to_vec());
        }

        for check in &phase.checks {
            let actual = tb.observe(check.location);
            if !check.matches(actual) {
                return CaseOutcome::Failed(CheckFailure {
                    case: case.name.clone(),
                    description: case.description.clone(),
                    location: check.location,
                    expected: check.expected,
                    actual,
                    mask: check.mask,
                });
            }
        }
    }
    CaseOutcome::Passed
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unimplemented or crash".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sharp_sm83::{OpcodeMap, RegGroup};

    use super::*;
    use crate::backend::ReferenceBackend;
    use crate::case::{Check, Location};

    fn backend() -> ReferenceBackend {
        ReferenceBackend::new(Arc::new(OpcodeMap::build().expect("opcode map")))
    }

    #[test]
    fn passing_case_counts_cycles() {
        let backend = backend();
        let runner = Runner::new(&backend, &RunConfig::default());
        let case = TestCase::new("nop", "NOP", vec![0x00]).phase(1, vec![Check::group(RegGroup::Pc, 1)]);
        let result = runner.run_case(&case);
        assert_eq!(result.outcome, CaseOutcome::Passed);
        assert_eq!(result.cycles, 4);
        assert_eq!(result.dump, None);
    }

    #[test]
    fn first_mismatch_is_reported() {
        let backend = backend();
        let runner = Runner::new(&backend, &RunConfig::default());
        // LD A,n
        let case = TestCase::new("ld_a_n8", "LD A,n", vec![0x3E, 0x42])
            .phase(2, vec![Check::a(0x41), Check::group(RegGroup::Pc, 0x9999)]);
        let result = runner.run_case(&case);
        let CaseOutcome::Failed(failure) = &result.outcome else {
            panic!("expected a failure, got {}", result.outcome);
        };
        assert_eq!(failure.location, Location::A);
        assert_eq!(failure.expected, 0x41);
        assert_eq!(failure.actual, 0x42);
        assert!(result.dump.is_some());
    }

    #[test]
    fn report_keeps_selection_order() {
        let backend = backend();
        let config = RunConfig {
            jobs: 3,
            ..RunConfig::default()
        };
        let runner = Runner::new(&backend, &config);
        let registry = Registry::from_cases((0u16..6).map(|n| {
            TestCase::new(format!("nop_{n}"), "NOP", vec![0x00; 8])
                .phase(u32::from(n) + 1, vec![Check::group(RegGroup::Pc, n + 1)])
        }))
        .expect("registry");
        let names: Vec<String> = ["nop_5", "nop_0", "absent", "nop_3"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let report = runner.run(&registry, &names);
        let order: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, names);
        assert_eq!(report.passed(), 3);
        assert_eq!(report.results[2].outcome, CaseOutcome::NotFound);
    }

    #[test]
    fn panic_payloads() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&7u8), "unimplemented or crash");
    }
}
