//! Broken devices must be caught, and caught one case at a time.

use std::sync::Arc;

use emu_core::{BusPins, Logic, Observable, Value};
use sharp_sm83::{OpcodeMap, RegGroup, Sm83};
use sm83_conformance::runner::Runner;
use sm83_conformance::{
    Backend, BusFault, BusPolicy, CaseOutcome, Dut, Location, Registry, RunConfig, synth,
};

#[derive(Debug, Clone, Copy)]
enum Defect {
    /// HL reads back with bit 0 flipped.
    CorruptHl,
    /// Data-out floats during writes.
    FloatingWrites,
    /// Neither enable line is ever driven.
    FloatingEnables,
    /// Panics once the core has run this many cycles.
    PanicAfter(u64),
}

struct Faulty {
    inner: Sm83,
    defect: Defect,
}

impl Observable for Faulty {
    fn query(&self, path: &str) -> Option<Value> {
        self.inner.query(path)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        self.inner.query_paths()
    }
}

impl Dut for Faulty {
    fn set_reset(&mut self, asserted: bool) {
        self.inner.set_reset(asserted);
    }

    fn set_data_in(&mut self, value: Logic<u8>) {
        self.inner.set_data_in(value);
    }

    fn rising_edge(&mut self) {
        if let Defect::PanicAfter(limit) = self.defect {
            assert!(self.inner.cycles() < limit, "core wedged at cycle {limit}");
        }
        self.inner.rising_edge();
    }

    fn falling_edge(&mut self) {
        self.inner.falling_edge();
    }

    fn pins(&self) -> BusPins {
        let pins = self.inner.pins();
        match self.defect {
            Defect::FloatingWrites if pins.write_enable.is_high() => BusPins {
                data_out: Logic::Undefined,
                ..pins
            },
            Defect::FloatingEnables => BusPins {
                read_enable: Logic::Undefined,
                write_enable: Logic::Undefined,
                ..pins
            },
            _ => pins,
        }
    }

    fn read_group(&self, group: RegGroup) -> u16 {
        let value = self.inner.read_group(group);
        match (self.defect, group) {
            (Defect::CorruptHl, RegGroup::Hl) => value ^ 1,
            _ => value,
        }
    }

    fn write_group(&mut self, group: RegGroup, value: u16) {
        self.inner.write_group(group, value);
    }
}

struct FaultyBackend {
    map: Arc<OpcodeMap>,
    defect: Defect,
}

impl Backend for FaultyBackend {
    fn name(&self) -> &'static str {
        "faulty"
    }

    fn instantiate(&self) -> Box<dyn Dut> {
        Box::new(Faulty {
            inner: Sm83::new(Arc::clone(&self.map)),
            defect: self.defect,
        })
    }
}

fn backend(defect: Defect) -> FaultyBackend {
    FaultyBackend {
        map: Arc::new(OpcodeMap::build().expect("opcode map")),
        defect,
    }
}

fn registry() -> Registry {
    synth::synthesize().expect("synthesis succeeds")
}

fn outcome(backend: &FaultyBackend, config: &RunConfig, name: &str) -> CaseOutcome {
    let registry = registry();
    let case = registry.get(name).expect("case is registered");
    Runner::new(backend, config).run_case(case).outcome
}

#[test]
fn corrupted_register_fails_only_dependent_cases() {
    let backend = backend(Defect::CorruptHl);
    let config = RunConfig::default();

    match outcome(&backend, &config, "inc_16bit_hl") {
        CaseOutcome::Failed(failure) => {
            assert_eq!(failure.location, Location::Group(RegGroup::Hl));
            assert_eq!(failure.expected, 0x1001);
            assert_eq!(failure.actual, 0x1000);
        }
        other => panic!("expected a check failure, got {other}"),
    }
    assert_eq!(outcome(&backend, &config, "nop"), CaseOutcome::Passed);
    assert_eq!(outcome(&backend, &config, "inc_16bit_bc"), CaseOutcome::Passed);
}

#[test]
fn floating_writes_are_bus_faults_under_strict_policy() {
    let backend = backend(Defect::FloatingWrites);
    let strict = RunConfig {
        policy: BusPolicy::Strict,
        ..RunConfig::default()
    };

    match outcome(&backend, &strict, "push_then_pop_roundtrip_bc_to_de") {
        CaseOutcome::BusFault(faults) => {
            assert_eq!(faults.len(), 2);
            assert!(
                faults
                    .iter()
                    .all(|fault| matches!(fault, BusFault::UndefinedData { .. }))
            );
        }
        other => panic!("expected bus faults, got {other}"),
    }
}

#[test]
fn floating_writes_are_dropped_under_lenient_policy() {
    let backend = backend(Defect::FloatingWrites);

    match outcome(&backend, &RunConfig::default(), "push_then_pop_roundtrip_bc_to_de") {
        CaseOutcome::Failed(failure) => {
            assert_eq!(failure.location, Location::Memory(0xC1FE));
            assert_eq!(failure.actual, 0);
        }
        other => panic!("expected a memory mismatch, got {other}"),
    }
}

#[test]
fn floating_enables_are_bus_faults_under_strict_policy() {
    let backend = backend(Defect::FloatingEnables);
    let strict = RunConfig {
        policy: BusPolicy::Strict,
        ..RunConfig::default()
    };

    match outcome(&backend, &strict, "nop") {
        CaseOutcome::BusFault(faults) => {
            assert!(!faults.is_empty());
            assert!(
                faults
                    .iter()
                    .all(|fault| matches!(fault, BusFault::UndefinedEnable { .. }))
            );
        }
        other => panic!("expected bus faults, got {other}"),
    }
}

#[test]
fn floating_enables_read_as_idle_under_lenient_policy() {
    // Data-in holds the zero left by reset, which the core fetches as NOP.
    let backend = backend(Defect::FloatingEnables);
    assert_eq!(
        outcome(&backend, &RunConfig::default(), "nop"),
        CaseOutcome::Passed
    );
}

#[test]
fn panic_is_contained_to_its_case() {
    let backend = backend(Defect::PanicAfter(3));
    let registry = registry();
    let names: Vec<String> = ["nop", "call_a16", "ld_a_n8"]
        .into_iter()
        .map(str::to_string)
        .collect();

    let report = Runner::new(&backend, &RunConfig::default()).run(&registry, &names);

    assert_eq!(report.results[0].outcome, CaseOutcome::Passed);
    assert_eq!(
        report.results[1].outcome,
        CaseOutcome::Crashed("core wedged at cycle 3".to_string())
    );
    assert_eq!(report.results[2].outcome, CaseOutcome::Passed);
    assert_eq!(report.exit_code(), 1);
    assert!(report.summary().contains("PANIC [call_a16]"));
}
