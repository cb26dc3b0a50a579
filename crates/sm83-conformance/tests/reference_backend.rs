//! The synthesized registry against the reference core.

use std::sync::Arc;

use sharp_sm83::OpcodeMap;
use sm83_conformance::runner::Runner;
use sm83_conformance::{BusPolicy, ReferenceBackend, RunConfig, RunReport, filter, synth};

fn run(config: &RunConfig, patterns: &[&str]) -> RunReport {
    let registry = synth::synthesize().expect("synthesis succeeds");
    let backend = ReferenceBackend::new(Arc::new(OpcodeMap::build().expect("opcode map")));
    let names = filter::select(&registry, &filter::split_patterns(patterns));
    Runner::new(&backend, config).run(&registry, &names)
}

fn assert_all_pass(report: &RunReport) {
    let failures: Vec<String> = report
        .failures()
        .take(10)
        .map(ToString::to_string)
        .collect();
    assert!(
        report.is_success(),
        "{} of {} cases failed:\n{}",
        report.failed(),
        report.total(),
        failures.join("\n")
    );
}

#[test]
fn every_case_passes_lenient() {
    let report = run(&RunConfig::default(), &[]);
    println!("{}", report.summary());
    assert!(report.total() > 250, "registry has {} cases", report.total());
    assert_all_pass(&report);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn every_case_passes_strict() {
    let config = RunConfig {
        policy: BusPolicy::Strict,
        ..RunConfig::default()
    };
    assert_all_pass(&run(&config, &[]));
}

#[test]
fn parallel_run_matches_serial_run() {
    let serial = run(&RunConfig::default(), &["alu_*,rst_*"]);
    let parallel = run(
        &RunConfig {
            jobs: 4,
            ..RunConfig::default()
        },
        &["alu_*,rst_*"],
    );
    assert_eq!(serial, parallel);
    assert_all_pass(&parallel);
}

#[test]
fn unmatched_pattern_fails_the_run() {
    let report = run(&RunConfig::default(), &["nop", "no_such_case"]);
    assert_eq!(report.total(), 2);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.exit_code(), 1);
    assert!(
        report
            .summary()
            .contains("MISSING [no_such_case]: case not found")
    );
}

#[test]
fn slower_clock_changes_nothing() {
    let config = RunConfig {
        half_period: emu_core::Ticks::new(50),
        ..RunConfig::default()
    };
    assert_all_pass(&run(&config, &["ld_*", "push_*", "call_*"]));
}
