//! SM83 conformance runner binary.
//!
//! Synthesizes (or loads) the conformance cases, filters them by glob and
//! replays them against the selected backend. Exits 0 when every selected
//! case passes, 1 on any failure, 2 on bad configuration or synthesis.

use std::process;
use std::sync::Arc;

use anyhow::Context;
use env_logger::Env;
use log::{error, info};

use sharp_sm83::OpcodeMap;
use sm83_conformance::config::USAGE;
use sm83_conformance::runner::Runner;
use sm83_conformance::{RunConfig, export, filter, synth};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            error!("{err:#}");
            process::exit(2);
        }
    }
}

fn run() -> anyhow::Result<i32> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = RunConfig::parse_args(&args).context("invalid configuration")?;
    if config.help {
        println!("{USAGE}");
        return Ok(0);
    }

    let registry = match &config.cases {
        Some(path) => export::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => synth::synthesize().context("synthesizing conformance cases")?,
    };
    let names = filter::select(&registry, &config.patterns);

    if config.list {
        for name in &names {
            println!("{name}");
        }
        return Ok(0);
    }

    if let Some(path) = &config.export {
        let cases = names.iter().filter_map(|name| registry.get(name));
        export::save(path, cases).with_context(|| format!("writing {}", path.display()))?;
        info!("exported {} cases to {}", names.len(), path.display());
        return Ok(0);
    }

    let map = Arc::new(OpcodeMap::build().context("building opcode map")?);
    let backend = config.backend.create(map);
    info!(
        "running {} of {} cases on {} ({} policy, {} half-period, {} jobs)",
        names.len(),
        registry.len(),
        backend.name(),
        config.policy,
        config.half_period,
        config.jobs
    );

    let report = Runner::new(backend.as_ref(), &config).run(&registry, &names);
    println!("{}", report.summary());
    Ok(report.exit_code())
}
