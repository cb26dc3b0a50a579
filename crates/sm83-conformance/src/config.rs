//! Run configuration from the environment and the command line.

use std::path::PathBuf;

use emu_core::Ticks;

use crate::backend::BackendKind;
use crate::error::ConfigError;
use crate::filter::split_patterns;
use crate::harness::BusPolicy;

/// Backend selector.
pub const ENV_BACKEND: &str = "SM83_SIM";
/// `lenient` or `strict`.
pub const ENV_BUS_POLICY: &str = "SM83_BUS_POLICY";

pub const USAGE: &str = "\
Usage: sm83-conformance [OPTIONS] [PATTERN[,PATTERN...]]...

Runs the synthesized SM83 conformance cases. Patterns are globs over case
names (e.g. 'alu_add_*,rst_*'); with none, every case runs.

Options:
  --list               Print the selected case names and exit
  --export <file>      Write the selected cases as JSON and exit
  --cases <file>       Run cases loaded from a JSON file instead of synthesizing
  --strict             Fail cases that drive undefined values onto the bus
  --lenient            Treat undefined bus values as zero [default]
  --jobs <n>           Run cases on n worker threads [default: 1]
  --half-period <ns>   Clock half-period in nanoseconds [default: 5]
  -h, --help           Show this help

Environment:
  SM83_SIM             Simulator backend (reference)
  SM83_BUS_POLICY      Bus policy (lenient, strict)
  RUST_LOG             Log filter [default: info]";

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub backend: BackendKind,
    pub policy: BusPolicy,
    pub half_period: Ticks,
    pub jobs: usize,
    /// Individual glob patterns, already comma-split.
    pub patterns: Vec<String>,
    pub list: bool,
    pub export: Option<PathBuf>,
    pub cases: Option<PathBuf>,
    pub help: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Reference,
            policy: BusPolicy::Lenient,
            half_period: Ticks::new(5),
            jobs: 1,
            patterns: Vec::new(),
            list: false,
            export: None,
            cases: None,
            help: false,
        }
    }
}

impl RunConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by variables from `lookup`. Empty values are
    /// ignored.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(backend) = var(ENV_BACKEND) {
            config.backend = backend.trim().parse()?;
        }
        if let Some(policy) = var(ENV_BUS_POLICY) {
            config.policy = policy.trim().parse()?;
        }
        Ok(config)
    }

    /// Apply command-line arguments, program name excluded. Flags override
    /// the environment.
    pub fn apply_args<S: AsRef<str>>(mut self, args: &[S]) -> Result<Self, ConfigError> {
        let mut positional = Vec::new();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_ref() {
                "--list" => self.list = true,
                "--strict" => self.policy = BusPolicy::Strict,
                "--lenient" => self.policy = BusPolicy::Lenient,
                "--export" => {
                    i += 1;
                    self.export = Some(PathBuf::from(value(args, i, "--export")?));
                }
                "--cases" => {
                    i += 1;
                    self.cases = Some(PathBuf::from(value(args, i, "--cases")?));
                }
                "--jobs" => {
                    i += 1;
                    self.jobs = number(value(args, i, "--jobs")?, "--jobs")?;
                    if self.jobs == 0 {
                        return Err(ConfigError::InvalidNumber {
                            option: "--jobs",
                            value: "0".to_string(),
                        });
                    }
                }
                "--half-period" => {
                    i += 1;
                    let ns: u64 = number(value(args, i, "--half-period")?, "--half-period")?;
                    if ns == 0 {
                        return Err(ConfigError::InvalidNumber {
                            option: "--half-period",
                            value: "0".to_string(),
                        });
                    }
                    self.half_period = Ticks::new(ns);
                }
                "--help" | "-h" => self.help = true,
                other if other.starts_with('-') => {
                    return Err(ConfigError::UnknownArgument(other.to_string()));
                }
                other => positional.push(other.to_string()),
            }
            i += 1;
        }
        self.patterns.extend(split_patterns(positional.as_slice()));
        Ok(self)
    }

    /// Environment first, then `args`.
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        Self::from_env()?.apply_args(args)
    }
}

fn value<'a, S: AsRef<str>>(args: &'a [S], i: usize, option: &'static str) -> Result<&'a str, ConfigError> {
    args.get(i)
        .map(AsRef::as_ref)
        .ok_or(ConfigError::MissingValue(option))
}

fn number<T: std::str::FromStr>(value: &str, option: &'static str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        option,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn defaults() {
        let config = RunConfig::from_vars(vars(&[])).expect("config");
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.half_period, Ticks::new(5));
        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn environment_selects_backend_and_policy() {
        let config =
            RunConfig::from_vars(vars(&[("SM83_SIM", "reference"), ("SM83_BUS_POLICY", "Strict")]))
                .expect("config");
        assert_eq!(config.backend, BackendKind::Reference);
        assert_eq!(config.policy, BusPolicy::Strict);
    }

    #[test]
    fn unknown_backend_is_an_error() {
        assert_eq!(
            RunConfig::from_vars(vars(&[("SM83_SIM", "icarus")])),
            Err(ConfigError::UnknownBackend("icarus".to_string()))
        );
    }

    #[test]
    fn flags_override_environment() {
        let config = RunConfig::from_vars(vars(&[("SM83_BUS_POLICY", "strict")]))
            .and_then(|c| c.apply_args(&["--lenient", "--jobs", "4", "alu_*,rst_*", "nop"]))
            .expect("config");
        assert_eq!(config.policy, BusPolicy::Lenient);
        assert_eq!(config.jobs, 4);
        assert_eq!(config.patterns, ["alu_*", "rst_*", "nop"]);
    }

    #[test]
    fn option_values_are_checked() {
        let base = RunConfig::default();
        assert_eq!(
            base.clone().apply_args(&["--jobs"]),
            Err(ConfigError::MissingValue("--jobs"))
        );
        assert_eq!(
            base.clone().apply_args(&["--half-period", "fast"]),
            Err(ConfigError::InvalidNumber {
                option: "--half-period",
                value: "fast".to_string()
            })
        );
        assert_eq!(
            base.apply_args(&["--verbose"]),
            Err(ConfigError::UnknownArgument("--verbose".to_string()))
        );
    }

    #[test]
    fn file_options() {
        let config = RunConfig::default()
            .apply_args(&["--export", "cases.json", "--list"])
            .expect("config");
        assert_eq!(config.export, Some(PathBuf::from("cases.json")));
        assert!(config.list);
    }
}
