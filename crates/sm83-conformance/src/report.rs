//! Per-case results and the run summary.

use std::fmt;
use std::fmt::Write as _;

use crate::error::{BusFault, CheckFailure};

/// How one selected case ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    /// The first check that did not match.
    Failed(CheckFailure),
    /// Strict bus policy violations.
    BusFault(Vec<BusFault>),
    /// The case panicked.
    Crashed(String),
    /// A filter pattern named no registered case.
    NotFound,
}

impl CaseOutcome {
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed(_) | Self::BusFault(_) => "FAIL",
            Self::Crashed(_) => "PANIC",
            Self::NotFound => "MISSING",
        }
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed(failure) => write!(f, "{failure}"),
            Self::BusFault(faults) => {
                f.write_str("bus fault")?;
                for fault in faults {
                    write!(f, "; {fault}")?;
                }
                Ok(())
            }
            Self::Crashed(message) => write!(f, "crashed: {message}"),
            Self::NotFound => f.write_str("case not found"),
        }
    }
}

/// Result of one selected case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub name: String,
    pub outcome: CaseOutcome,
    /// Rising edges simulated, reset included.
    pub cycles: u64,
    /// Register dump at the point of failure.
    pub dump: Option<String>,
}

impl CaseResult {
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: CaseOutcome::NotFound,
            cycles: 0,
            dump: None,
        }
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CaseOutcome::Passed => write!(f, "{}: PASS", self.name),
            // The failure already leads with the case name.
            CaseOutcome::Failed(failure) => write!(f, "  FAIL {failure}"),
            outcome => write!(f, "  {} [{}]: {outcome}", outcome.label(), self.name),
        }
    }
}

/// Aggregated results, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub backend: String,
    pub results: Vec<CaseResult>,
}

impl RunReport {
    #[must_use]
    pub fn new(backend: impl Into<String>, results: Vec<CaseResult>) -> Self {
        Self {
            backend: backend.into(),
            results,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_pass()).count()
    }

    /// Failed, faulted, crashed or missing.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|r| !r.outcome.is_pass())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Process exit status: 0 when everything passed, 1 otherwise.
    /// Configuration and synthesis errors exit with 2 before a report exists.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }

    /// Failure lines followed by the totals.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for result in self.failures() {
            let _ = writeln!(out, "{result}");
            if let Some(dump) = &result.dump {
                let _ = writeln!(out, "    {dump}");
            }
        }
        let _ = writeln!(out, "=== SM83 Conformance Summary ({}) ===", self.backend);
        let _ = write!(
            out,
            "Total: {}, Pass: {}, Fail: {}",
            self.total(),
            self.passed(),
            self.failed()
        );
        out
    }
}
