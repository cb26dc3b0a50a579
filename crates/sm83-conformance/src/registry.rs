//! Named collection of conformance cases, in registration order.

use indexmap::IndexMap;

use crate::case::TestCase;
use crate::error::SynthesisError;

/// Cases keyed by name. Iteration follows registration order, which is also
/// the order glob filters expand in.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    cases: IndexMap<String, TestCase>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an existing list, e.g. cases loaded from a file.
    pub fn from_cases(cases: impl IntoIterator<Item = TestCase>) -> Result<Self, SynthesisError> {
        let mut registry = Self::new();
        for case in cases {
            registry.register(case)?;
        }
        Ok(registry)
    }

    /// Add a case. Names are unique; a case needs a program and at least one
    /// phase.
    pub fn register(&mut self, case: TestCase) -> Result<(), SynthesisError> {
        if self.cases.contains_key(&case.name) {
            return Err(SynthesisError::DuplicateCase(case.name));
        }
        if case.program.is_empty() {
            return Err(SynthesisError::InvalidCase {
                case: case.name,
                reason: "empty program".to_string(),
            });
        }
        if case.phases.is_empty() {
            return Err(SynthesisError::InvalidCase {
                case: case.name,
                reason: "no phases".to_string(),
            });
        }
        if case.program.len() > 0x1_0000 {
            return Err(SynthesisError::InvalidCase {
                case: case.name,
                reason: format!("program of {} bytes exceeds the address space", case.program.len()),
            });
        }
        self.cases.insert(case.name.clone(), case);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TestCase> {
        self.cases.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cases.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
