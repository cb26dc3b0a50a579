//! JSON case files.
//!
//! A case file carries a format version and the cases in order. Loading one
//! goes through [`Registry::from_cases`], so the same name and shape rules
//! apply as for synthesized cases.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::case::TestCase;
use crate::error::ExportError;
use crate::registry::Registry;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CaseFileRef<'a> {
    version: u32,
    cases: Vec<&'a TestCase>,
}

#[derive(Deserialize)]
struct CaseFile {
    version: u32,
    cases: Vec<TestCase>,
}

/// Serialize cases to pretty-printed JSON.
pub fn to_json<'a>(cases: impl IntoIterator<Item = &'a TestCase>) -> Result<String, ExportError> {
    let file = CaseFileRef {
        version: FORMAT_VERSION,
        cases: cases.into_iter().collect(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Parse a case file into a registry.
pub fn from_json(json: &str) -> Result<Registry, ExportError> {
    let file: CaseFile = serde_json::from_str(json)?;
    if file.version != FORMAT_VERSION {
        return Err(ExportError::Version {
            found: file.version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(Registry::from_cases(file.cases)?)
}

pub fn save<'a>(path: &Path, cases: impl IntoIterator<Item = &'a TestCase>) -> Result<(), ExportError> {
    fs::write(path, to_json(cases)?)?;
    Ok(())
}

pub fn load(path: &Path) -> Result<Registry, ExportError> {
    from_json(&fs::read_to_string(path)?)
}
