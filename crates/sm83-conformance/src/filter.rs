//! Case selection by glob pattern.

use glob::Pattern;
use indexmap::IndexSet;
use log::warn;

use crate::registry::Registry;

/// Split comma-separated arguments into individual patterns.
pub fn split_patterns<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.as_ref().split(','))
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand patterns against registry names.
///
/// No patterns selects every case. Each pattern expands in registration
/// order; a name selected twice is kept at its first position. A pattern
/// that matches nothing (or is not a valid glob) is kept verbatim so it
/// reports as a missing case.
pub fn select(registry: &Registry, patterns: &[String]) -> Vec<String> {
    if patterns.is_empty() {
        return registry.names().map(str::to_string).collect();
    }

    let mut selected = IndexSet::new();
    for pattern in patterns {
        let matched: Vec<&str> = match Pattern::new(pattern) {
            Ok(glob) => registry.names().filter(|name| glob.matches(name)).collect(),
            Err(err) => {
                warn!("pattern {pattern:?} is not a valid glob ({err}), matching literally");
                registry.names().filter(|name| *name == pattern.as_str()).collect()
            }
        };
        if matched.is_empty() {
            warn!("pattern {pattern:?} matched no cases");
            selected.insert(pattern.clone());
        } else {
            selected.extend(matched.into_iter().map(str::to_string));
        }
    }
    selected.into_iter().collect()
}
