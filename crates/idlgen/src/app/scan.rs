//! Best-effort service discovery in IDL sources.
//!
//! This is a textual heuristic rather than a parser: comments are stripped and
//! the remainder is searched for `service <Name>`. A `service` keyword inside
//! a string literal is still counted.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::errors::IdlError;
use crate::domain::model::ServiceNameSet;

static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| compile(r"(?s)/\*.*?\*/"));
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| compile(r"//.*"));
static SERVICE: Lazy<Regex> =
    Lazy::new(|| compile(r"\bservice\s+([A-Za-z_][A-Za-z0-9_]*)\b"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex is valid")
}

/// Read `path` and collect the names of the services it declares.
pub fn scan_services(path: impl AsRef<Path>) -> Result<ServiceNameSet, IdlError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| IdlError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    Ok(services_in(&source))
}

/// Service names declared in `source`, ignoring commented-out declarations.
pub fn services_in(source: &str) -> ServiceNameSet {
    let stripped = BLOCK_COMMENT.replace_all(source, " ");
    let stripped = LINE_COMMENT.replace_all(&stripped, " ");

    SERVICE
        .captures_iter(&stripped)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str().to_owned())
        .collect()
}
