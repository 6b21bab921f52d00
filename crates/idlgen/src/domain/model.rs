//! Domain models for IDL inputs and generation parameters.

use std::collections::BTreeSet;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Separator between fragments of an IDL path expression.
pub const LIST_DELIMITER: char = ';';

/// Service names declared by one IDL file.
pub type ServiceNameSet = BTreeSet<String>;

/// Sorted, duplicate-free list of IDL files confirmed to exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedFileSet(Vec<String>);

impl ResolvedFileSet {
    /// Sort and deduplicate `paths` into a resolved set.
    pub fn from_unsorted(mut paths: Vec<String>) -> Self {
        paths.sort();
        paths.dedup();
        Self(paths)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Render the set back into an expression with one literal per fragment.
    pub fn to_expression(&self) -> String {
        self.0.join(&LIST_DELIMITER.to_string())
    }
}

impl IntoIterator for ResolvedFileSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResolvedFileSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Kind of code to generate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum GenerateType {
    /// One generator run per resolved IDL file.
    #[default]
    Rpc,
    /// A single generator run against the root IDL.
    Http,
}

impl GenerateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerateType::Rpc => "rpc",
            GenerateType::Http => "http",
        }
    }
}

impl fmt::Display for GenerateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters shared by every kind of generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonParams {
    /// Service name override; empty means the generator infers it.
    pub service_name: String,
    pub generate_type: GenerateType,
    /// Module (package) name of the generated code.
    pub module: String,
    /// Raw IDL path expression, or a single file once dispatched.
    pub idl_path: String,
    pub out_dir: String,
    pub registry: String,
}

/// List-valued parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceParams {
    /// Flags passed through to the generator untouched.
    pub pass: Vec<String>,
    pub proto_search_path: Vec<String>,
}

impl SliceParams {
    pub const PASS: &'static str = "pass";
    pub const PROTO_SEARCH_PATH: &'static str = "proto_search_path";

    /// Fill a list field from a whitespace separated answer.
    pub fn write_answer(&mut self, name: &str, value: &str) {
        let items = value.split_whitespace().map(str::to_owned).collect();
        match name {
            Self::PASS => self.pass = items,
            Self::PROTO_SEARCH_PATH => self.proto_search_path = items,
            _ => {}
        }
    }
}

/// Complete parameter record handed to the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationParameters {
    pub common: CommonParams,
    pub slice: SliceParams,
    pub verbose: bool,
}

impl GenerationParameters {
    /// Private copy targeting exactly one IDL file.
    ///
    /// List fields get their own storage. The service name override survives
    /// only when `keep_service_name` is set.
    pub fn isolated_for(&self, idl: &str, keep_service_name: bool) -> Self {
        let mut params = Self {
            common: self.common.clone(),
            slice: SliceParams {
                pass: self.slice.pass.to_vec(),
                proto_search_path: self.slice.proto_search_path.to_vec(),
            },
            verbose: self.verbose,
        };
        params.common.idl_path = idl.to_owned();
        if !keep_service_name {
            params.common.service_name.clear();
        }
        params
    }
}
