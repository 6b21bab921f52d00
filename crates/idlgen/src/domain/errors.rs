//! Domain-specific errors.

use std::io;

use thiserror::Error;

/// Failures raised while resolving IDL inputs and dispatching generation.
///
/// Every variant is terminal for the current dispatch call. Messages name the
/// offending fragment, file, or candidate set.
#[derive(Debug, Error)]
pub enum IdlError {
    #[error("idl path is empty")]
    EmptyInput,

    #[error("idl path {path} not found")]
    PathNotFound {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid idl glob pattern {part}")]
    InvalidGlobPattern {
        part: String,
        #[source]
        source: globset::Error,
    },

    #[error("idl glob pattern {part} matched no files")]
    NoGlobMatches { part: String },

    #[error("read idl {path} failed")]
    ReadFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("no idl candidates")]
    NoCandidates,

    #[error(
        "idl pattern matched {candidate_count} files; multiple files define services ({}). please specify a single idl file",
        .files.join(", ")
    )]
    AmbiguousRoot {
        candidate_count: usize,
        files: Vec<String>,
    },

    #[error(
        "idl pattern matched {candidate_count} files but no service definition found; please specify a single idl file"
    )]
    NoServiceFound { candidate_count: usize },

    #[error("code generation failed for {idl}")]
    GenerationFailed {
        idl: String,
        #[source]
        source: anyhow::Error,
    },
}
