//! Expansion of IDL path expressions into concrete files.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::domain::errors::IdlError;
use crate::domain::model::{LIST_DELIMITER, ResolvedFileSet};

const GLOB_META: &[char] = &['*', '?', '['];

/// Whether `text` contains any glob metacharacter.
pub fn has_glob_meta(text: &str) -> bool {
    text.contains(GLOB_META)
}

/// Expand a `;` separated list of literal paths and glob patterns.
///
/// Literal fragments must exist. Glob fragments must be well formed and match
/// at least one entry. The merged result is sorted and deduplicated.
pub fn expand(expr: &str) -> Result<ResolvedFileSet, IdlError> {
    if expr.trim().is_empty() {
        return Err(IdlError::EmptyInput);
    }

    let mut all = Vec::new();
    for part in expr.split(LIST_DELIMITER) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if !has_glob_meta(part) {
            fs::metadata(part).map_err(|source| IdlError::PathNotFound {
                path: part.to_owned(),
                source,
            })?;
            tracing::debug!(path = part, "literal idl path");
            all.push(part.to_owned());
            continue;
        }

        let matches = glob(part)?;
        if matches.is_empty() {
            return Err(IdlError::NoGlobMatches {
                part: part.to_owned(),
            });
        }
        tracing::debug!(pattern = part, matches = matches.len(), "expanded idl glob");
        all.extend(matches);
    }

    if all.is_empty() {
        return Err(IdlError::EmptyInput);
    }
    Ok(ResolvedFileSet::from_unsorted(all))
}

enum Segment {
    Literal(OsString),
    Pattern(GlobMatcher),
}

/// Match `pattern` one path component at a time so `*` never crosses a separator.
fn glob(pattern: &str) -> Result<Vec<String>, IdlError> {
    let segments = Path::new(pattern)
        .components()
        .map(|component| match component {
            Component::Normal(name) => match name.to_str() {
                Some(text) if has_glob_meta(text) => {
                    component_matcher(text).map(Segment::Pattern).map_err(|source| {
                        IdlError::InvalidGlobPattern {
                            part: pattern.to_owned(),
                            source,
                        }
                    })
                }
                _ => Ok(Segment::Literal(name.to_os_string())),
            },
            other => Ok(Segment::Literal(other.as_os_str().to_os_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut current = vec![PathBuf::new()];
    for segment in &segments {
        current = match segment {
            Segment::Literal(name) => current.into_iter().map(|dir| dir.join(name)).collect(),
            Segment::Pattern(matcher) => current
                .iter()
                .flat_map(|dir| matching_children(dir, matcher))
                .collect(),
        };
        if current.is_empty() {
            break;
        }
    }

    Ok(current
        .into_iter()
        .filter(|path| path.exists())
        .map(|path| path.to_string_lossy().into_owned())
        .collect())
}

fn matching_children(dir: &Path, matcher: &GlobMatcher) -> Vec<PathBuf> {
    let read_from = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let entries = match fs::read_dir(read_from) {
        Ok(entries) => entries,
        Err(err) => {
            if read_from.is_dir() {
                tracing::warn!(dir = %read_from.display(), error = %err, "cannot read directory");
            }
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .filter(|name| matcher.is_match(Path::new(name)))
        .map(|name| dir.join(name))
        .collect()
}

fn component_matcher(text: &str) -> Result<GlobMatcher, globset::Error> {
    let glob = GlobBuilder::new(&escape_alternates(text))
        .literal_separator(true)
        .build()?;
    Ok(glob.compile_matcher())
}

/// Braces are plain characters in IDL globs.
fn escape_alternates(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_class = false;
    for ch in text.chars() {
        match ch {
            '[' if !in_class => {
                in_class = true;
                out.push(ch);
            }
            ']' if in_class => {
                in_class = false;
                out.push(ch);
            }
            '{' | '}' if !in_class => {
                out.push('[');
                out.push(ch);
                out.push(']');
            }
            _ => out.push(ch),
        }
    }
    out
}
