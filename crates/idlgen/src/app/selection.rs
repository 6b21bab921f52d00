//! Picking the root IDL among several candidates.

use crate::app::scan::scan_services;
use crate::domain::errors::IdlError;
use crate::domain::model::ServiceNameSet;

/// Select the single candidate that defines the target service.
///
/// Resolution order:
/// 1. a lone candidate is returned without reading it;
/// 2. the first candidate declaring `wanted_service` (exact, case-sensitive);
/// 3. the only candidate declaring any service at all.
///
/// Several service-declaring candidates yield [`IdlError::AmbiguousRoot`]; none
/// yields [`IdlError::NoServiceFound`].
pub fn select_root(
    candidates: &[String],
    wanted_service: Option<&str>,
) -> Result<String, IdlError> {
    match candidates {
        [] => return Err(IdlError::NoCandidates),
        [only] => return Ok(only.clone()),
        _ => {}
    }

    let scanned = candidates
        .iter()
        .map(|path| scan_services(path).map(|services| (path, services)))
        .collect::<Result<Vec<(&String, ServiceNameSet)>, _>>()?;

    let with_services: Vec<&String> = scanned
        .iter()
        .filter(|(_, services)| !services.is_empty())
        .map(|(path, _)| *path)
        .collect();

    if let Some(wanted) = wanted_service.filter(|name| !name.trim().is_empty()) {
        if let Some((path, _)) = scanned
            .iter()
            .find(|(_, services)| services.contains(wanted))
        {
            tracing::info!(root = %path, service = wanted, "selected root idl by service name");
            return Ok((*path).clone());
        }
        tracing::debug!(service = wanted, "no candidate declares the requested service");
    }

    match with_services.as_slice() {
        [only] => {
            tracing::info!(root = %only, "selected the only idl declaring services");
            Ok((*only).clone())
        }
        [] => Err(IdlError::NoServiceFound {
            candidate_count: candidates.len(),
        }),
        many => Err(IdlError::AmbiguousRoot {
            candidate_count: candidates.len(),
            files: many.iter().map(|path| (*path).clone()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use anyhow::Result;

    fn write(dir: &Path, name: &str, contents: &str) -> Result<String> {
        let path = dir.join(name);
        fs::write(&path, contents)?;
        Ok(path.to_string_lossy().into_owned())
    }

    const TYPES: &str = "syntax = \"proto3\";\nmessage A {}\n";
    const FOO: &str = "syntax = \"proto3\";\n// service Fake {}\nservice Foo {\n  rpc Ping (A) returns (A);\n}\n";
    const BAR: &str = "service Bar {}\nservice Shared {}\n";
    const BAZ: &str = "service Baz {}\nservice Shared {}\n";

    #[test]
    fn no_candidates() {
        assert!(matches!(select_root(&[], None), Err(IdlError::NoCandidates)));
    }

    #[test]
    fn single_candidate_is_not_read() -> Result<()> {
        let only = vec!["does/not/exist.proto".to_string()];
        assert_eq!(select_root(&only, Some("Foo"))?, only[0]);
        Ok(())
    }

    #[test]
    fn picks_by_requested_service() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let types = write(temp.path(), "types.proto", TYPES)?;
        let foo = write(temp.path(), "svc.proto", FOO)?;

        assert_eq!(select_root(&[types, foo.clone()], Some("Foo"))?, foo);
        Ok(())
    }

    #[test]
    fn requested_service_follows_input_order() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let bar = write(temp.path(), "bar.thrift", BAR)?;
        let baz = write(temp.path(), "baz.thrift", BAZ)?;

        assert_eq!(select_root(&[baz.clone(), bar.clone()], Some("Shared"))?, baz);
        assert_eq!(select_root(&[bar.clone(), baz.clone()], Some("Shared"))?, bar);
        assert_eq!(select_root(&[bar, baz.clone()], Some("Baz"))?, baz);
        Ok(())
    }

    #[test]
    fn service_match_is_case_sensitive() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let bar = write(temp.path(), "bar.thrift", BAR)?;
        let baz = write(temp.path(), "baz.thrift", BAZ)?;

        let err = select_root(&[bar, baz], Some("shared")).unwrap_err();
        assert!(matches!(err, IdlError::AmbiguousRoot { .. }));
        Ok(())
    }

    #[test]
    fn only_service_file_wins_regardless_of_order() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let types = write(temp.path(), "types.proto", TYPES)?;
        let foo = write(temp.path(), "svc.proto", FOO)?;

        assert_eq!(select_root(&[types.clone(), foo.clone()], None)?, foo);
        assert_eq!(select_root(&[foo.clone(), types.clone()], Some(""))?, foo);
        assert_eq!(select_root(&[types, foo.clone()], Some("Missing"))?, foo);
        Ok(())
    }

    #[test]
    fn ambiguity_lists_every_service_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let types = write(temp.path(), "types.proto", TYPES)?;
        let bar = write(temp.path(), "bar.thrift", BAR)?;
        let baz = write(temp.path(), "baz.thrift", BAZ)?;

        let err = select_root(&[bar.clone(), baz.clone(), types], None).unwrap_err();
        match &err {
            IdlError::AmbiguousRoot {
                candidate_count,
                files,
            } => {
                assert_eq!(*candidate_count, 3);
                assert_eq!(files, &vec![bar.clone(), baz.clone()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("matched 3 files"));
        assert!(message.contains(&format!("{bar}, {baz}")));
        Ok(())
    }

    #[test]
    fn no_service_anywhere() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let a = write(temp.path(), "a.proto", TYPES)?;
        let b = write(temp.path(), "b.proto", "/* service Hidden {} */")?;

        let err = select_root(&[a, b], None).unwrap_err();
        assert!(matches!(err, IdlError::NoServiceFound { candidate_count: 2 }));
        Ok(())
    }

    #[test]
    fn scan_failure_aborts_selection() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let foo = write(temp.path(), "svc.proto", FOO)?;
        let missing = temp.path().join("gone.proto").to_string_lossy().into_owned();

        let err = select_root(&[foo, missing], Some("Foo")).unwrap_err();
        assert!(matches!(err, IdlError::ReadFailed { .. }));
        Ok(())
    }
}
