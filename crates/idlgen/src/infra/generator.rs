//! Invocation of the external code generator binary.

use std::fs;
use std::path;
use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::app::dispatch::Generator;
use crate::domain::model::GenerationParameters;

/// Runs a generator program once per call, blocking until it exits.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments handed to the program for one IDL file.
    pub fn args(params: &GenerationParameters) -> Vec<String> {
        let common = &params.common;
        let mut args = Vec::new();
        if params.verbose {
            args.push("-v".to_owned());
        }
        if !common.module.is_empty() {
            args.extend(["-module".to_owned(), common.module.clone()]);
        }
        if !common.service_name.is_empty() {
            args.extend(["-service".to_owned(), common.service_name.clone()]);
        }
        if !common.registry.is_empty() {
            args.extend(["-registry".to_owned(), common.registry.clone()]);
        }
        for dir in &params.slice.proto_search_path {
            args.extend(["-I".to_owned(), dir.clone()]);
        }
        args.extend(params.slice.pass.iter().cloned());
        args.push(common.idl_path.clone());
        args
    }

    /// Human readable command line, used for logs.
    pub fn render(&self, params: &GenerationParameters) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(Self::args(params));
        parts.join(" ")
    }
}

impl Generator for CommandGenerator {
    fn generate(&mut self, mut params: GenerationParameters) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        if !params.common.out_dir.is_empty() {
            // Inputs stay relative to the caller, not to the output directory.
            params.common.idl_path = absolute(&params.common.idl_path)?;
            for dir in &mut params.slice.proto_search_path {
                *dir = absolute(dir)?;
            }
            fs::create_dir_all(&params.common.out_dir).with_context(|| {
                format!("failed to create output directory {}", params.common.out_dir)
            })?;
            cmd.current_dir(&params.common.out_dir);
        }
        cmd.args(Self::args(&params));

        tracing::debug!(command = %self.render(&params), "spawning generator");
        let output = cmd
            .output()
            .with_context(|| format!("failed to run {}", self.program))?;

        if !output.status.success() {
            let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
            log.push_str(&String::from_utf8_lossy(&output.stderr));
            let log = log.trim();
            if log.is_empty() {
                bail!("{} exited with {}", self.program, output.status);
            }
            bail!("{} exited with {}: {}", self.program, output.status, log);
        }
        Ok(())
    }
}

fn absolute(path: &str) -> Result<String> {
    let resolved = path::absolute(path).with_context(|| format!("failed to resolve {path}"))?;
    Ok(resolved.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CommonParams, SliceParams};

    fn params() -> GenerationParameters {
        GenerationParameters {
            common: CommonParams {
                service_name: "Greeter".into(),
                module: "example.com/demo".into(),
                idl_path: "idl/api.proto".into(),
                registry: "ETCD".into(),
                ..CommonParams::default()
            },
            slice: SliceParams {
                pass: vec!["-record".into()],
                proto_search_path: vec!["idl".into(), "third_party".into()],
            },
            ..GenerationParameters::default()
        }
    }

    #[test]
    fn args_follow_parameter_order() {
        let args = CommandGenerator::args(&params());
        assert_eq!(
            args,
            vec![
                "-module",
                "example.com/demo",
                "-service",
                "Greeter",
                "-registry",
                "ETCD",
                "-I",
                "idl",
                "-I",
                "third_party",
                "-record",
                "idl/api.proto",
            ]
        );
    }

    #[test]
    fn empty_fields_are_omitted() {
        let mut p = params();
        p.common.module.clear();
        p.common.service_name.clear();
        p.common.registry.clear();
        p.slice = SliceParams::default();
        p.verbose = true;
        assert_eq!(CommandGenerator::args(&p), vec!["-v", "idl/api.proto"]);
    }

    #[cfg(unix)]
    #[test]
    fn failure_carries_program_output() {
        let mut generator = CommandGenerator::new("false");
        let err = generator.generate(params()).unwrap_err();
        assert!(err.to_string().starts_with("false exited with"));
    }

    #[cfg(unix)]
    #[test]
    fn runs_inside_output_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let idl = temp.path().join("api.proto");
        fs::write(&idl, "service Api {}")?;
        let out = temp.path().join("gen/out");

        let mut p = params();
        p.common.idl_path = idl.to_string_lossy().into_owned();
        p.common.out_dir = out.to_string_lossy().into_owned();
        p.slice = SliceParams::default();

        let mut generator = CommandGenerator::new("true");
        generator.generate(p)?;
        assert!(out.is_dir());
        Ok(())
    }

    #[test]
    fn missing_program_is_an_error() {
        let mut generator = CommandGenerator::new("idlgen-definitely-missing-binary");
        let err = generator.generate(params()).unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }
}
