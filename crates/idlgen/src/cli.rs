//! Command-line surface.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::app::dispatch::Dispatcher;
use crate::app::expand::expand;
use crate::app::scan::scan_services;
use crate::app::selection::select_root;
use crate::domain::model::{GenerateType, GenerationParameters, LIST_DELIMITER};
use crate::infra::config::Config;
use crate::infra::generator::CommandGenerator;

#[derive(Parser)]
#[command(
    name = "idlgen",
    author,
    version,
    about = "Resolve IDL inputs and drive code generation",
    long_about = None
)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the files an IDL path expression resolves to
    Expand {
        expr: String,
        /// Print a JSON array instead of one path per line
        #[arg(long)]
        json: bool,
    },
    /// Print the services declared in an IDL file
    Services { file: PathBuf },
    /// Print the root IDL among the files an expression resolves to
    Root {
        expr: String,
        #[arg(long)]
        service: Option<String>,
    },
    /// Run the generator over an IDL path expression
    Generate(GenerateArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// IDL path, glob, or `;` separated list of either
    #[arg(long)]
    idl: String,
    #[arg(long = "type", value_enum)]
    generate_type: Option<GenerateType>,
    /// Service name of the primary IDL
    #[arg(long)]
    service: Option<String>,
    #[arg(long)]
    module: Option<String>,
    #[arg(long)]
    out_dir: Option<String>,
    #[arg(long)]
    registry: Option<String>,
    /// Flag forwarded to the generator, repeatable
    #[arg(long, allow_hyphen_values = true)]
    pass: Vec<String>,
    /// Include directory for protobuf imports, repeatable
    #[arg(short = 'I', long)]
    proto_search_path: Vec<String>,
    /// Generator program, overrides configuration
    #[arg(long)]
    generator: Option<String>,
    /// Additional IDL files, as produced by an unquoted shell glob
    extra: Vec<String>,
}

/// Parse process arguments and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::init(cli.verbose);

    match cli.command {
        Commands::Expand { expr, json } => {
            let files = expand(&expr)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                for file in &files {
                    println!("{file}");
                }
            }
        }
        Commands::Services { file } => {
            for name in scan_services(&file)? {
                println!("{name}");
            }
        }
        Commands::Root { expr, service } => {
            let files = expand(&expr)?;
            println!("{}", select_root(files.as_slice(), service.as_deref())?);
        }
        Commands::Generate(args) => generate(args, cli.verbose)?,
    }
    Ok(())
}

fn generate(args: GenerateArgs, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let program = args
        .generator
        .clone()
        .unwrap_or_else(|| config.defaults.generator.clone());
    let params = build_parameters(config.base_parameters(), args, verbose)?;

    tracing::info!(
        idl = %params.common.idl_path,
        generate_type = %params.common.generate_type,
        generator = %program,
        "generating"
    );
    let mut generator = CommandGenerator::new(program);
    Dispatcher::new().run(&params, &mut generator)?;
    Ok(())
}

fn build_parameters(
    mut params: GenerationParameters,
    args: GenerateArgs,
    verbose: bool,
) -> Result<GenerationParameters> {
    params.common.idl_path = merge_extra_idls(&args.idl, &args.extra)?;
    if let Some(generate_type) = args.generate_type {
        params.common.generate_type = generate_type;
    }
    if let Some(service) = args.service {
        params.common.service_name = service;
    }
    if let Some(module) = args.module {
        params.common.module = module;
    }
    if let Some(out_dir) = args.out_dir {
        params.common.out_dir = out_dir;
    }
    if let Some(registry) = args.registry {
        params.common.registry = registry.to_uppercase();
    }
    if !args.pass.is_empty() {
        params.slice.pass = args.pass;
    }
    if !args.proto_search_path.is_empty() {
        params.slice.proto_search_path = args.proto_search_path;
    }
    params.verbose |= verbose;
    Ok(params)
}

/// Append positional `.proto`/`.thrift` arguments to the IDL expression.
fn merge_extra_idls(idl: &str, extras: &[String]) -> Result<String> {
    if extras.is_empty() {
        return Ok(idl.to_owned());
    }
    if !extras.iter().all(|arg| is_idl_file(arg)) {
        bail!(
            "unexpected arguments: {extras:?} (if you intended a glob, quote it like --idl \"./dir/*.proto\")"
        );
    }

    let delimiter = LIST_DELIMITER.to_string();
    let joined = extras.join(&delimiter);
    if idl.trim().is_empty() {
        Ok(joined)
    } else {
        Ok(format!("{idl}{delimiter}{joined}"))
    }
}

fn is_idl_file(arg: &str) -> bool {
    Path::new(arg)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| ext == "proto" || ext == "thrift")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GenerateArgs {
        let cli = Cli::try_parse_from(args).expect("valid arguments");
        match cli.command {
            Commands::Generate(args) => args,
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn extra_idl_arguments_are_appended() -> Result<()> {
        let extras = vec!["b.proto".to_string(), "c.THRIFT".to_string()];
        assert_eq!(merge_extra_idls("a.proto", &extras)?, "a.proto;b.proto;c.THRIFT");
        assert_eq!(merge_extra_idls("", &extras)?, "b.proto;c.THRIFT");
        assert_eq!(merge_extra_idls("x/*.proto", &[])?, "x/*.proto");
        Ok(())
    }

    #[test]
    fn non_idl_extras_are_rejected() {
        let extras = vec!["b.proto".to_string(), "notes.txt".to_string()];
        let err = merge_extra_idls("a.proto", &extras).unwrap_err();
        assert!(err.to_string().contains("unexpected arguments"));
    }

    #[test]
    fn flags_override_configuration() -> Result<()> {
        let args = parse(&[
            "idlgen",
            "generate",
            "--idl",
            "idl/a.proto",
            "--service",
            "Greeter",
            "--registry",
            "nacos",
            "--pass",
            "-record",
            "-I",
            "include",
            "idl/b.proto",
        ]);
        let mut base = GenerationParameters::default();
        base.slice.pass = vec!["-from-config".into()];
        base.slice.proto_search_path = vec!["config-include".into()];

        let params = build_parameters(base, args, false)?;
        assert_eq!(params.common.idl_path, "idl/a.proto;idl/b.proto");
        assert_eq!(params.common.service_name, "Greeter");
        assert_eq!(params.common.registry, "NACOS");
        assert_eq!(params.slice.pass, vec!["-record"]);
        assert_eq!(params.slice.proto_search_path, vec!["include"]);
        Ok(())
    }

    #[test]
    fn configuration_survives_without_flags() -> Result<()> {
        let args = parse(&["idlgen", "generate", "--idl", "a.proto", "--type", "http"]);
        let mut base = GenerationParameters::default();
        base.slice.pass = vec!["-from-config".into()];

        let params = build_parameters(base, args, true)?;
        assert_eq!(params.common.generate_type, GenerateType::Http);
        assert_eq!(params.slice.pass, vec!["-from-config"]);
        assert!(params.verbose);
        Ok(())
    }
}
