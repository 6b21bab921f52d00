//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::{CommonParams, GenerateType, GenerationParameters, SliceParams};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".idlgen/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub proto: Proto,
    #[serde(default)]
    pub pass: Pass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Program invoked once per generated IDL.
    #[serde(default = "Defaults::default_generator")]
    pub generator: String,
    #[serde(default)]
    pub generate_type: GenerateType,
    #[serde(default)]
    pub out_dir: String,
    #[serde(default)]
    pub registry: String,
    #[serde(default)]
    pub verbose: bool,
}

impl Defaults {
    fn default_generator() -> String {
        "kitex".to_owned()
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            generator: Self::default_generator(),
            generate_type: GenerateType::default(),
            out_dir: String::new(),
            registry: String::new(),
            verbose: false,
        }
    }
}

/// Include directories for protobuf imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Proto {
    #[serde(default)]
    pub search_paths: Vec<String>,
}

/// Flags forwarded to the generator verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Pass {
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    generator: Option<String>,
    registry: Option<String>,
    pass: Option<String>,
    proto_search_path: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            generator: env::var("IDLGEN_GENERATOR").ok(),
            registry: env::var("IDLGEN_REGISTRY").ok(),
            pass: env::var("IDLGEN_PASS").ok(),
            proto_search_path: env::var("IDLGEN_PROTO_SEARCH_PATH").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(generator: &str, pass: &str) -> Self {
        Self {
            generator: Some(generator.to_owned()),
            pass: Some(pass.to_owned()),
            ..Self::default()
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::parse(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading global config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("in config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            proto: Proto {
                search_paths: choose_list(self.proto.search_paths, other.proto.search_paths),
            },
            pass: Pass {
                flags: choose_list(self.pass.flags, other.pass.flags),
            },
        }
    }

    /// Canonical generation parameters before any CLI flag is applied.
    pub fn base_parameters(&self) -> GenerationParameters {
        GenerationParameters {
            common: CommonParams {
                generate_type: self.defaults.generate_type,
                out_dir: self.defaults.out_dir.clone(),
                registry: self.defaults.registry.to_uppercase(),
                ..CommonParams::default()
            },
            slice: SliceParams {
                pass: self.pass.flags.clone(),
                proto_search_path: self.proto.search_paths.clone(),
            },
            verbose: self.defaults.verbose,
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        generator: if overlay.generator != Defaults::default_generator() {
            overlay.generator
        } else {
            base.generator
        },
        generate_type: if overlay.generate_type != GenerateType::default() {
            overlay.generate_type
        } else {
            base.generate_type
        },
        out_dir: choose_non_empty(base.out_dir, overlay.out_dir),
        registry: choose_non_empty(base.registry, overlay.registry),
        verbose: overlay.verbose || base.verbose,
    }
}

fn choose_non_empty(base: String, overlay: String) -> String {
    if overlay.is_empty() { base } else { overlay }
}

/// Lists are argv fragments: a non-empty layer replaces the one below it whole.
fn choose_list(base: Vec<String>, overlay: Vec<String>) -> Vec<String> {
    if overlay.is_empty() { base } else { overlay }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("idlgen/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(generator) = env.generator {
        config.defaults.generator = generator;
    }
    if let Some(registry) = env.registry {
        config.defaults.registry = registry;
    }

    let mut slice = SliceParams {
        pass: std::mem::take(&mut config.pass.flags),
        proto_search_path: std::mem::take(&mut config.proto.search_paths),
    };
    if let Some(pass) = env.pass {
        slice.write_answer(SliceParams::PASS, &pass);
    }
    if let Some(paths) = env.proto_search_path {
        slice.write_answer(SliceParams::PROTO_SEARCH_PATH, &paths);
    }
    config.pass.flags = slice.pass;
    config.proto.search_paths = slice.proto_search_path;
    config
}
