//! Driving the external generator over resolved IDL files.

use anyhow::Result;

use crate::app::expand::expand;
use crate::app::selection::select_root;
use crate::domain::errors::IdlError;
use crate::domain::model::{GenerateType, GenerationParameters};

/// A single code generation run for one IDL file.
pub trait Generator {
    fn generate(&mut self, params: GenerationParameters) -> Result<()>;
}

impl<F> Generator for F
where
    F: FnMut(GenerationParameters) -> Result<()>,
{
    fn generate(&mut self, params: GenerationParameters) -> Result<()> {
        self(params)
    }
}

/// Process-wide registry extension installed around each generator run.
pub trait ExtensionRegistrar {
    fn register(&self, params: &GenerationParameters) -> Result<()>;
    fn remove(&self);
}

/// Removes the registered extension when dropped.
#[must_use = "the extension is removed as soon as the guard is dropped"]
pub struct ExtensionGuard<'a> {
    registrar: &'a dyn ExtensionRegistrar,
}

impl<'a> ExtensionGuard<'a> {
    pub fn acquire(
        registrar: &'a dyn ExtensionRegistrar,
        params: &GenerationParameters,
    ) -> Result<Self> {
        registrar.register(params)?;
        Ok(Self { registrar })
    }
}

impl Drop for ExtensionGuard<'_> {
    fn drop(&mut self) {
        self.registrar.remove();
    }
}

/// Runs generation sequentially, one file at a time.
#[derive(Default)]
pub struct Dispatcher<'a> {
    registrar: Option<&'a dyn ExtensionRegistrar>,
}

impl<'a> Dispatcher<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `registrar` around every run whose registry is set.
    pub fn with_registrar(mut self, registrar: &'a dyn ExtensionRegistrar) -> Self {
        self.registrar = Some(registrar);
        self
    }

    /// Fan out for RPC generation, or generate once from the root IDL for HTTP.
    pub fn run<G: Generator>(
        &self,
        params: &GenerationParameters,
        generator: &mut G,
    ) -> Result<(), IdlError> {
        match params.common.generate_type {
            GenerateType::Rpc => self.fan_out(params, generator),
            GenerateType::Http => self.generate_root(params, generator),
        }
    }

    /// Invoke `generator` once per resolved file in sorted order.
    ///
    /// Only the first file keeps the service name override. The first failure
    /// stops the loop.
    pub fn fan_out<G: Generator>(
        &self,
        params: &GenerationParameters,
        generator: &mut G,
    ) -> Result<(), IdlError> {
        let files = expand(&params.common.idl_path)?;
        tracing::debug!(count = files.len(), "dispatching idl files");

        for (index, idl) in files.iter().enumerate() {
            let isolated = params.isolated_for(idl, index == 0);
            self.invoke(isolated, generator)?;
        }
        Ok(())
    }

    /// Invoke `generator` once against the root IDL of the expression.
    pub fn generate_root<G: Generator>(
        &self,
        params: &GenerationParameters,
        generator: &mut G,
    ) -> Result<(), IdlError> {
        let files = expand(&params.common.idl_path)?;
        let service = Some(params.common.service_name.as_str());
        let root = select_root(files.as_slice(), service)?;
        self.invoke(params.isolated_for(&root, true), generator)
    }

    fn invoke<G: Generator>(
        &self,
        params: GenerationParameters,
        generator: &mut G,
    ) -> Result<(), IdlError> {
        let idl = params.common.idl_path.clone();
        let failed = |source| IdlError::GenerationFailed {
            idl: idl.clone(),
            source,
        };

        let _guard = match self.registrar {
            Some(registrar) if !params.common.registry.is_empty() => {
                Some(ExtensionGuard::acquire(registrar, &params).map_err(failed)?)
            }
            _ => None,
        };

        tracing::debug!(idl = %idl, service = %params.common.service_name, "running generator");
        generator.generate(params).map_err(failed)
    }
}

/// Fan out `params` over its resolved IDL files, calling `generate` for each.
pub fn dispatch<F>(params: &GenerationParameters, mut generate: F) -> Result<(), IdlError>
where
    F: FnMut(GenerationParameters) -> Result<()>,
{
    Dispatcher::new().fan_out(params, &mut generate)
}
