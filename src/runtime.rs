// Sun Oct 18 2026 - Alex

use crate::config::Config;
use crate::host::{self, HostError, LoadedModule, ModuleHost};
use crate::metadata::{DecodeLimits, MetadataError};
use crate::registry::Registry;
use crate::symbol::{enumerate_with_filter, Demangler, SwiftDemangler, SymbolError, SymbolFilter, SymbolRecord};
use crate::types::Type;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Host unavailable: {0}")]
    HostUnavailable(#[from] HostError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
}

/// Entry point over the installed host: the shared registry, fresh type
/// enumeration and symbol listing.
pub struct Runtime {
    limits: DecodeLimits,
    demangler: Arc<dyn Demangler>,
    filter: SymbolFilter,
}

impl Runtime {
    pub fn new() -> Result<Self, RuntimeError> {
        Ok(Self {
            limits: DecodeLimits::default(),
            demangler: Arc::new(SwiftDemangler),
            filter: SymbolFilter::swift()?.clone(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RuntimeError> {
        Ok(Self {
            limits: DecodeLimits::from(config),
            demangler: Arc::new(SwiftDemangler),
            filter: SymbolFilter::new(&config.mangled_prefixes)?,
        })
    }

    pub fn with_demangler(mut self, demangler: Arc<dyn Demangler>) -> Self {
        self.demangler = demangler;
        self
    }

    pub fn install(host: Arc<dyn ModuleHost>) {
        host::install(host);
    }

    pub fn available() -> bool {
        host::is_installed()
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    pub fn modules(&self) -> Result<Vec<Arc<dyn LoadedModule>>, RuntimeError> {
        Ok(host::current()?.current_modules()?)
    }

    /// The shared snapshot, built on first use.
    pub fn registry(&self) -> Result<&'static Registry, RuntimeError> {
        Registry::shared_with(self.limits)
    }

    /// Decodes the types of `module`, or of every module the host reports,
    /// without touching the shared registry.
    pub fn enumerate_types(&self, module: Option<&Arc<dyn LoadedModule>>) -> Result<Vec<Type>, RuntimeError> {
        let modules = match module {
            Some(module) => vec![Arc::clone(module)],
            None => self.modules()?,
        };
        let registry = Registry::from_modules(&modules, self.limits);
        Ok(registry.types().to_vec())
    }

    pub fn enumerate_demangled_symbols(&self, module: &dyn LoadedModule) -> Result<Vec<SymbolRecord>, RuntimeError> {
        Ok(enumerate_with_filter(module, self.demangler.as_ref(), &self.filter)?)
    }
}
