// Sun Oct 18 2026 - Alex

use crate::host::LoadedModule;
use crate::memory::Address;
use ahash::AHashMap;
use log::debug;
use std::sync::Arc;

/// Exported symbol addresses across a set of modules. Pointer slots bound to
/// another image are followed through it.
#[derive(Debug, Default)]
pub struct ExportTable {
    symbols: AHashMap<String, Address>,
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the exports of every module. The first module exporting a
    /// name wins; modules whose symbols cannot be listed are passed over.
    pub fn from_modules(modules: &[Arc<dyn LoadedModule>]) -> Self {
        let mut table = Self::new();
        for module in modules {
            match module.exported_symbols() {
                Ok(symbols) => {
                    for symbol in symbols {
                        table.insert(symbol.name, symbol.address);
                    }
                }
                Err(e) => debug!("{}: exports unavailable: {}", module.name(), e),
            }
        }
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, address: Address) {
        self.symbols.entry(name.into()).or_insert(address);
    }

    pub fn lookup(&self, name: &str) -> Option<Address> {
        self.symbols.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
