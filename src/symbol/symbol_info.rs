// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use serde::Serialize;
use std::fmt;

/// One exported Swift symbol together with its readable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolRecord {
    pub address: Address,
    pub mangled_name: String,
    pub demangled: String,
}

impl SymbolRecord {
    pub fn new(address: Address, mangled_name: impl Into<String>, demangled: impl Into<String>) -> Self {
        Self {
            address,
            mangled_name: mangled_name.into(),
            demangled: demangled.into(),
        }
    }
}

impl fmt::Display for SymbolRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) @ {}", self.demangled, self.mangled_name, self.address)
    }
}
