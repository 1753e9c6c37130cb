// Sun Oct 18 2026 - Alex

use crate::memory::{Address, MemoryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Module unreadable: {module}: {reason}")]
    ModuleUnreadable { module: String, reason: String },
    #[error("Malformed descriptor at {address}: {reason}")]
    MalformedDescriptor { address: Address, reason: String },
    #[error("Conformance at {record} targets unknown type {target}")]
    UnresolvedConformanceTarget { record: Address, target: String },
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}

impl MetadataError {
    pub fn malformed(address: Address, reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            address,
            reason: reason.into(),
        }
    }

    pub fn unreadable(module: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModuleUnreadable {
            module: module.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDescriptor { .. })
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::ModuleUnreadable { .. })
    }
}
