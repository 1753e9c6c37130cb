// Sun Oct 18 2026 - Alex

pub mod conformance;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod exports;
pub mod fields;
pub mod flags;
pub mod mangling;
pub mod relative;
pub mod requirements;
pub mod sections;

pub use conformance::{ConformanceRecord, Conformances, TypeReference};
pub use context::{ContextPath, ParentContext};
pub use descriptor::{
    ClassDescriptor, Descriptor, DescriptorHeader, EnumDescriptor, ProtocolDescriptor,
    StructDescriptor,
};
pub use error::MetadataError;
pub use exports::ExportTable;
pub use fields::{EnumCase, Field};
pub use flags::{ContextDescriptorFlags, ContextDescriptorKind, ConformanceFlags};
pub use mangling::MangledName;
pub use relative::{RecordCursor, RelativePointer};
pub use requirements::ProtocolRequirement;
pub use sections::{locate_sections, MetadataSections, SectionRecords};

use crate::config::Config;
use crate::host::LoadedModule;
use crate::memory::{Address, MemoryError, MemoryReader};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_context_depth: usize,
    pub max_name_length: usize,
    pub max_trailing_records: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_context_depth: 32,
            max_name_length: 1024,
            max_trailing_records: 65536,
        }
    }
}

impl From<&Config> for DecodeLimits {
    fn from(config: &Config) -> Self {
        Self {
            max_context_depth: config.max_context_depth,
            max_name_length: config.max_name_length,
            max_trailing_records: config.max_trailing_records,
        }
    }
}

/// The image a descriptor was read from, plus the limits applied while
/// decoding it. Shared by every descriptor of one module.
pub struct ImageContext {
    module: Arc<dyn LoadedModule>,
    limits: DecodeLimits,
    exports: Arc<ExportTable>,
}

impl ImageContext {
    pub fn new(module: Arc<dyn LoadedModule>, limits: DecodeLimits) -> Arc<Self> {
        Self::with_exports(module, limits, Arc::new(ExportTable::new()))
    }

    /// A context that follows slots bound to other images through `exports`.
    pub fn with_exports(module: Arc<dyn LoadedModule>, limits: DecodeLimits, exports: Arc<ExportTable>) -> Arc<Self> {
        Arc::new(Self { module, limits, exports })
    }

    pub fn module(&self) -> &Arc<dyn LoadedModule> {
        &self.module
    }

    pub fn module_name(&self) -> &str {
        self.module.name()
    }

    pub fn reader(&self) -> &dyn MemoryReader {
        self.module.reader()
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Copies a fixed-size record. A short read means the record is
    /// truncated, which is reported against the record itself.
    pub fn read_record(&self, address: Address, len: usize) -> Result<RecordCursor, MetadataError> {
        match self.reader().read_bytes(address, len) {
            Ok(bytes) => Ok(RecordCursor::new(address, bytes)),
            Err(e @ MemoryError::Unmapped(_)) => Err(MetadataError::Memory(e)),
            Err(e) => Err(MetadataError::malformed(
                address,
                format!("truncated {}-byte record: {}", len, e),
            )),
        }
    }

    pub fn read_string(&self, ptr: RelativePointer, owner: Address, what: &str) -> Result<String, MetadataError> {
        let target = ptr
            .target()
            .ok_or_else(|| MetadataError::malformed(owner, format!("missing {}", what)))?;
        self.reader()
            .read_c_string(target, self.limits.max_name_length)
            .map_err(|e| MetadataError::malformed(owner, format!("unreadable {}: {}", what, e)))
    }

    pub fn read_optional_string(&self, ptr: RelativePointer, owner: Address, what: &str) -> Result<Option<String>, MetadataError> {
        if ptr.is_null() {
            return Ok(None);
        }
        self.read_string(ptr, owner, what).map(Some)
    }

    pub fn resolve_indirectable(&self, ptr: RelativePointer, owner: Address) -> Result<Option<Address>, MetadataError> {
        let resolved = if ptr.is_indirect() {
            match ptr.direct().target() {
                Some(slot) => self.resolve_slot(slot),
                None => Ok(None),
            }
        } else {
            Ok(ptr.target())
        };
        resolved.map_err(|e| MetadataError::malformed(owner, format!("unreadable reference: {}", e)))
    }

    /// Follows a pointer slot. A slot the loader binds to another image's
    /// symbol resolves to that symbol's export, when it is known.
    pub fn resolve_slot(&self, slot: Address) -> Result<Option<Address>, MemoryError> {
        let raw = self.reader().read_u64(slot)?;
        if let Some(target) = self.module.resolve_pointer(raw) {
            return Ok(Some(target));
        }
        Ok(self
            .module
            .bound_symbol(slot, raw)
            .and_then(|name| self.exports.lookup(&name)))
    }

    pub fn check_count(&self, owner: Address, count: u32, what: &str) -> Result<(), MetadataError> {
        if count > self.limits.max_trailing_records {
            return Err(MetadataError::malformed(
                owner,
                format!("{} count {} exceeds limit {}", what, count, self.limits.max_trailing_records),
            ));
        }
        Ok(())
    }
}
