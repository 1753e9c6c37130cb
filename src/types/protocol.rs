// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::{ContextPath, MetadataError, ProtocolDescriptor, ProtocolRequirement};
use crate::types::{decoded_or_default, TypeInfo, TypeKind};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug)]
pub struct Protocol {
    descriptor: ProtocolDescriptor,
    path: ContextPath,
}

impl Protocol {
    /// Wraps a decoded descriptor. Fails when its name cannot be resolved.
    pub fn new(descriptor: ProtocolDescriptor) -> Result<Self, MetadataError> {
        let path = descriptor.header().path()?.clone();
        Ok(Self { descriptor, path })
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn full_name(&self) -> String {
        self.path.qualified()
    }

    pub fn module_name(&self) -> &str {
        self.path.module()
    }

    pub fn mangled_name(&self) -> String {
        self.path.mangled_name()
    }

    pub fn path(&self) -> &ContextPath {
        &self.path
    }

    pub fn address(&self) -> Address {
        self.descriptor.header().address()
    }

    pub fn descriptor(&self) -> &ProtocolDescriptor {
        &self.descriptor
    }

    pub fn requirements(&self) -> Result<&[ProtocolRequirement], MetadataError> {
        self.descriptor.requirements()
    }

    pub fn associated_type_names(&self) -> Result<&[String], MetadataError> {
        self.descriptor.associated_type_names()
    }

    pub fn is_class_constrained(&self) -> bool {
        self.descriptor.is_class_constrained()
    }

    pub fn info(&self) -> TypeInfo {
        let mut info = TypeInfo::new(TypeKind::Protocol, &self.path, self.address());
        info.requirements = decoded_or_default("requirements", &self.path, self.requirements().map(<[_]>::to_vec));
        info.associated_types = decoded_or_default(
            "associated types",
            &self.path,
            self.associated_type_names().map(<[_]>::to_vec),
        );
        info
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol {}", self.path)
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.info().serialize(serializer)
    }
}
