// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::{ContextPath, Field, MetadataError, StructDescriptor};
use crate::types::{decoded_or_default, names, Conformance, TypeInfo, TypeKind};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug)]
pub struct Struct {
    descriptor: StructDescriptor,
    path: ContextPath,
    conformances: Vec<Conformance>,
}

impl Struct {
    pub fn new(descriptor: StructDescriptor, conformances: Vec<Conformance>) -> Result<Self, MetadataError> {
        let path = descriptor.header().path()?.clone();
        Ok(Self {
            descriptor,
            path,
            conformances,
        })
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

    pub fn descriptor(&self) -> &StructDescriptor {
        &self.descriptor
    }

    pub fn fields(&self) -> Result<&[Field], MetadataError> {
        self.descriptor.fields()
    }

    pub fn conformances(&self) -> &[Conformance] {
        &self.conformances
    }

    pub fn conforms_to(&self, protocol: &str) -> bool {
        self.conformances.iter().any(|c| names(c.protocol().path(), protocol))
    }

    pub fn info(&self) -> TypeInfo {
        let mut info = TypeInfo::new(TypeKind::Struct, &self.path, self.address())
            .with_conformances(&self.conformances);
        info.fields = decoded_or_default("fields", &self.path, self.fields().map(<[_]>::to_vec));
        info
    }
}

impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "struct {}", self.path)
    }
}

impl Serialize for Struct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.info().serialize(serializer)
    }
}
