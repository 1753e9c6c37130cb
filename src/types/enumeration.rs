// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::{ContextPath, EnumCase, EnumDescriptor, MetadataError};
use crate::types::{decoded_or_default, names, Conformance, TypeInfo, TypeKind};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug)]
pub struct Enum {
    descriptor: EnumDescriptor,
    path: ContextPath,
    conformances: Vec<Conformance>,
}

impl Enum {
    pub fn new(descriptor: EnumDescriptor, conformances: Vec<Conformance>) -> Result<Self, MetadataError> {
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

    pub fn descriptor(&self) -> &EnumDescriptor {
        &self.descriptor
    }

    pub fn cases(&self) -> Result<&[EnumCase], MetadataError> {
        self.descriptor.cases()
    }

    pub fn num_payload_cases(&self) -> u32 {
        self.descriptor.num_payload_cases()
    }

    pub fn num_empty_cases(&self) -> u32 {
        self.descriptor.num_empty_cases()
    }

    pub fn conformances(&self) -> &[Conformance] {
        &self.conformances
    }

    pub fn conforms_to(&self, protocol: &str) -> bool {
        self.conformances.iter().any(|c| names(c.protocol().path(), protocol))
    }

    pub fn info(&self) -> TypeInfo {
        let mut info = TypeInfo::new(TypeKind::Enum, &self.path, self.address())
            .with_conformances(&self.conformances);
        info.cases = decoded_or_default("cases", &self.path, self.cases().map(<[_]>::to_vec));
        info
    }
}

impl fmt::Display for Enum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enum {}", self.path)
    }
}

impl Serialize for Enum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.info().serialize(serializer)
    }
}
