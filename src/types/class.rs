// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::{ClassDescriptor, ContextPath, Field, MetadataError};
use crate::types::{decoded_or_default, names, Conformance, TypeInfo, TypeKind};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug)]
pub struct Class {
    descriptor: ClassDescriptor,
    path: ContextPath,
    conformances: Vec<Conformance>,
}

impl Class {
    pub fn new(descriptor: ClassDescriptor, conformances: Vec<Conformance>) -> Result<Self, MetadataError> {
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

    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    pub fn superclass_name(&self) -> Result<Option<&str>, MetadataError> {
        self.descriptor.superclass_name()
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
        let mut info = TypeInfo::new(TypeKind::Class, &self.path, self.address())
            .with_conformances(&self.conformances);
        info.superclass = decoded_or_default(
            "superclass",
            &self.path,
            self.superclass_name().map(|s| s.map(str::to_string)),
        );
        info.fields = decoded_or_default("fields", &self.path, self.fields().map(<[_]>::to_vec));
        info
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.path)
    }
}

impl Serialize for Class {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.info().serialize(serializer)
    }
}
