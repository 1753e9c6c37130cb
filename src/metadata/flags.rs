// Sun Oct 18 2026 - Alex

use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

const KIND_MASK: u32 = 0x1f;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContextDescriptorKind {
    Module,
    Extension,
    Anonymous,
    Protocol,
    OpaqueType,
    Class,
    Struct,
    Enum,
}

impl ContextDescriptorKind {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Module),
            1 => Some(Self::Extension),
            2 => Some(Self::Anonymous),
            3 => Some(Self::Protocol),
            4 => Some(Self::OpaqueType),
            16 => Some(Self::Class),
            17 => Some(Self::Struct),
            18 => Some(Self::Enum),
            _ => None,
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            Self::Module => 0,
            Self::Extension => 1,
            Self::Anonymous => 2,
            Self::Protocol => 3,
            Self::OpaqueType => 4,
            Self::Class => 16,
            Self::Struct => 17,
            Self::Enum => 18,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Self::Class | Self::Struct | Self::Enum)
    }
}

impl fmt::Display for ContextDescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Module => "module",
            Self::Extension => "extension",
            Self::Anonymous => "anonymous",
            Self::Protocol => "protocol",
            Self::OpaqueType => "opaque type",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Common context-descriptor flags word. The low five bits hold the kind,
    /// bits 8..16 the version and bits 16..32 kind-specific flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContextDescriptorFlags: u32 {
        const IS_UNIQUE = 0x40;
        const IS_GENERIC = 0x80;
        const _ = !0;
    }
}

impl ContextDescriptorFlags {
    pub fn kind_raw(&self) -> u8 {
        (self.bits() & KIND_MASK) as u8
    }

    pub fn kind(&self) -> Option<ContextDescriptorKind> {
        ContextDescriptorKind::from_raw(self.kind_raw())
    }

    pub fn version(&self) -> u8 {
        ((self.bits() >> 8) & 0xff) as u8
    }

    pub fn kind_specific(&self) -> u16 {
        (self.bits() >> 16) as u16
    }

    pub fn is_generic(&self) -> bool {
        self.contains(Self::IS_GENERIC)
    }

    pub fn is_unique(&self) -> bool {
        self.contains(Self::IS_UNIQUE)
    }

    pub fn type_flags(&self) -> TypeContextFlags {
        TypeContextFlags::from_bits_retain(self.kind_specific())
    }
}

bitflags! {
    /// Kind-specific flags of class, struct and enum descriptors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeContextFlags: u16 {
        const HAS_IMPORT_INFO = 1 << 2;
        const HAS_CANONICAL_PRESPECIALIZATIONS = 1 << 3;
        const HAS_LAYOUT_STRING = 1 << 4;
        const CLASS_IS_ACTOR = 1 << 7;
        const CLASS_IS_DEFAULT_ACTOR = 1 << 8;
        const CLASS_ARE_IMMEDIATE_MEMBERS_NEGATIVE = 1 << 12;
        const CLASS_HAS_RESILIENT_SUPERCLASS = 1 << 13;
        const CLASS_HAS_OVERRIDE_TABLE = 1 << 14;
        const CLASS_HAS_VTABLE = 1 << 15;
        const _ = !0;
    }
}

impl TypeContextFlags {
    pub fn metadata_initialization(&self) -> u8 {
        (self.bits() & 0x3) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeReferenceKind {
    DirectTypeDescriptor,
    IndirectTypeDescriptor,
    DirectObjCClassName,
    IndirectObjCClass,
}

impl TypeReferenceKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::DirectTypeDescriptor),
            1 => Some(Self::IndirectTypeDescriptor),
            2 => Some(Self::DirectObjCClassName),
            3 => Some(Self::IndirectObjCClass),
            _ => None,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConformanceFlags: u32 {
        const IS_RETROACTIVE = 1 << 6;
        const IS_SYNTHESIZED_NON_UNIQUE = 1 << 7;
        const HAS_RESILIENT_WITNESSES = 1 << 16;
        const HAS_GENERIC_WITNESS_TABLE = 1 << 17;
        const _ = !0;
    }
}

impl ConformanceFlags {
    pub fn type_reference_kind(&self) -> Option<TypeReferenceKind> {
        TypeReferenceKind::from_raw((self.bits() >> 3) & 0x7)
    }

    pub fn num_conditional_requirements(&self) -> u8 {
        ((self.bits() >> 8) & 0xff) as u8
    }

    pub fn with_type_reference_kind(kind: TypeReferenceKind) -> Self {
        let raw = match kind {
            TypeReferenceKind::DirectTypeDescriptor => 0,
            TypeReferenceKind::IndirectTypeDescriptor => 1,
            TypeReferenceKind::DirectObjCClassName => 2,
            TypeReferenceKind::IndirectObjCClass => 3,
        };
        Self::from_bits_retain(raw << 3)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldRecordFlags: u32 {
        const IS_INDIRECT_CASE = 0x1;
        const IS_VAR = 0x2;
        const IS_ARTIFICIAL = 0x4;
        const _ = !0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldDescriptorKind {
    Struct,
    Class,
    Enum,
    MultiPayloadEnum,
    Protocol,
    ClassProtocol,
    ObjCProtocol,
    ObjCClass,
    Unknown(u16),
}

impl From<u16> for FieldDescriptorKind {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::Struct,
            1 => Self::Class,
            2 => Self::Enum,
            3 => Self::MultiPayloadEnum,
            4 => Self::Protocol,
            5 => Self::ClassProtocol,
            6 => Self::ObjCProtocol,
            7 => Self::ObjCClass,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProtocolRequirementKind {
    BaseProtocol,
    Method,
    Init,
    Getter,
    Setter,
    ReadCoroutine,
    ModifyCoroutine,
    AssociatedTypeAccessFunction,
    AssociatedConformanceAccessFunction,
    Unknown(u8),
}

impl ProtocolRequirementKind {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::BaseProtocol,
            1 => Self::Method,
            2 => Self::Init,
            3 => Self::Getter,
            4 => Self::Setter,
            5 => Self::ReadCoroutine,
            6 => Self::ModifyCoroutine,
            7 => Self::AssociatedTypeAccessFunction,
            8 => Self::AssociatedConformanceAccessFunction,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            Self::BaseProtocol => 0,
            Self::Method => 1,
            Self::Init => 2,
            Self::Getter => 3,
            Self::Setter => 4,
            Self::ReadCoroutine => 5,
            Self::ModifyCoroutine => 6,
            Self::AssociatedTypeAccessFunction => 7,
            Self::AssociatedConformanceAccessFunction => 8,
            Self::Unknown(raw) => *raw,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProtocolRequirementFlags: u32 {
        const IS_INSTANCE = 0x10;
        const IS_ASYNC = 0x20;
        const _ = !0;
    }
}

impl ProtocolRequirementFlags {
    pub fn kind(&self) -> ProtocolRequirementKind {
        ProtocolRequirementKind::from_raw((self.bits() & 0x0f) as u8)
    }
}

bitflags! {
    /// Kind-specific flags of protocol descriptors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProtocolContextFlags: u16 {
        const HAS_NO_CLASS_CONSTRAINT = 1 << 0;
        const IS_RESILIENT = 1 << 1;
        const _ = !0;
    }
}

impl ProtocolContextFlags {
    pub fn is_class_constrained(&self) -> bool {
        !self.contains(Self::HAS_NO_CLASS_CONSTRAINT)
    }

    pub fn special_protocol(&self) -> u8 {
        ((self.bits() >> 2) & 0x3f) as u8
    }
}
