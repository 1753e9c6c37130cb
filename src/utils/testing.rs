// Sun Oct 18 2026 - Alex

use crate::memory::{Address, BinarySection, BinarySymbol, ByteImage};
use crate::metadata::flags::{
    ConformanceFlags, ContextDescriptorKind, ProtocolContextFlags, ProtocolRequirementFlags, TypeReferenceKind,
};
use crate::metadata::sections::{MACHO_CONFORMANCES_SECTION, MACHO_PROTOCOLS_SECTION, MACHO_TYPES_SECTION};

pub const DEFAULT_BASE: u64 = 0x10_0000;

const UNIQUE_FLAG: u32 = 0x40;
const DIRECT_CONTEXT_REF: u8 = 0x01;

/// Type of a synthesized field or enum case.
#[derive(Debug, Clone, Copy)]
pub enum FieldType<'a> {
    Mangled(&'a str),
    Descriptor(Address),
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<'a> {
    pub name: &'a str,
    pub ty: FieldType<'a>,
    pub is_var: bool,
}

impl<'a> FieldSpec<'a> {
    pub fn var(name: &'a str, ty: FieldType<'a>) -> Self {
        Self { name, ty, is_var: true }
    }

    pub fn constant(name: &'a str, ty: FieldType<'a>) -> Self {
        Self { name, ty, is_var: false }
    }

    pub fn case(name: &'a str, ty: FieldType<'a>) -> Self {
        Self { name, ty, is_var: false }
    }
}

/// Lays out Swift metadata records byte for byte in an in-memory image.
/// Every helper appends to the image and returns the address of what it
/// wrote; types, protocols and conformances are listed in the matching
/// sections when `build` runs.
pub struct ImageBuilder {
    name: String,
    base: Address,
    data: Vec<u8>,
    types: Vec<Address>,
    protocols: Vec<Address>,
    conformances: Vec<Address>,
    symbols: Vec<BinarySymbol>,
    binds: Vec<(Address, String)>,
    corrupt_header: bool,
}

impl ImageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_base(name, Address::new(DEFAULT_BASE))
    }

    pub fn with_base(name: impl Into<String>, base: Address) -> Self {
        Self {
            name: name.into(),
            base,
            // keep offset 0 unused so no record sits at the base address
            data: vec![0; 16],
            types: Vec::new(),
            protocols: Vec::new(),
            conformances: Vec::new(),
            symbols: Vec::new(),
            binds: Vec::new(),
            corrupt_header: false,
        }
    }

    pub fn corrupt_header(mut self) -> Self {
        self.corrupt_header = true;
        self
    }

    pub fn here(&self) -> Address {
        self.base + self.data.len() as u64
    }

    fn align(&mut self, alignment: usize) {
        while self.data.len() % alignment != 0 {
            self.data.push(0);
        }
    }

    fn push_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn push_relative(&mut self, target: Option<Address>) {
        let offset = match target {
            Some(target) => target.distance(self.here()) as i32,
            None => 0,
        };
        self.data.extend_from_slice(&offset.to_le_bytes());
    }

    pub fn string(&mut self, value: &str) -> Address {
        let address = self.here();
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        address
    }

    /// A pointer-sized slot holding `target`, for indirect references.
    pub fn pointer_slot(&mut self, target: Address) -> Address {
        self.align(8);
        let address = self.here();
        self.push_u64(target.as_u64());
        address
    }

    /// Mangled type name; a descriptor type becomes a direct symbolic
    /// reference.
    pub fn mangled(&mut self, ty: FieldType) -> Option<Address> {
        match ty {
            FieldType::Mangled(text) => Some(self.string(text)),
            FieldType::Descriptor(target) => {
                let address = self.here();
                self.data.push(DIRECT_CONTEXT_REF);
                self.push_relative(Some(target));
                self.data.push(0);
                Some(address)
            }
            FieldType::None => None,
        }
    }

    pub fn module(&mut self, name: &str) -> Address {
        let name = self.string(name);
        self.align(4);
        let address = self.here();
        self.push_u32(ContextDescriptorKind::Module.raw() as u32);
        self.push_relative(None);
        self.push_relative(Some(name));
        address
    }

    pub fn anonymous(&mut self, parent: Address) -> Address {
        self.align(4);
        let address = self.here();
        self.push_u32(ContextDescriptorKind::Anonymous.raw() as u32);
        self.push_relative(Some(parent));
        address
    }

    pub fn extension(&mut self, parent: Address, extended: Address) -> Address {
        let mangled = self.mangled(FieldType::Descriptor(extended));
        self.align(4);
        let address = self.here();
        self.push_u32(ContextDescriptorKind::Extension.raw() as u32);
        self.push_relative(Some(parent));
        self.push_relative(mangled);
        address
    }

    fn field_descriptor(&mut self, fields: &[FieldSpec]) -> Option<Address> {
        if fields.is_empty() {
            return None;
        }
        let names: Vec<_> = fields.iter().map(|f| self.string(f.name)).collect();
        let types: Vec<_> = fields.iter().map(|f| self.mangled(f.ty)).collect();

        self.align(4);
        let address = self.here();
        self.push_relative(None);
        self.push_relative(None);
        self.push_u16(0);
        self.push_u16(12);
        self.push_u32(fields.len() as u32);
        for (i, field) in fields.iter().enumerate() {
            self.push_u32(if field.is_var { 0x2 } else { 0 });
            self.push_relative(types[i]);
            self.push_relative(Some(names[i]));
        }
        Some(address)
    }

    fn type_header(
        &mut self,
        kind: ContextDescriptorKind,
        parent: Address,
        name: Address,
        fields: Option<Address>,
    ) -> Address {
        self.align(4);
        let address = self.here();
        self.push_u32(kind.raw() as u32 | UNIQUE_FLAG);
        self.push_relative(Some(parent));
        self.push_relative(Some(name));
        self.push_relative(None);
        self.push_relative(fields);
        self.types.push(address);
        address
    }

    pub fn class(&mut self, parent: Address, name: &str, fields: &[FieldSpec]) -> Address {
        self.class_with_superclass(parent, name, None, fields)
    }

    pub fn class_with_superclass(
        &mut self,
        parent: Address,
        name: &str,
        superclass: Option<FieldType>,
        fields: &[FieldSpec],
    ) -> Address {
        let name = self.string(name);
        let superclass = superclass.and_then(|ty| self.mangled(ty));
        let field_descriptor = self.field_descriptor(fields);
        let address = self.type_header(ContextDescriptorKind::Class, parent, name, field_descriptor);
        self.push_relative(superclass);
        self.push_u32(2);
        self.push_u32(10);
        self.push_u32(0);
        self.push_u32(fields.len() as u32);
        self.push_u32(10);
        address
    }

    pub fn structure(&mut self, parent: Address, name: &str, fields: &[FieldSpec]) -> Address {
        let name = self.string(name);
        let field_descriptor = self.field_descriptor(fields);
        let address = self.type_header(ContextDescriptorKind::Struct, parent, name, field_descriptor);
        self.push_u32(fields.len() as u32);
        self.push_u32(2);
        address
    }

    /// Enum whose first `payload_cases` cases carry a payload.
    pub fn enumeration(&mut self, parent: Address, name: &str, cases: &[FieldSpec], payload_cases: u32) -> Address {
        let name = self.string(name);
        let field_descriptor = self.field_descriptor(cases);
        let address = self.type_header(ContextDescriptorKind::Enum, parent, name, field_descriptor);
        self.push_u32(payload_cases);
        self.push_u32((cases.len() as u32).saturating_sub(payload_cases));
        address
    }

    pub fn protocol(&mut self, parent: Address, name: &str) -> Address {
        self.protocol_with(parent, name, 0, &[], &[])
    }

    /// A protocol restricted to class types (`protocol P: AnyObject`).
    pub fn class_protocol(&mut self, parent: Address, name: &str) -> Address {
        self.write_protocol(parent, name, ProtocolContextFlags::empty(), 0, &[], &[])
    }

    pub fn protocol_with(
        &mut self,
        parent: Address,
        name: &str,
        signature_requirements: u32,
        requirements: &[(ProtocolRequirementFlags, bool)],
        associated_types: &[&str],
    ) -> Address {
        self.write_protocol(
            parent,
            name,
            ProtocolContextFlags::HAS_NO_CLASS_CONSTRAINT,
            signature_requirements,
            requirements,
            associated_types,
        )
    }

    fn write_protocol(
        &mut self,
        parent: Address,
        name: &str,
        protocol_flags: ProtocolContextFlags,
        signature_requirements: u32,
        requirements: &[(ProtocolRequirementFlags, bool)],
        associated_types: &[&str],
    ) -> Address {
        let name = self.string(name);
        let associated = if associated_types.is_empty() {
            None
        } else {
            Some(self.string(&associated_types.join(" ")))
        };

        self.align(4);
        let address = self.here();
        self.push_u32(
            ContextDescriptorKind::Protocol.raw() as u32 | UNIQUE_FLAG | (protocol_flags.bits() as u32) << 16,
        );
        self.push_relative(Some(parent));
        self.push_relative(Some(name));
        self.push_u32(signature_requirements);
        self.push_u32(requirements.len() as u32);
        self.push_relative(associated);
        for _ in 0..signature_requirements {
            self.data.extend_from_slice(&[0; 12]);
        }
        for (flags, has_default) in requirements {
            self.push_u32(flags.bits());
            let default_implementation = has_default.then_some(address);
            self.push_relative(default_implementation);
        }
        self.protocols.push(address);
        address
    }

    /// A descriptor with arbitrary flags, listed in the types section.
    pub fn raw_descriptor(&mut self, flags: u32, parent: Option<Address>, name: &str) -> Address {
        let name = self.string(name);
        self.align(4);
        let address = self.here();
        self.push_u32(flags);
        self.push_relative(parent);
        self.push_relative(Some(name));
        self.data.extend_from_slice(&[0; 32]);
        self.types.push(address);
        address
    }

    /// Lists an already written type descriptor a second time.
    pub fn list_type(&mut self, address: Address) {
        self.types.push(address);
    }

    pub fn conformance(&mut self, protocol: Address, type_descriptor: Address) -> Address {
        self.conformance_with(
            protocol,
            Some(type_descriptor),
            ConformanceFlags::with_type_reference_kind(TypeReferenceKind::DirectTypeDescriptor),
        )
    }

    /// Conformance whose type is reached through a pointer slot.
    pub fn indirect_conformance(&mut self, protocol: Address, type_descriptor: Address) -> Address {
        let slot = self.pointer_slot(type_descriptor);
        self.conformance_with(
            protocol,
            Some(slot),
            ConformanceFlags::with_type_reference_kind(TypeReferenceKind::IndirectTypeDescriptor),
        )
    }

    /// Conformance to a protocol of another image: the protocol is reached
    /// through a zeroed slot bound to `symbol`.
    pub fn imported_conformance(&mut self, symbol: &str, type_descriptor: Address) -> Address {
        self.align(8);
        let slot = self.here();
        self.push_u64(0);
        self.binds.push((slot, symbol.to_string()));

        let address = self.here();
        let offset = slot.distance(address) as i32 | 1;
        self.data.extend_from_slice(&offset.to_le_bytes());
        self.push_relative(Some(type_descriptor));
        self.push_relative(None);
        self.push_u32(ConformanceFlags::with_type_reference_kind(TypeReferenceKind::DirectTypeDescriptor).bits());
        self.conformances.push(address);
        address
    }

    pub fn objc_conformance(&mut self, protocol: Address, class_name: &str) -> Address {
        let name = self.string(class_name);
        self.conformance_with(
            protocol,
            Some(name),
            ConformanceFlags::with_type_reference_kind(TypeReferenceKind::DirectObjCClassName),
        )
    }

    pub fn conformance_with(&mut self, protocol: Address, type_ref: Option<Address>, flags: ConformanceFlags) -> Address {
        self.align(4);
        let address = self.here();
        self.push_relative(Some(protocol));
        self.push_relative(type_ref);
        self.push_relative(None);
        self.push_u32(flags.bits());
        self.conformances.push(address);
        address
    }

    pub fn symbol(&mut self, name: &str, address: Address) -> &mut Self {
        self.symbols.push(BinarySymbol::new(name, address));
        self
    }

    fn section(&mut self, sectname: &str, entries: &[Address]) -> BinarySection {
        self.align(4);
        let start = self.here();
        for entry in entries {
            self.push_relative(Some(*entry));
        }
        BinarySection::new("__TEXT", sectname, start, entries.len() as u64 * 4)
    }

    pub fn build(mut self) -> ByteImage {
        let types = std::mem::take(&mut self.types);
        let protocols = std::mem::take(&mut self.protocols);
        let conformances = std::mem::take(&mut self.conformances);

        let sections = vec![
            self.section(MACHO_TYPES_SECTION, &types),
            self.section(MACHO_PROTOCOLS_SECTION, &protocols),
            self.section(MACHO_CONFORMANCES_SECTION, &conformances),
        ];

        let image = ByteImage::new(self.name, self.base, self.data)
            .with_sections(sections)
            .with_symbols(self.symbols)
            .with_binds(self.binds);
        if self.corrupt_header {
            image.with_corrupt_header()
        } else {
            image
        }
    }
}
