// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::context::{self, ContextPath};
use crate::metadata::fields::{read_mangled, EnumCase, Field, FieldDescriptor};
use crate::metadata::flags::{ProtocolContextFlags, TypeContextFlags};
use crate::metadata::requirements::{self, ProtocolRequirement, GENERIC_REQUIREMENT_SIZE};
use crate::metadata::{
    ContextDescriptorFlags, ContextDescriptorKind, ImageContext, MetadataError, RecordCursor,
    RelativePointer,
};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

pub const CLASS_DESCRIPTOR_SIZE: usize = 44;
pub const STRUCT_DESCRIPTOR_SIZE: usize = 28;
pub const ENUM_DESCRIPTOR_SIZE: usize = 28;
pub const PROTOCOL_DESCRIPTOR_SIZE: usize = 24;

const PAYLOAD_CASES_MASK: u32 = 0x00ff_ffff;
const PAYLOAD_SIZE_OFFSET_SHIFT: u32 = 24;

/// Fields shared by every named context descriptor: flags, parent and name.
/// Name and path are resolved on first use.
pub struct DescriptorHeader {
    image: Arc<ImageContext>,
    address: Address,
    flags: ContextDescriptorFlags,
    kind: ContextDescriptorKind,
    parent: RelativePointer,
    name_ptr: RelativePointer,
    name: OnceCell<String>,
    path: OnceCell<ContextPath>,
}

impl DescriptorHeader {
    fn read(
        image: &Arc<ImageContext>,
        address: Address,
        expected: ContextDescriptorKind,
        cursor: &mut RecordCursor,
    ) -> Result<Self, MetadataError> {
        let flags = ContextDescriptorFlags::from_bits_retain(cursor.u32());
        let parent = cursor.relative();
        let name_ptr = cursor.relative();

        match flags.kind() {
            Some(kind) if kind == expected => {}
            Some(kind) => {
                return Err(MetadataError::malformed(
                    address,
                    format!("kind tag {} does not match {} layout", kind, expected),
                ))
            }
            None => {
                return Err(MetadataError::malformed(
                    address,
                    format!("unknown kind tag 0x{:02x}", flags.kind_raw()),
                ))
            }
        }
        if name_ptr.is_null() {
            return Err(MetadataError::malformed(address, "missing name"));
        }

        Ok(Self {
            image: Arc::clone(image),
            address,
            flags,
            kind: expected,
            parent,
            name_ptr,
            name: OnceCell::new(),
            path: OnceCell::new(),
        })
    }

    pub fn image(&self) -> &Arc<ImageContext> {
        &self.image
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn flags(&self) -> ContextDescriptorFlags {
        self.flags
    }

    pub fn kind(&self) -> ContextDescriptorKind {
        self.kind
    }

    pub fn parent(&self) -> RelativePointer {
        self.parent
    }

    pub fn name(&self) -> Result<&str, MetadataError> {
        self.name
            .get_or_try_init(|| self.image.read_string(self.name_ptr, self.address, "name"))
            .map(String::as_str)
    }

    pub fn path(&self) -> Result<&ContextPath, MetadataError> {
        self.path.get_or_try_init(|| {
            let name = self.name()?;
            context::resolve_path(
                &self.image,
                self.address,
                self.kind,
                name,
                self.parent,
                self.image.limits().max_context_depth,
            )
        })
    }

    pub fn full_name(&self) -> Result<String, MetadataError> {
        Ok(self.path()?.qualified())
    }

    pub fn module_name(&self) -> Result<&str, MetadataError> {
        Ok(self.path()?.module())
    }
}

impl fmt::Debug for DescriptorHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorHeader")
            .field("address", &self.address)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("name", &self.name.get())
            .finish()
    }
}

/// Access function and field descriptor references of a nominal type.
#[derive(Debug)]
struct NominalType {
    access_function: RelativePointer,
    fields_ptr: RelativePointer,
    field_descriptor: OnceCell<Option<FieldDescriptor>>,
}

impl NominalType {
    fn read(cursor: &mut RecordCursor) -> Self {
        Self {
            access_function: cursor.relative(),
            fields_ptr: cursor.relative(),
            field_descriptor: OnceCell::new(),
        }
    }

    fn field_descriptor(&self, header: &DescriptorHeader) -> Result<Option<&FieldDescriptor>, MetadataError> {
        self.field_descriptor
            .get_or_try_init(|| match self.fields_ptr.target() {
                Some(target) => FieldDescriptor::read(header.image(), target, header.address()).map(Some),
                None => Ok(None),
            })
            .map(Option::as_ref)
    }
}

#[derive(Debug)]
pub struct ClassDescriptor {
    header: DescriptorHeader,
    nominal: NominalType,
    superclass: RelativePointer,
    metadata_negative_size_in_words: u32,
    metadata_positive_size_in_words: u32,
    num_immediate_members: u32,
    num_fields: u32,
    field_offset_vector_offset: u32,
    fields: OnceCell<Vec<Field>>,
    superclass_name: OnceCell<Option<String>>,
}

impl ClassDescriptor {
    pub fn decode(image: &Arc<ImageContext>, address: Address) -> Result<Self, MetadataError> {
        let mut cursor = image.read_record(address, CLASS_DESCRIPTOR_SIZE)?;
        let header = DescriptorHeader::read(image, address, ContextDescriptorKind::Class, &mut cursor)?;
        let nominal = NominalType::read(&mut cursor);

        Ok(Self {
            header,
            nominal,
            superclass: cursor.relative(),
            metadata_negative_size_in_words: cursor.u32(),
            metadata_positive_size_in_words: cursor.u32(),
            num_immediate_members: cursor.u32(),
            num_fields: cursor.u32(),
            field_offset_vector_offset: cursor.u32(),
            fields: OnceCell::new(),
            superclass_name: OnceCell::new(),
        })
    }

    pub fn header(&self) -> &DescriptorHeader {
        &self.header
    }

    pub fn num_fields(&self) -> u32 {
        self.num_fields
    }

    pub fn field_offset_vector_offset(&self) -> u32 {
        self.field_offset_vector_offset
    }

    pub fn num_immediate_members(&self) -> u32 {
        self.num_immediate_members
    }

    pub fn metadata_negative_size_in_words(&self) -> u32 {
        self.metadata_negative_size_in_words
    }

    pub fn metadata_positive_size_in_words(&self) -> u32 {
        self.metadata_positive_size_in_words
    }

    pub fn has_access_function(&self) -> bool {
        !self.nominal.access_function.is_null()
    }

    pub fn has_vtable(&self) -> bool {
        self.header.flags().type_flags().contains(TypeContextFlags::CLASS_HAS_VTABLE)
    }

    pub fn is_actor(&self) -> bool {
        self.header.flags().type_flags().contains(TypeContextFlags::CLASS_IS_ACTOR)
    }

    pub fn has_superclass(&self) -> bool {
        !self.superclass.is_null()
    }

    pub fn superclass_name(&self) -> Result<Option<&str>, MetadataError> {
        self.superclass_name
            .get_or_try_init(|| {
                let mangled = read_mangled(self.header.image(), self.superclass.target(), self.header.address())?;
                Ok(mangled.map(|m| m.readable(self.header.image())))
            })
            .map(Option::as_deref)
    }

    pub fn fields(&self) -> Result<&[Field], MetadataError> {
        self.fields
            .get_or_try_init(|| {
                Ok(self
                    .nominal
                    .field_descriptor(&self.header)?
                    .map(|fd| fd.fields(self.header.image()))
                    .unwrap_or_default())
            })
            .map(Vec::as_slice)
    }
}

#[derive(Debug)]
pub struct StructDescriptor {
    header: DescriptorHeader,
    nominal: NominalType,
    num_fields: u32,
    field_offset_vector_offset: u32,
    fields: OnceCell<Vec<Field>>,
}

impl StructDescriptor {
    pub fn decode(image: &Arc<ImageContext>, address: Address) -> Result<Self, MetadataError> {
        let mut cursor = image.read_record(address, STRUCT_DESCRIPTOR_SIZE)?;
        let header = DescriptorHeader::read(image, address, ContextDescriptorKind::Struct, &mut cursor)?;
        let nominal = NominalType::read(&mut cursor);

        Ok(Self {
            header,
            nominal,
            num_fields: cursor.u32(),
            field_offset_vector_offset: cursor.u32(),
            fields: OnceCell::new(),
        })
    }

    pub fn header(&self) -> &DescriptorHeader {
        &self.header
    }

    pub fn num_fields(&self) -> u32 {
        self.num_fields
    }

    pub fn field_offset_vector_offset(&self) -> u32 {
        self.field_offset_vector_offset
    }

    pub fn has_access_function(&self) -> bool {
        !self.nominal.access_function.is_null()
    }

    pub fn fields(&self) -> Result<&[Field], MetadataError> {
        self.fields
            .get_or_try_init(|| {
                Ok(self
                    .nominal
                    .field_descriptor(&self.header)?
                    .map(|fd| fd.fields(self.header.image()))
                    .unwrap_or_default())
            })
            .map(Vec::as_slice)
    }
}

#[derive(Debug)]
pub struct EnumDescriptor {
    header: DescriptorHeader,
    nominal: NominalType,
    payload_cases_and_size_offset: u32,
    num_empty_cases: u32,
    cases: OnceCell<Vec<EnumCase>>,
}

impl EnumDescriptor {
    pub fn decode(image: &Arc<ImageContext>, address: Address) -> Result<Self, MetadataError> {
        let mut cursor = image.read_record(address, ENUM_DESCRIPTOR_SIZE)?;
        let header = DescriptorHeader::read(image, address, ContextDescriptorKind::Enum, &mut cursor)?;
        let nominal = NominalType::read(&mut cursor);

        Ok(Self {
            header,
            nominal,
            payload_cases_and_size_offset: cursor.u32(),
            num_empty_cases: cursor.u32(),
            cases: OnceCell::new(),
        })
    }

    pub fn header(&self) -> &DescriptorHeader {
        &self.header
    }

    pub fn num_payload_cases(&self) -> u32 {
        self.payload_cases_and_size_offset & PAYLOAD_CASES_MASK
    }

    pub fn payload_size_offset(&self) -> u32 {
        self.payload_cases_and_size_offset >> PAYLOAD_SIZE_OFFSET_SHIFT
    }

    pub fn num_empty_cases(&self) -> u32 {
        self.num_empty_cases
    }

    pub fn num_cases(&self) -> u32 {
        self.num_payload_cases().saturating_add(self.num_empty_cases)
    }

    pub fn has_access_function(&self) -> bool {
        !self.nominal.access_function.is_null()
    }

    pub fn cases(&self) -> Result<&[EnumCase], MetadataError> {
        self.cases
            .get_or_try_init(|| {
                Ok(self
                    .nominal
                    .field_descriptor(&self.header)?
                    .map(|fd| fd.cases(self.header.image(), self.num_payload_cases()))
                    .unwrap_or_default())
            })
            .map(Vec::as_slice)
    }
}

#[derive(Debug)]
pub struct ProtocolDescriptor {
    header: DescriptorHeader,
    num_requirements_in_signature: u32,
    num_requirements: u32,
    associated_type_names_ptr: RelativePointer,
    requirements: OnceCell<Vec<ProtocolRequirement>>,
    associated_type_names: OnceCell<Vec<String>>,
}

impl ProtocolDescriptor {
    pub fn decode(image: &Arc<ImageContext>, address: Address) -> Result<Self, MetadataError> {
        let mut cursor = image.read_record(address, PROTOCOL_DESCRIPTOR_SIZE)?;
        let header = DescriptorHeader::read(image, address, ContextDescriptorKind::Protocol, &mut cursor)?;
        let num_requirements_in_signature = cursor.u32();
        let num_requirements = cursor.u32();
        image.check_count(address, num_requirements_in_signature, "requirement signature")?;
        image.check_count(address, num_requirements, "requirement")?;

        Ok(Self {
            header,
            num_requirements_in_signature,
            num_requirements,
            associated_type_names_ptr: cursor.relative(),
            requirements: OnceCell::new(),
            associated_type_names: OnceCell::new(),
        })
    }

    pub fn header(&self) -> &DescriptorHeader {
        &self.header
    }

    pub fn num_requirements_in_signature(&self) -> u32 {
        self.num_requirements_in_signature
    }

    pub fn num_requirements(&self) -> u32 {
        self.num_requirements
    }

    pub fn is_class_constrained(&self) -> bool {
        ProtocolContextFlags::from_bits_retain(self.header.flags().kind_specific()).is_class_constrained()
    }

    pub fn is_resilient(&self) -> bool {
        ProtocolContextFlags::from_bits_retain(self.header.flags().kind_specific())
            .contains(ProtocolContextFlags::IS_RESILIENT)
    }

    pub fn requirements(&self) -> Result<&[ProtocolRequirement], MetadataError> {
        self.requirements
            .get_or_try_init(|| {
                let start = self.header.address()
                    + PROTOCOL_DESCRIPTOR_SIZE as u64
                    + self.num_requirements_in_signature as u64 * GENERIC_REQUIREMENT_SIZE;
                requirements::read_requirements(
                    self.header.image(),
                    self.header.address(),
                    start,
                    self.num_requirements,
                )
            })
            .map(Vec::as_slice)
    }

    pub fn associated_type_names(&self) -> Result<&[String], MetadataError> {
        self.associated_type_names
            .get_or_try_init(|| {
                let names = self.header.image().read_optional_string(
                    self.associated_type_names_ptr,
                    self.header.address(),
                    "associated type names",
                )?;
                Ok(names
                    .map(|s| s.split(' ').filter(|n| !n.is_empty()).map(str::to_string).collect())
                    .unwrap_or_default())
            })
            .map(Vec::as_slice)
    }
}

/// A decoded class, struct, enum or protocol descriptor.
#[derive(Debug)]
pub enum Descriptor {
    Class(ClassDescriptor),
    Struct(StructDescriptor),
    Enum(EnumDescriptor),
    Protocol(ProtocolDescriptor),
}

impl Descriptor {
    pub fn decode(image: &Arc<ImageContext>, address: Address) -> Result<Self, MetadataError> {
        let mut probe = image.read_record(address, 4)?;
        let flags = ContextDescriptorFlags::from_bits_retain(probe.u32());
        let kind = flags.kind().ok_or_else(|| {
            MetadataError::malformed(address, format!("unknown kind tag 0x{:02x}", flags.kind_raw()))
        })?;

        match kind {
            ContextDescriptorKind::Class => ClassDescriptor::decode(image, address).map(Self::Class),
            ContextDescriptorKind::Struct => StructDescriptor::decode(image, address).map(Self::Struct),
            ContextDescriptorKind::Enum => EnumDescriptor::decode(image, address).map(Self::Enum),
            ContextDescriptorKind::Protocol => ProtocolDescriptor::decode(image, address).map(Self::Protocol),
            other => Err(MetadataError::malformed(
                address,
                format!("{} descriptor where a type was expected", other),
            )),
        }
    }

    pub fn header(&self) -> &DescriptorHeader {
        match self {
            Self::Class(d) => d.header(),
            Self::Struct(d) => d.header(),
            Self::Enum(d) => d.header(),
            Self::Protocol(d) => d.header(),
        }
    }

    pub fn kind(&self) -> ContextDescriptorKind {
        self.header().kind()
    }

    pub fn address(&self) -> Address {
        self.header().address()
    }

    pub fn name(&self) -> Result<&str, MetadataError> {
        self.header().name()
    }

    pub fn full_name(&self) -> Result<String, MetadataError> {
        self.header().full_name()
    }

    pub fn module_name(&self) -> Result<&str, MetadataError> {
        self.header().module_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ByteImage;
    use crate::metadata::flags::{ProtocolRequirementFlags, ProtocolRequirementKind};
    use crate::metadata::DecodeLimits;
    use crate::utils::testing::{FieldSpec, FieldType, ImageBuilder};

    fn context(image: ByteImage) -> Arc<ImageContext> {
        ImageContext::new(Arc::new(image), DecodeLimits::default())
    }

    #[test]
    fn test_class_round_trip() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let base = b.class(app, "Base", &[]);
        let foo = b.class_with_superclass(
            app,
            "Foo",
            Some(FieldType::Descriptor(base)),
            &[
                FieldSpec::var("count", FieldType::Mangled("Si")),
                FieldSpec::constant("title", FieldType::Mangled("SS")),
            ],
        );
        let ctx = context(b.build());

        let Descriptor::Class(class) = Descriptor::decode(&ctx, foo).unwrap() else {
            panic!("expected a class");
        };
        assert_eq!(class.header().name().unwrap(), "Foo");
        assert_eq!(class.header().full_name().unwrap(), "App.Foo");
        assert_eq!(class.header().module_name().unwrap(), "App");
        assert_eq!(class.num_fields(), 2);
        assert_eq!(class.superclass_name().unwrap(), Some("App.Base"));

        let fields = class.fields().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "count");
        assert!(fields[0].is_var);
        assert_eq!(fields[0].type_name.as_deref(), Some("Swift.Int"));
        assert_eq!(fields[1].name, "title");
        assert!(!fields[1].is_var);
        assert_eq!(fields[1].type_name.as_deref(), Some("Swift.String"));
    }

    #[test]
    fn test_zero_offsets_resolve_to_absent() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let empty = b.class(app, "Empty", &[]);
        let ctx = context(b.build());

        let Descriptor::Class(class) = Descriptor::decode(&ctx, empty).unwrap() else {
            panic!("expected a class");
        };
        assert!(!class.has_superclass());
        assert!(!class.has_access_function());
        assert_eq!(class.superclass_name().unwrap(), None);
        assert!(class.fields().unwrap().is_empty());
    }

    #[test]
    fn test_lazy_fields_are_cached() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let point = b.structure(
            app,
            "Point",
            &[FieldSpec::var("x", FieldType::Mangled("Sd")), FieldSpec::var("y", FieldType::Mangled("Sd"))],
        );
        let ctx = context(b.build());

        let Descriptor::Struct(s) = Descriptor::decode(&ctx, point).unwrap() else {
            panic!("expected a struct");
        };
        let first = s.fields().unwrap();
        let second = s.fields().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first[1].type_name.as_deref(), Some("Swift.Double"));
        assert_eq!(s.num_fields(), 2);
    }

    #[test]
    fn test_nested_and_extension_paths() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let outer = b.class(app, "Outer", &[]);
        let inner = b.structure(outer, "Inner", &[]);
        let foo = b.structure(app, "Foo", &[]);
        let ext = b.extension(app, foo);
        let nested = b.enumeration(ext, "Nested", &[], 0);
        let hidden_scope = b.anonymous(app);
        let hidden = b.structure(hidden_scope, "Hidden", &[]);
        let ctx = context(b.build());

        let inner = Descriptor::decode(&ctx, inner).unwrap();
        assert_eq!(inner.full_name().unwrap(), "App.Outer.Inner");
        assert_eq!(inner.name().unwrap(), "Inner");

        let nested = Descriptor::decode(&ctx, nested).unwrap();
        assert_eq!(nested.kind(), ContextDescriptorKind::Enum);
        assert_eq!(nested.full_name().unwrap(), "App.Foo.Nested");

        let hidden = Descriptor::decode(&ctx, hidden).unwrap();
        assert_eq!(hidden.full_name().unwrap(), "App.Hidden");
        assert_eq!(hidden.module_name().unwrap(), "App");
    }

    #[test]
    fn test_enum_cases() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let state = b.enumeration(
            app,
            "State",
            &[
                FieldSpec::case("loaded", FieldType::Mangled("Si")),
                FieldSpec::case("idle", FieldType::None),
                FieldSpec::case("failed", FieldType::None),
            ],
            1,
        );
        let ctx = context(b.build());

        let Descriptor::Enum(e) = Descriptor::decode(&ctx, state).unwrap() else {
            panic!("expected an enum");
        };
        assert_eq!(e.num_payload_cases(), 1);
        assert_eq!(e.num_empty_cases(), 2);
        assert_eq!(e.num_cases(), 3);

        let cases = e.cases().unwrap();
        assert_eq!(cases[0].name, "loaded");
        assert_eq!(cases[0].payload_type.as_deref(), Some("Swift.Int"));
        assert_eq!(cases[1].name, "idle");
        assert_eq!(cases[1].payload_type, None);
    }

    #[test]
    fn test_protocol_requirements() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let method = ProtocolRequirementFlags::from_bits_retain(1) | ProtocolRequirementFlags::IS_INSTANCE;
        let getter = ProtocolRequirementFlags::from_bits_retain(3);
        let proto = b.protocol_with(app, "Store", 1, &[(method, true), (getter, false)], &["Element", "Index"]);
        let ctx = context(b.build());

        let Descriptor::Protocol(p) = Descriptor::decode(&ctx, proto).unwrap() else {
            panic!("expected a protocol");
        };
        assert_eq!(p.header().full_name().unwrap(), "App.Store");
        assert_eq!(p.num_requirements_in_signature(), 1);

        let requirements = p.requirements().unwrap();
        assert_eq!(requirements.len(), 2);
        assert_eq!(requirements[0].kind, ProtocolRequirementKind::Method);
        assert!(requirements[0].is_instance);
        assert!(requirements[0].has_default_implementation);
        assert_eq!(requirements[1].kind, ProtocolRequirementKind::Getter);
        assert!(!requirements[1].has_default_implementation);

        assert_eq!(p.associated_type_names().unwrap(), ["Element", "Index"]);
    }

    #[test]
    fn test_unknown_kind_is_malformed() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let bad = b.raw_descriptor(0x1f | 0x40, Some(app), "Bad");
        let ctx = context(b.build());

        let err = Descriptor::decode(&ctx, bad).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_non_type_kind_is_malformed() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let ctx = context(b.build());

        assert!(Descriptor::decode(&ctx, app).unwrap_err().is_malformed());
    }

    #[test]
    fn test_orphan_chain_is_malformed() {
        let mut b = ImageBuilder::new("App");
        let orphan = b.raw_descriptor(ContextDescriptorKind::Struct.raw() as u32, None, "Orphan");
        let ctx = context(b.build());

        let orphan = Descriptor::decode(&ctx, orphan).unwrap();
        assert_eq!(orphan.name().unwrap(), "Orphan");
        assert!(orphan.full_name().unwrap_err().is_malformed());
    }

    #[test]
    fn test_deep_chain_is_bounded() {
        let mut b = ImageBuilder::new("App");
        let mut parent = b.module("App");
        for _ in 0..40 {
            parent = b.anonymous(parent);
        }
        let deep = b.structure(parent, "Deep", &[]);
        let ctx = context(b.build());

        let deep = Descriptor::decode(&ctx, deep).unwrap();
        assert!(deep.full_name().unwrap_err().is_malformed());
    }

    #[test]
    fn test_truncated_descriptor() {
        let mut data = vec![0u8; 16];
        data.extend_from_slice(&(ContextDescriptorKind::Class.raw() as u32).to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        let ctx = context(ByteImage::new("Short", Address::new(0x1000), data));

        let err = Descriptor::decode(&ctx, Address::new(0x1010)).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_over_limit_count_is_malformed() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let proto = b.protocol_with(app, "Wide", 0, &[(ProtocolRequirementFlags::empty(), false); 3], &[]);
        let image = Arc::new(b.build());
        let limits = DecodeLimits {
            max_trailing_records: 2,
            ..DecodeLimits::default()
        };
        let ctx = ImageContext::new(image, limits);

        assert!(Descriptor::decode(&ctx, proto).unwrap_err().is_malformed());
    }
}
