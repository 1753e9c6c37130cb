// Sun Oct 18 2026 - Alex

use crate::memory::{Address, MemoryRange};
use crate::metadata::flags::TypeReferenceKind;
use crate::metadata::sections::{SectionKind, SectionRecords};
use crate::metadata::{ConformanceFlags, ImageContext, MetadataError};
use std::fmt;
use std::sync::Arc;

pub const CONFORMANCE_DESCRIPTOR_SIZE: usize = 16;

/// What a conformance record says the conforming type is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeReference {
    Descriptor(Address),
    ObjCClassName(String),
    ObjCClass(Option<Address>),
    Unresolved,
}

impl TypeReference {
    pub fn descriptor(&self) -> Option<Address> {
        match self {
            Self::Descriptor(address) => Some(*address),
            _ => None,
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descriptor(address) => write!(f, "descriptor {}", address),
            Self::ObjCClassName(name) => write!(f, "objc class {}", name),
            Self::ObjCClass(Some(address)) => write!(f, "objc class object {}", address),
            Self::ObjCClass(None) => f.write_str("unbound objc class object"),
            Self::Unresolved => f.write_str("unresolved reference"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceRecord {
    pub address: Address,
    pub protocol: Option<Address>,
    pub type_ref: TypeReference,
    pub flags: ConformanceFlags,
}

impl ConformanceRecord {
    pub fn read(ctx: &ImageContext, address: Address) -> Result<Self, MetadataError> {
        let mut record = ctx.read_record(address, CONFORMANCE_DESCRIPTOR_SIZE)?;
        let protocol = record.relative();
        let type_ref = record.relative();
        let _witness_table_pattern = record.relative();
        let flags = ConformanceFlags::from_bits_retain(record.u32());

        let protocol = ctx.resolve_indirectable(protocol, address)?;

        let type_ref = match flags.type_reference_kind() {
            Some(TypeReferenceKind::DirectTypeDescriptor) => {
                type_ref.target().map_or(TypeReference::Unresolved, TypeReference::Descriptor)
            }
            Some(TypeReferenceKind::IndirectTypeDescriptor) => match type_ref.target().map(|slot| ctx.resolve_slot(slot)) {
                Some(Ok(Some(target))) => TypeReference::Descriptor(target),
                _ => TypeReference::Unresolved,
            },
            Some(TypeReferenceKind::DirectObjCClassName) => ctx
                .read_optional_string(type_ref, address, "objc class name")?
                .map_or(TypeReference::Unresolved, TypeReference::ObjCClassName),
            Some(TypeReferenceKind::IndirectObjCClass) => {
                TypeReference::ObjCClass(type_ref.target().and_then(|slot| ctx.resolve_slot(slot).ok().flatten()))
            }
            None => TypeReference::Unresolved,
        };

        Ok(Self {
            address,
            protocol,
            type_ref,
            flags,
        })
    }

    pub fn type_descriptor(&self) -> Option<Address> {
        self.type_ref.descriptor()
    }

    pub fn is_retroactive(&self) -> bool {
        self.flags.contains(ConformanceFlags::IS_RETROACTIVE)
    }

    pub fn unresolved(&self) -> MetadataError {
        MetadataError::UnresolvedConformanceTarget {
            record: self.address,
            target: self.type_ref.to_string(),
        }
    }
}

/// The conformance records of one image. Every call to `iter` walks the
/// section again from the start.
pub struct Conformances {
    image: Arc<ImageContext>,
    range: Option<MemoryRange>,
}

impl Conformances {
    pub fn new(image: Arc<ImageContext>, range: Option<MemoryRange>) -> Self {
        Self { image, range }
    }

    pub fn image(&self) -> &Arc<ImageContext> {
        &self.image
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<ConformanceRecord, MetadataError>> + '_ {
        SectionRecords::new(self.image.module().as_ref(), SectionKind::Conformances, self.range)
            .map(move |entry| entry.and_then(|address| ConformanceRecord::read(&self.image, address)))
    }
}

impl<'a> IntoIterator for &'a Conformances {
    type Item = Result<ConformanceRecord, MetadataError>;
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{locate_sections, DecodeLimits};
    use crate::utils::testing::ImageBuilder;

    #[test]
    fn test_records_resolve_each_reference_kind() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let proto = b.protocol(app, "P");
        let foo = b.class(app, "Foo", &[]);
        let bar = b.structure(app, "Bar", &[]);
        let direct = b.conformance(proto, foo);
        b.indirect_conformance(proto, bar);
        b.objc_conformance(proto, "NSObject");
        let image = Arc::new(b.build());
        let sections = locate_sections(image.as_ref()).unwrap();
        let ctx = ImageContext::new(image, DecodeLimits::default());

        let conformances = Conformances::new(ctx, sections.conformances);
        let records: Vec<_> = conformances.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].address, direct);
        assert_eq!(records[0].protocol, Some(proto));
        assert_eq!(records[0].type_descriptor(), Some(foo));
        assert_eq!(records[1].type_descriptor(), Some(bar));
        assert_eq!(records[2].type_ref, TypeReference::ObjCClassName("NSObject".to_string()));
        assert_eq!(records[2].type_descriptor(), None);
        assert!(matches!(
            records[2].unresolved(),
            MetadataError::UnresolvedConformanceTarget { .. }
        ));
    }

    #[test]
    fn test_iteration_restarts() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let proto = b.protocol(app, "P");
        let foo = b.class(app, "Foo", &[]);
        b.conformance(proto, foo);
        let image = Arc::new(b.build());
        let sections = locate_sections(image.as_ref()).unwrap();
        let conformances = Conformances::new(ImageContext::new(image, DecodeLimits::default()), sections.conformances);

        let first: Vec<_> = conformances.iter().filter_map(Result::ok).collect();
        let second: Vec<_> = (&conformances).into_iter().filter_map(Result::ok).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_missing_section_yields_nothing() {
        let b = ImageBuilder::new("Empty");
        let ctx = ImageContext::new(Arc::new(b.build()), DecodeLimits::default());
        assert_eq!(Conformances::new(ctx, None).iter().count(), 0);
    }
}
