// Sun Oct 18 2026 - Alex

use crate::host::LoadedModule;
use crate::memory::{Address, Entries, MemoryError, MemoryRange};
use crate::metadata::{MetadataError, RelativePointer};
use log::debug;
use serde::Serialize;

pub const MACHO_TYPES_SECTION: &str = "__swift5_types";
pub const MACHO_PROTOCOLS_SECTION: &str = "__swift5_protos";
pub const MACHO_CONFORMANCES_SECTION: &str = "__swift5_proto";

pub const ELF_TYPES_SECTION: &str = "swift5_type_metadata";
pub const ELF_PROTOCOLS_SECTION: &str = "swift5_protocols";
pub const ELF_CONFORMANCES_SECTION: &str = "swift5_protocol_conformances";

pub const SECTION_ENTRY_SIZE: u64 = 4;

const TYPE_REFERENCE_MASK: i32 = 0x3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    Types,
    Protocols,
    Conformances,
}

impl SectionKind {
    pub fn names(&self) -> [&'static str; 2] {
        match self {
            Self::Types => [MACHO_TYPES_SECTION, ELF_TYPES_SECTION],
            Self::Protocols => [MACHO_PROTOCOLS_SECTION, ELF_PROTOCOLS_SECTION],
            Self::Conformances => [MACHO_CONFORMANCES_SECTION, ELF_CONFORMANCES_SECTION],
        }
    }

    fn matches(&self, sectname: &str) -> bool {
        self.names().contains(&sectname)
    }
}

/// Ranges of the Swift metadata sections of one module. A missing section
/// is simply `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataSections {
    pub types: Option<MemoryRange>,
    pub protocols: Option<MemoryRange>,
    pub conformances: Option<MemoryRange>,
}

impl MetadataSections {
    pub fn is_empty(&self) -> bool {
        self.types.is_none() && self.protocols.is_none() && self.conformances.is_none()
    }

    pub fn range(&self, kind: SectionKind) -> Option<MemoryRange> {
        match kind {
            SectionKind::Types => self.types,
            SectionKind::Protocols => self.protocols,
            SectionKind::Conformances => self.conformances,
        }
    }
}

pub fn locate_sections(module: &dyn LoadedModule) -> Result<MetadataSections, MetadataError> {
    let sections = module
        .sections()
        .map_err(|e| MetadataError::unreadable(module.name(), e))?;

    let mut located = MetadataSections::default();
    for section in &sections {
        let slot = if SectionKind::Types.matches(&section.sectname) {
            &mut located.types
        } else if SectionKind::Protocols.matches(&section.sectname) {
            &mut located.protocols
        } else if SectionKind::Conformances.matches(&section.sectname) {
            &mut located.conformances
        } else {
            continue;
        };

        let range = section.range();
        if range.size() % SECTION_ENTRY_SIZE != 0 {
            debug!(
                "{}: section {} size {} is not a multiple of {}, ignoring the tail",
                module.name(),
                section.sectname,
                range.size(),
                SECTION_ENTRY_SIZE
            );
        }
        slot.get_or_insert(range);
    }

    Ok(located)
}

/// Iterates the 4-byte entries of one metadata section, yielding the address
/// each entry refers to. Null entries are skipped.
pub struct SectionRecords<'a> {
    module: &'a dyn LoadedModule,
    kind: SectionKind,
    fields: Entries,
}

impl<'a> SectionRecords<'a> {
    pub fn new(module: &'a dyn LoadedModule, kind: SectionKind, range: Option<MemoryRange>) -> Self {
        let range = range.unwrap_or_else(|| MemoryRange::new(Address::zero(), Address::zero()));
        Self {
            module,
            kind,
            fields: range.entries(SECTION_ENTRY_SIZE),
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    fn resolve(&self, entry: RelativePointer) -> Result<Option<Address>, MetadataError> {
        let field = entry.field();
        let unreadable = |e: MemoryError| MetadataError::malformed(field, format!("unreadable section entry: {}", e));
        match self.kind {
            SectionKind::Types => match entry.tag(TYPE_REFERENCE_MASK) {
                0 => Ok(entry.target()),
                1 => entry
                    .untagged(TYPE_REFERENCE_MASK)
                    .resolve_through_slot(self.module)
                    .map_err(unreadable),
                tag => Err(MetadataError::malformed(
                    field,
                    format!("unsupported type reference kind {}", tag),
                )),
            },
            SectionKind::Protocols => entry.resolve_indirectable(self.module).map_err(unreadable),
            SectionKind::Conformances => Ok(entry.target()),
        }
    }
}

impl Iterator for SectionRecords<'_> {
    type Item = Result<Address, MetadataError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(field) = self.fields.next() {
            let entry = match RelativePointer::read(self.module.reader(), field) {
                Ok(entry) => entry,
                Err(e) => return Some(Err(MetadataError::Memory(e))),
            };
            match self.resolve(entry) {
                Ok(Some(address)) => return Some(Ok(address)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{BinarySection, ByteImage};

    fn entries(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_locate_macho_and_elf_names() {
        let image = ByteImage::new("Mixed", Address::new(0x1000), vec![0; 64]).with_sections(vec![
            BinarySection::new("__TEXT", MACHO_TYPES_SECTION, Address::new(0x1000), 8),
            BinarySection::new("", ELF_PROTOCOLS_SECTION, Address::new(0x1010), 4),
            BinarySection::new("__TEXT", "__text", Address::new(0x1020), 16),
        ]);
        let sections = locate_sections(&image).unwrap();
        assert_eq!(sections.types.unwrap().size(), 8);
        assert_eq!(sections.protocols.unwrap().start(), Address::new(0x1010));
        assert!(sections.conformances.is_none());
        assert!(!sections.is_empty());
    }

    #[test]
    fn test_no_sections_is_empty() {
        let image = ByteImage::new("Plain", Address::new(0x1000), vec![0; 16]);
        let sections = locate_sections(&image).unwrap();
        assert!(sections.is_empty());
        assert_eq!(SectionRecords::new(&image, SectionKind::Types, sections.types).count(), 0);
    }

    #[test]
    fn test_corrupt_header_is_unreadable() {
        let image = ByteImage::new("Broken", Address::new(0x1000), vec![0; 16]).with_corrupt_header();
        let err = locate_sections(&image).unwrap_err();
        assert!(err.is_unreadable());
    }

    #[test]
    fn test_entries_resolve_and_skip_null() {
        // entry 0 -> 0x1010, entry 1 null, entry 2 -> 0x1010, tail of 2 bytes ignored
        let mut data = entries(&[0x10, 0, 0x8]);
        data.extend_from_slice(&[0xff, 0xff]);
        data.resize(0x20, 0);
        let image = ByteImage::new("Types", Address::new(0x1000), data);
        let range = MemoryRange::from_start_size(Address::new(0x1000), 14);

        let found: Vec<_> = SectionRecords::new(&image, SectionKind::Types, Some(range))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(found, vec![Address::new(0x1010), Address::new(0x1010)]);
    }

    #[test]
    fn test_unsupported_type_reference_kind() {
        let mut data = entries(&[0x12]);
        data.resize(0x20, 0);
        let image = ByteImage::new("Types", Address::new(0x1000), data);
        let range = MemoryRange::from_start_size(Address::new(0x1000), 4);

        let mut records = SectionRecords::new(&image, SectionKind::Types, Some(range));
        assert!(records.next().unwrap().unwrap_err().is_malformed());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_indirect_protocol_entry() {
        // entry at 0x1000 points (indirectly) at slot 0x1008 holding 0x1010
        let mut data = entries(&[0x8 | 1, 0]);
        data.extend_from_slice(&0x1010u64.to_le_bytes());
        data.resize(0x20, 0);
        let image = ByteImage::new("Protos", Address::new(0x1000), data);
        let range = MemoryRange::from_start_size(Address::new(0x1000), 4);

        let found: Vec<_> = SectionRecords::new(&image, SectionKind::Protocols, Some(range))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(found, vec![Address::new(0x1010)]);
    }
}
