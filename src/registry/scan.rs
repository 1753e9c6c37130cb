// Sun Oct 18 2026 - Alex

use crate::host::LoadedModule;
use crate::memory::Address;
use crate::metadata::sections::SectionKind;
use crate::metadata::{
    locate_sections, ConformanceRecord, Conformances, DecodeLimits, ExportTable, ImageContext,
    MetadataError, MetadataSections, SectionRecords,
};
use log::{debug, warn};
use std::sync::Arc;

/// Everything read from one module's metadata sections, before any
/// descriptor is decoded beyond its address.
pub struct ModuleScan {
    pub image: Arc<ImageContext>,
    pub sections: MetadataSections,
    pub protocols: Vec<Address>,
    pub types: Vec<Address>,
    pub conformances: Vec<ConformanceRecord>,
    pub malformed: usize,
}

impl ModuleScan {
    /// Reads the section tables of `module`. Fails with `ModuleUnreadable`
    /// when the sections cannot be listed or the image goes away; a bad
    /// individual entry is only counted. Slots bound to other images are
    /// followed through `exports`.
    pub fn scan(
        module: Arc<dyn LoadedModule>,
        limits: DecodeLimits,
        exports: &Arc<ExportTable>,
    ) -> Result<Self, MetadataError> {
        let sections = locate_sections(module.as_ref())?;
        if sections.is_empty() {
            debug!("{}: no Swift metadata sections", module.name());
        }
        let image = ImageContext::with_exports(module, limits, Arc::clone(exports));

        let mut scan = Self {
            image,
            sections,
            protocols: Vec::new(),
            types: Vec::new(),
            conformances: Vec::new(),
            malformed: 0,
        };
        scan.protocols = scan.addresses(SectionKind::Protocols)?;
        scan.types = scan.addresses(SectionKind::Types)?;
        scan.conformances = scan.conformance_records()?;
        Ok(scan)
    }

    pub fn module_name(&self) -> &str {
        self.image.module_name()
    }

    fn addresses(&mut self, kind: SectionKind) -> Result<Vec<Address>, MetadataError> {
        let module = Arc::clone(self.image.module());
        let records = SectionRecords::new(module.as_ref(), kind, self.sections.range(kind));
        let mut addresses = Vec::new();
        for entry in records {
            match entry {
                Ok(address) => addresses.push(address),
                Err(e) => self.contain(e)?,
            }
        }
        Ok(addresses)
    }

    fn conformance_records(&mut self) -> Result<Vec<ConformanceRecord>, MetadataError> {
        let conformances = Conformances::new(Arc::clone(&self.image), self.sections.conformances);
        let mut records = Vec::new();
        for record in &conformances {
            match record {
                Ok(record) => records.push(record),
                Err(e) => self.contain(e)?,
            }
        }
        Ok(records)
    }

    /// Counts a per-entry failure, or escalates it when the image itself
    /// became unreadable.
    fn contain(&mut self, error: MetadataError) -> Result<(), MetadataError> {
        match error {
            MetadataError::Memory(e) if e.is_unmapped() => Err(MetadataError::unreadable(self.module_name(), e)),
            e => {
                warn!("{}: skipping section entry: {}", self.module_name(), e);
                self.malformed += 1;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::ImageBuilder;

    fn no_exports() -> Arc<ExportTable> {
        Arc::new(ExportTable::new())
    }

    #[test]
    fn test_scan_collects_section_entries() {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let proto = b.protocol(app, "P");
        let foo = b.class(app, "Foo", &[]);
        let bar = b.structure(app, "Bar", &[]);
        b.conformance(proto, foo);
        let scan = ModuleScan::scan(Arc::new(b.build()), DecodeLimits::default(), &no_exports()).unwrap();

        assert_eq!(scan.module_name(), "App");
        assert_eq!(scan.protocols, vec![proto]);
        assert_eq!(scan.types, vec![foo, bar]);
        assert_eq!(scan.conformances.len(), 1);
        assert_eq!(scan.conformances[0].type_descriptor(), Some(foo));
        assert_eq!(scan.malformed, 0);
    }

    #[test]
    fn test_unreadable_module() {
        let b = ImageBuilder::new("Broken").corrupt_header();
        let err = ModuleScan::scan(Arc::new(b.build()), DecodeLimits::default(), &no_exports()).err().unwrap();
        assert!(err.is_unreadable());

        let mut b = ImageBuilder::new("Gone");
        let app = b.module("App");
        b.class(app, "Foo", &[]);
        let image = Arc::new(b.build());
        image.unmap();
        let err = ModuleScan::scan(image, DecodeLimits::default(), &no_exports()).err().unwrap();
        assert!(err.is_unreadable());
    }
}
