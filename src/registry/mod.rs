// Sun Oct 18 2026 - Alex

pub mod module;
pub mod report;
pub mod scan;

pub use module::{ModuleSummary, NameIndex, SwiftModule};
pub use report::{BuildReport, SkippedModule};
pub use scan::ModuleScan;

use crate::host::{self, LoadedModule, ModuleHost};
use crate::memory::Address;
use crate::metadata::{DecodeLimits, Descriptor, ExportTable, ImageContext, MetadataError, ProtocolDescriptor};
use crate::runtime::RuntimeError;
use crate::types::{Class, Conformance, Enum, Protocol, Struct, Type};
use crate::utils::logging::ScopedTimer;
use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use std::sync::Arc;

static SHARED: OnceCell<Registry> = OnceCell::new();

/// Every Swift type found in a set of loaded modules, indexed by module and
/// by name. A registry is a snapshot: it never rescans, so a changed module
/// set needs a fresh `build`.
#[derive(Debug, Default)]
pub struct Registry {
    modules: IndexMap<String, SwiftModule>,
    classes: NameIndex<Class>,
    structs: NameIndex<Struct>,
    enums: NameIndex<Enum>,
    protocols: NameIndex<Protocol>,
    types: Vec<Type>,
    report: BuildReport,
}

impl Registry {
    /// The process-wide registry, built from the installed host on first
    /// use. A failed build is not remembered, so a later call retries.
    pub fn shared() -> Result<&'static Self, RuntimeError> {
        Self::shared_with(DecodeLimits::default())
    }

    /// Like `shared`; `limits` only matter for the call that builds.
    pub fn shared_with(limits: DecodeLimits) -> Result<&'static Self, RuntimeError> {
        SHARED.get_or_try_init(|| {
            let host = host::current()?;
            Self::build_with(host.as_ref(), limits)
        })
    }

    pub fn build(host: &dyn ModuleHost) -> Result<Self, RuntimeError> {
        Self::build_with(host, DecodeLimits::default())
    }

    pub fn build_with(host: &dyn ModuleHost, limits: DecodeLimits) -> Result<Self, RuntimeError> {
        let modules = host.current_modules()?;
        Ok(Self::from_modules(&modules, limits))
    }

    /// Builds from an explicit module list, in list order. Unreadable
    /// modules and bad descriptors are left out and recorded in `report`.
    /// References bound to symbols of another listed module are followed.
    pub fn from_modules(modules: &[Arc<dyn LoadedModule>], limits: DecodeLimits) -> Self {
        let _timer = ScopedTimer::new("registry build");
        let mut builder = Builder::default();
        let exports = Arc::new(ExportTable::from_modules(modules));

        let scans: Vec<ModuleScan> = modules
            .iter()
            .filter_map(|module| builder.scan(module, limits, &exports))
            .collect();

        for scan in &scans {
            builder.add_protocols(scan);
        }
        for scan in &scans {
            builder.group_conformances(scan);
        }
        for scan in &scans {
            builder.add_types(scan);
        }

        let registry = builder.finish();
        info!(
            "Registry built: {} types in {} modules ({})",
            registry.types.len(),
            registry.modules.len(),
            registry.report
        );
        registry
    }

    pub fn modules(&self) -> &IndexMap<String, SwiftModule> {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&SwiftModule> {
        self.modules.get(name)
    }

    pub fn classes(&self) -> &NameIndex<Class> {
        &self.classes
    }

    pub fn structs(&self) -> &NameIndex<Struct> {
        &self.structs
    }

    pub fn enums(&self) -> &NameIndex<Enum> {
        &self.enums
    }

    pub fn protocols(&self) -> &NameIndex<Protocol> {
        &self.protocols
    }

    pub fn class(&self, name: &str) -> Option<&Arc<Class>> {
        self.classes.get(name)
    }

    pub fn structure(&self, name: &str) -> Option<&Arc<Struct>> {
        self.structs.get(name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Arc<Enum>> {
        self.enums.get(name)
    }

    pub fn protocol(&self, name: &str) -> Option<&Arc<Protocol>> {
        self.protocols.get(name)
    }

    /// All wrappers: protocols first, then the other types, each in module
    /// and section order.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    fn register(&mut self, ty: Type) {
        let module = self
            .modules
            .entry(ty.module_name().to_string())
            .or_insert_with(|| SwiftModule::new(ty.module_name()));
        match &ty {
            Type::Class(class) => {
                module.add_class(Arc::clone(class));
                self.classes.insert(class.path(), Arc::clone(class));
            }
            Type::Struct(structure) => {
                module.add_struct(Arc::clone(structure));
                self.structs.insert(structure.path(), Arc::clone(structure));
            }
            Type::Enum(enumeration) => {
                module.add_enum(Arc::clone(enumeration));
                self.enums.insert(enumeration.path(), Arc::clone(enumeration));
            }
            Type::Protocol(protocol) => {
                module.add_protocol(Arc::clone(protocol));
                self.protocols.insert(protocol.path(), Arc::clone(protocol));
            }
        }
        self.types.push(ty);
    }
}

#[derive(Default)]
struct Builder {
    registry: Registry,
    protocols: AHashMap<Address, Arc<Protocol>>,
    conformances: AHashMap<Address, Vec<Conformance>>,
    seen_types: AHashSet<Address>,
}

impl Builder {
    fn scan(
        &mut self,
        module: &Arc<dyn LoadedModule>,
        limits: DecodeLimits,
        exports: &Arc<ExportTable>,
    ) -> Option<ModuleScan> {
        let report = &mut self.registry.report;
        report.modules_scanned += 1;
        match ModuleScan::scan(Arc::clone(module), limits, exports) {
            Ok(scan) => {
                report.malformed_descriptors += scan.malformed;
                Some(scan)
            }
            Err(e) => {
                warn!("Skipping module {}: {}", module.name(), e);
                report.skip_module(module.name(), e);
                None
            }
        }
    }

    fn add_protocols(&mut self, scan: &ModuleScan) {
        for &address in &scan.protocols {
            if self.protocols.contains_key(&address) {
                continue;
            }
            match decode_protocol(&scan.image, address) {
                Ok(protocol) => {
                    let protocol = Arc::new(protocol);
                    self.protocols.insert(address, Arc::clone(&protocol));
                    self.registry.register(Type::Protocol(protocol));
                }
                Err(e) => self.malformed(scan, e),
            }
        }
    }

    /// Files each conformance record under the descriptor of its type. Each
    /// protocol is attached at most once per type.
    fn group_conformances(&mut self, scan: &ModuleScan) {
        for record in &scan.conformances {
            let (Some(target), Some(protocol_address)) = (record.type_descriptor(), record.protocol) else {
                self.unresolved(scan, record.unresolved());
                continue;
            };

            let protocol = match self.protocol(scan, protocol_address) {
                Ok(protocol) => protocol,
                Err(e) => {
                    self.unresolved(scan, e);
                    continue;
                }
            };

            let attached = self.conformances.entry(target).or_default();
            if attached.iter().any(|c| c.protocol().address() == protocol_address) {
                debug!(
                    "{}: duplicate conformance of {} to {}",
                    scan.module_name(),
                    target,
                    protocol.full_name()
                );
                self.registry.report.duplicate_conformances += 1;
                continue;
            }
            attached.push(Conformance::new(protocol, record, scan.module_name()));
        }
    }

    /// Protocols outside every scanned protocols section are decoded through
    /// the image holding the conformance, and cached but not registered.
    fn protocol(&mut self, scan: &ModuleScan, address: Address) -> Result<Arc<Protocol>, MetadataError> {
        if let Some(protocol) = self.protocols.get(&address) {
            return Ok(Arc::clone(protocol));
        }
        let protocol = Arc::new(decode_protocol(&scan.image, address)?);
        self.protocols.insert(address, Arc::clone(&protocol));
        Ok(protocol)
    }

    fn add_types(&mut self, scan: &ModuleScan) {
        for &address in &scan.types {
            if !self.seen_types.insert(address) {
                continue;
            }
            let conformances = self.conformances.remove(&address).unwrap_or_default();
            let dropped = conformances.len();
            match build_type(&scan.image, address, conformances) {
                Ok(ty) => self.registry.register(ty),
                Err(e) => {
                    self.malformed(scan, e);
                    self.registry.report.unresolved_conformances += dropped;
                }
            }
        }
    }

    fn malformed(&mut self, scan: &ModuleScan, error: MetadataError) {
        warn!("{}: skipping descriptor: {}", scan.module_name(), error);
        self.registry.report.malformed_descriptors += 1;
    }

    fn unresolved(&mut self, scan: &ModuleScan, error: MetadataError) {
        debug!("{}: dropping conformance: {}", scan.module_name(), error);
        self.registry.report.unresolved_conformances += 1;
    }

    fn finish(mut self) -> Registry {
        let leftover: usize = self.conformances.values().map(Vec::len).sum();
        if leftover > 0 {
            debug!("Dropping {} conformances of types outside the scanned modules", leftover);
        }
        self.registry.report.unresolved_conformances += leftover;
        self.registry
    }
}

fn decode_protocol(image: &Arc<ImageContext>, address: Address) -> Result<Protocol, MetadataError> {
    Protocol::new(ProtocolDescriptor::decode(image, address)?)
}

fn build_type(image: &Arc<ImageContext>, address: Address, conformances: Vec<Conformance>) -> Result<Type, MetadataError> {
    let ty = match Descriptor::decode(image, address)? {
        Descriptor::Class(d) => Type::Class(Arc::new(Class::new(d, conformances)?)),
        Descriptor::Struct(d) => Type::Struct(Arc::new(Struct::new(d, conformances)?)),
        Descriptor::Enum(d) => Type::Enum(Arc::new(Enum::new(d, conformances)?)),
        Descriptor::Protocol(_) => {
            return Err(MetadataError::malformed(address, "protocol descriptor listed as a type"));
        }
    };
    Ok(ty)
}
