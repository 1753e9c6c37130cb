// Sun Oct 18 2026 - Alex

use crate::host::LoadedModule;
use crate::symbol::{Demangler, SymbolError, SymbolRecord};
use log::{debug, trace};
use once_cell::sync::OnceCell;
use regex::Regex;

pub const DEFAULT_MANGLED_PREFIXES: [&str; 4] = ["$s", "$S", "$e", "_T0"];

static SWIFT_FILTER: OnceCell<SymbolFilter> = OnceCell::new();

/// Matches symbol names carrying one of the Swift mangling prefixes,
/// optionally preceded by the Mach-O underscore.
#[derive(Debug, Clone)]
pub struct SymbolFilter {
    prefixes: Vec<String>,
    pattern: Regex,
}

impl SymbolFilter {
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> Result<Self, SymbolError> {
        let alternatives: Vec<String> = prefixes.iter().map(|p| regex::escape(p.as_ref())).collect();
        let pattern = Regex::new(&format!("^_?(?:{})", alternatives.join("|")))?;
        Ok(Self {
            prefixes: prefixes.iter().map(|p| p.as_ref().to_string()).collect(),
            pattern,
        })
    }

    pub fn swift() -> Result<&'static SymbolFilter, SymbolError> {
        SWIFT_FILTER.get_or_try_init(|| Self::new(&DEFAULT_MANGLED_PREFIXES))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn matches(&self, name: &str) -> bool {
        !self.prefixes.is_empty() && self.pattern.is_match(name)
    }
}

pub fn enumerate_demangled_symbols(
    module: &dyn LoadedModule,
    demangler: &dyn Demangler,
) -> Result<Vec<SymbolRecord>, SymbolError> {
    enumerate_with_filter(module, demangler, SymbolFilter::swift()?)
}

pub fn enumerate_with_filter(
    module: &dyn LoadedModule,
    demangler: &dyn Demangler,
    filter: &SymbolFilter,
) -> Result<Vec<SymbolRecord>, SymbolError> {
    let symbols = module.exported_symbols().map_err(|e| SymbolError::ModuleUnreadable {
        module: module.name().to_string(),
        reason: e.to_string(),
    })?;

    let total = symbols.len();
    let mut records = Vec::new();
    for symbol in symbols {
        if !filter.matches(&symbol.name) {
            continue;
        }
        match demangler.demangle(symbol.name.as_bytes()) {
            Some(demangled) => records.push(SymbolRecord::new(symbol.address, symbol.name, demangled)),
            None => trace!("{}", SymbolError::DemangleRejected(symbol.name)),
        }
    }

    debug!(
        "{}: {} of {} exported symbols demangled",
        module.name(),
        records.len(),
        total
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Address;
    use crate::symbol::SwiftDemangler;
    use crate::utils::testing::ImageBuilder;

    struct Shouting;

    impl Demangler for Shouting {
        fn demangle(&self, mangled: &[u8]) -> Option<String> {
            Some(String::from_utf8_lossy(mangled).to_uppercase())
        }
    }

    fn image_with_symbols() -> crate::memory::ByteImage {
        let mut b = ImageBuilder::new("App");
        b.symbol("$s3App3FooCMn", Address::new(0x1000))
            .symbol("_$s3App3BarVN", Address::new(0x1010))
            .symbol("_main", Address::new(0x1020))
            .symbol("$s4main03fooB0yyF", Address::new(0x1030))
            .symbol("$s4main3fooyyF", Address::new(0x1040));
        b.build()
    }

    #[test]
    fn test_filters_and_demangles() {
        let image = image_with_symbols();
        let records = enumerate_demangled_symbols(&image, &SwiftDemangler).unwrap();

        let names: Vec<_> = records.iter().map(|r| r.demangled.as_str()).collect();
        assert_eq!(
            names,
            [
                "nominal type descriptor for App.Foo",
                "type metadata for App.Bar",
                "main.foo() -> ()",
            ]
        );
        assert_eq!(records[0].mangled_name, "$s3App3FooCMn");
        assert_eq!(records[1].address, Address::new(0x1010));
    }

    #[test]
    fn test_keeps_protocol_metadata_symbols() {
        let mut b = ImageBuilder::new("App");
        b.symbol("$s7SwiftUI4ViewMp", Address::new(0x2000))
            .symbol("$s3App3FooVAA1PAAMc", Address::new(0x2010))
            .symbol("$s3App3FooCMn", Address::new(0x2020));
        let image = b.build();

        let records = enumerate_demangled_symbols(&image, &SwiftDemangler).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.demangled.as_str()).collect();
        assert_eq!(
            names,
            [
                "protocol descriptor for SwiftUI.View",
                "protocol conformance descriptor for App.Foo : App.P in App",
                "nominal type descriptor for App.Foo",
            ]
        );
    }

    #[test]
    fn test_demangler_is_a_black_box() {
        let image = image_with_symbols();
        let records = enumerate_demangled_symbols(&image, &Shouting).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].demangled, "$S3APP3FOOCMN");
        assert!(records.iter().all(|r| r.mangled_name != "_main"));
    }

    #[test]
    fn test_custom_prefixes() {
        let image = image_with_symbols();
        let filter = SymbolFilter::new(&["$s"]).unwrap();
        assert!(filter.matches("_$s3App3BarVN"));
        assert!(!filter.matches("_T03App3FooCMn"));

        let none = SymbolFilter::new::<&str>(&[]).unwrap();
        assert!(enumerate_with_filter(&image, &SwiftDemangler, &none).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_module() {
        let image = ImageBuilder::new("Broken").corrupt_header().build();
        let err = enumerate_demangled_symbols(&image, &SwiftDemangler).unwrap_err();
        assert!(matches!(err, SymbolError::ModuleUnreadable { .. }));
    }
}
