// Sun Oct 18 2026 - Alex

use crate::metadata::ContextPath;
use crate::types::{Class, Enum, Protocol, Struct};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// Two independent lookups over the same wrappers: one by short name, one by
/// fully-qualified name. Inserting under an existing key replaces it.
#[derive(Debug)]
pub struct NameIndex<T> {
    by_name: IndexMap<String, Arc<T>>,
    by_qualified_name: IndexMap<String, Arc<T>>,
}

impl<T> Default for NameIndex<T> {
    fn default() -> Self {
        Self {
            by_name: IndexMap::new(),
            by_qualified_name: IndexMap::new(),
        }
    }
}

impl<T> NameIndex<T> {
    pub fn insert(&mut self, path: &ContextPath, value: Arc<T>) {
        self.by_name.insert(path.name().to_string(), Arc::clone(&value));
        self.by_qualified_name.insert(path.qualified(), value);
    }

    /// Looks `key` up as a qualified name first, then as a short name.
    pub fn get(&self, key: &str) -> Option<&Arc<T>> {
        self.by_qualified_name.get(key).or_else(|| self.by_name.get(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn by_name(&self) -> &IndexMap<String, Arc<T>> {
        &self.by_name
    }

    pub fn by_qualified_name(&self) -> &IndexMap<String, Arc<T>> {
        &self.by_qualified_name
    }

    /// Number of distinct qualified names.
    pub fn len(&self) -> usize {
        self.by_qualified_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_qualified_name.is_empty()
    }

    /// Wrappers in insertion order of their qualified names.
    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.by_qualified_name.values()
    }

    /// Every key, short names first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().chain(self.by_qualified_name.keys()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub classes: usize,
    pub structs: usize,
    pub enums: usize,
    pub protocols: usize,
}

impl ModuleSummary {
    pub fn total(&self) -> usize {
        self.classes + self.structs + self.enums + self.protocols
    }
}

/// The types declared in one Swift module.
#[derive(Debug)]
pub struct SwiftModule {
    name: String,
    classes: NameIndex<Class>,
    structs: NameIndex<Struct>,
    enums: NameIndex<Enum>,
    protocols: NameIndex<Protocol>,
}

impl SwiftModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: NameIndex::default(),
            structs: NameIndex::default(),
            enums: NameIndex::default(),
            protocols: NameIndex::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_class(&mut self, class: Arc<Class>) {
        self.classes.insert(class.path(), Arc::clone(&class));
    }

    pub fn add_struct(&mut self, structure: Arc<Struct>) {
        self.structs.insert(structure.path(), Arc::clone(&structure));
    }

    pub fn add_enum(&mut self, enumeration: Arc<Enum>) {
        self.enums.insert(enumeration.path(), Arc::clone(&enumeration));
    }

    pub fn add_protocol(&mut self, protocol: Arc<Protocol>) {
        self.protocols.insert(protocol.path(), Arc::clone(&protocol));
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

    pub fn summary(&self) -> ModuleSummary {
        ModuleSummary {
            classes: self.classes.len(),
            structs: self.structs.len(),
            enums: self.enums.len(),
            protocols: self.protocols.len(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let summary = self.summary();
        serde_json::json!({
            "classes": summary.classes,
            "structs": summary.structs,
            "enums": summary.enums,
            "protocols": summary.protocols,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Descriptor, DecodeLimits, ImageContext};
    use crate::utils::testing::ImageBuilder;

    fn structs(names: &[(&str, &str)]) -> Vec<Arc<Struct>> {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let addresses: Vec<_> = names
            .iter()
            .map(|(outer, name)| {
                let parent = if outer.is_empty() { app } else { b.structure(app, outer, &[]) };
                b.structure(parent, name, &[])
            })
            .collect();
        let ctx = ImageContext::new(Arc::new(b.build()), DecodeLimits::default());
        addresses
            .into_iter()
            .map(|address| match Descriptor::decode(&ctx, address).unwrap() {
                Descriptor::Struct(d) => Arc::new(Struct::new(d, Vec::new()).unwrap()),
                other => panic!("unexpected {:?}", other.kind()),
            })
            .collect()
    }

    #[test]
    fn test_both_keys_share_one_wrapper() {
        let bar = structs(&[("", "Bar")]).remove(0);
        let mut module = SwiftModule::new("App");
        module.add_struct(Arc::clone(&bar));

        let short = module.structs().get("Bar").unwrap();
        let qualified = module.structs().get("App.Bar").unwrap();
        assert!(Arc::ptr_eq(short, qualified));
        assert!(Arc::ptr_eq(short, &bar));
        assert_eq!(module.structs().by_name().len(), 1);
        assert_eq!(module.structs().by_qualified_name().len(), 1);
        assert_eq!(module.structs().keys().collect::<Vec<_>>(), vec!["Bar", "App.Bar"]);
    }

    #[test]
    fn test_short_name_collision_last_write_wins() {
        let mut all = structs(&[("Outer", "Node"), ("Other", "Node")]);
        let second = all.pop().unwrap();
        let first = all.pop().unwrap();
        let mut module = SwiftModule::new("App");
        module.add_struct(Arc::clone(&first));
        module.add_struct(Arc::clone(&second));

        assert!(Arc::ptr_eq(module.structs().get("Node").unwrap(), &second));
        assert!(Arc::ptr_eq(module.structs().get("App.Outer.Node").unwrap(), &first));
        assert!(Arc::ptr_eq(module.structs().get("App.Other.Node").unwrap(), &second));
        assert_eq!(module.summary().structs, 2);
    }

    #[test]
    fn test_summary_json() {
        let mut module = SwiftModule::new("App");
        for s in structs(&[("", "A"), ("", "B")]) {
            module.add_struct(s);
        }
        let json = module.to_json();
        assert_eq!(json, serde_json::json!({"classes": 0, "structs": 2, "enums": 0, "protocols": 0}));
        assert_eq!(module.summary().total(), 2);
    }
}
