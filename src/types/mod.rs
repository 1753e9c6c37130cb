// Sun Oct 18 2026 - Alex

pub mod class;
pub mod conformance;
pub mod enumeration;
pub mod protocol;
pub mod structure;

pub use class::Class;
pub use conformance::Conformance;
pub use enumeration::Enum;
pub use protocol::Protocol;
pub use structure::Struct;

use crate::memory::Address;
use crate::metadata::{ContextPath, EnumCase, Field, MetadataError, ProtocolRequirement};
use log::warn;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Enum,
    Protocol,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

/// Any of the four wrapper kinds.
#[derive(Debug, Clone)]
pub enum Type {
    Class(Arc<Class>),
    Struct(Arc<Struct>),
    Enum(Arc<Enum>),
    Protocol(Arc<Protocol>),
}

impl Type {
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Class(_) => TypeKind::Class,
            Self::Struct(_) => TypeKind::Struct,
            Self::Enum(_) => TypeKind::Enum,
            Self::Protocol(_) => TypeKind::Protocol,
        }
    }

    pub fn path(&self) -> &ContextPath {
        match self {
            Self::Class(t) => t.path(),
            Self::Struct(t) => t.path(),
            Self::Enum(t) => t.path(),
            Self::Protocol(t) => t.path(),
        }
    }

    pub fn name(&self) -> &str {
        self.path().name()
    }

    pub fn full_name(&self) -> String {
        self.path().qualified()
    }

    pub fn module_name(&self) -> &str {
        self.path().module()
    }

    /// Swift mangling of the declaration, e.g. `3App3FooC`.
    pub fn mangled_name(&self) -> String {
        self.path().mangled_name()
    }

    pub fn address(&self) -> Address {
        match self {
            Self::Class(t) => t.address(),
            Self::Struct(t) => t.address(),
            Self::Enum(t) => t.address(),
            Self::Protocol(t) => t.address(),
        }
    }

    pub fn conformances(&self) -> &[Conformance] {
        match self {
            Self::Class(t) => t.conformances(),
            Self::Struct(t) => t.conformances(),
            Self::Enum(t) => t.conformances(),
            Self::Protocol(_) => &[],
        }
    }

    pub fn info(&self) -> TypeInfo {
        match self {
            Self::Class(t) => t.info(),
            Self::Struct(t) => t.info(),
            Self::Enum(t) => t.info(),
            Self::Protocol(t) => t.info(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path())
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.info().serialize(serializer)
    }
}

/// Flat, serializable view of a wrapper. Lazily decoded parts that fail to
/// decode are left empty.
#[derive(Debug, Clone, Serialize)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub name: String,
    pub full_name: String,
    pub mangled_name: String,
    pub module: String,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cases: Vec<EnumCase>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<ProtocolRequirement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub associated_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conformances: Vec<String>,
}

impl TypeInfo {
    fn new(kind: TypeKind, path: &ContextPath, address: Address) -> Self {
        Self {
            kind,
            name: path.name().to_string(),
            full_name: path.qualified(),
            mangled_name: path.mangled_name(),
            module: path.module().to_string(),
            address,
            superclass: None,
            fields: Vec::new(),
            cases: Vec::new(),
            requirements: Vec::new(),
            associated_types: Vec::new(),
            conformances: Vec::new(),
        }
    }

    fn with_conformances(mut self, conformances: &[Conformance]) -> Self {
        self.conformances = conformances.iter().map(|c| c.protocol().full_name()).collect();
        self
    }
}

/// Unwraps a lazily decoded part for display, logging the failure.
fn decoded_or_default<T: Default>(what: &str, owner: &ContextPath, result: Result<T, MetadataError>) -> T {
    result.unwrap_or_else(|e| {
        warn!("Could not decode {} of {}: {}", what, owner, e);
        T::default()
    })
}

/// Whether `name` names `path` either by short or fully-qualified name.
fn names(path: &ContextPath, name: &str) -> bool {
    path.name() == name || path.qualified() == name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ConformanceRecord, ContextDescriptorKind, Descriptor, DecodeLimits, ImageContext};
    use crate::symbol::demangle::demangle_type;
    use crate::utils::testing::{FieldSpec, FieldType, ImageBuilder};

    struct Fixture {
        ctx: Arc<ImageContext>,
        foo: Address,
        shape: Address,
        proto: Address,
        record: Address,
    }

    fn fixture() -> Fixture {
        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let proto = b.protocol_with(app, "Drawable", 0, &[], &["Canvas"]);
        let base = b.class(app, "Base", &[]);
        let foo = b.class_with_superclass(
            app,
            "Foo",
            Some(FieldType::Descriptor(base)),
            &[FieldSpec::var("count", FieldType::Mangled("Si"))],
        );
        let shape = b.enumeration(
            app,
            "Shape",
            &[
                FieldSpec::case("circle", FieldType::Mangled("Sd")),
                FieldSpec::case("empty", FieldType::None),
            ],
            1,
        );
        let record = b.conformance(proto, foo);
        let ctx = ImageContext::new(Arc::new(b.build()), DecodeLimits::default());
        Fixture {
            ctx,
            foo,
            shape,
            proto,
            record,
        }
    }

    fn protocol(f: &Fixture) -> Arc<Protocol> {
        let Descriptor::Protocol(d) = Descriptor::decode(&f.ctx, f.proto).unwrap() else {
            panic!("expected a protocol");
        };
        Arc::new(Protocol::new(d).unwrap())
    }

    fn class(f: &Fixture) -> Class {
        let Descriptor::Class(d) = Descriptor::decode(&f.ctx, f.foo).unwrap() else {
            panic!("expected a class");
        };
        let record = ConformanceRecord::read(&f.ctx, f.record).unwrap();
        Class::new(d, vec![Conformance::new(protocol(f), &record, "App")]).unwrap()
    }

    #[test]
    fn test_class_wrapper() {
        let f = fixture();
        let foo = class(&f);
        assert_eq!(foo.name(), "Foo");
        assert_eq!(foo.full_name(), "App.Foo");
        assert_eq!(foo.module_name(), "App");
        assert_eq!(foo.address(), f.foo);
        assert_eq!(foo.superclass_name().unwrap(), Some("App.Base"));
        assert_eq!(foo.fields().unwrap()[0].type_name.as_deref(), Some("Swift.Int"));
        assert_eq!(foo.conformances().len(), 1);
        assert_eq!(foo.conformances()[0].record_address(), f.record);
        assert!(foo.conforms_to("Drawable"));
        assert!(foo.conforms_to("App.Drawable"));
        assert!(!foo.conforms_to("Hashable"));
        assert_eq!(foo.to_string(), "class App.Foo");
    }

    #[test]
    fn test_mangled_names() {
        let f = fixture();
        let foo = class(&f);
        assert_eq!(foo.mangled_name(), "3App3FooC");
        assert_eq!(demangle_type(&foo.mangled_name()).as_deref(), Some("App.Foo"));

        let proto = protocol(&f);
        assert_eq!(proto.mangled_name(), "3App8DrawableP");

        let Descriptor::Enum(d) = Descriptor::decode(&f.ctx, f.shape).unwrap() else {
            panic!("expected an enum");
        };
        let shape = Type::Enum(Arc::new(Enum::new(d, Vec::new()).unwrap()));
        assert_eq!(shape.mangled_name(), "3App5ShapeO");
        assert_eq!(serde_json::to_value(&shape).unwrap()["mangled_name"], "3App5ShapeO");
    }

    #[test]
    fn test_enum_and_protocol_wrappers() {
        let f = fixture();
        let Descriptor::Enum(d) = Descriptor::decode(&f.ctx, f.shape).unwrap() else {
            panic!("expected an enum");
        };
        let shape = Enum::new(d, Vec::new()).unwrap();
        assert_eq!(shape.num_payload_cases(), 1);
        assert_eq!(shape.num_empty_cases(), 1);
        let cases = shape.cases().unwrap();
        assert_eq!(cases[0].payload_type.as_deref(), Some("Swift.Double"));
        assert_eq!(cases[1].payload_type, None);

        let proto = protocol(&f);
        assert_eq!(proto.full_name(), "App.Drawable");
        assert_eq!(proto.associated_type_names().unwrap(), ["Canvas"]);
        assert!(!proto.is_class_constrained());

        let mut b = ImageBuilder::new("App");
        let app = b.module("App");
        let delegate = b.class_protocol(app, "Delegate");
        let ctx = ImageContext::new(Arc::new(b.build()), DecodeLimits::default());
        let Descriptor::Protocol(d) = Descriptor::decode(&ctx, delegate).unwrap() else {
            panic!("expected a protocol");
        };
        let delegate = Protocol::new(d).unwrap();
        assert!(delegate.is_class_constrained());
    }

    #[test]
    fn test_type_info_json() {
        let f = fixture();
        let ty = Type::Class(Arc::new(class(&f)));
        assert_eq!(ty.kind(), TypeKind::Class);
        assert_eq!(ty.to_string(), "class App.Foo");

        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json["kind"], "class");
        assert_eq!(json["full_name"], "App.Foo");
        assert_eq!(json["superclass"], "App.Base");
        assert_eq!(json["fields"][0]["name"], "count");
        assert_eq!(json["conformances"][0], "App.Drawable");
        assert!(json.get("cases").is_none());

        let proto = Type::Protocol(protocol(&f));
        assert!(proto.conformances().is_empty());
        let json = serde_json::to_value(&proto).unwrap();
        assert_eq!(json["kind"], "protocol");
        assert_eq!(json["associated_types"][0], "Canvas");
    }

    #[test]
    fn test_names_matches_short_and_qualified() {
        let path = ContextPath::new(
            "App",
            vec![
                (ContextDescriptorKind::Struct, "Outer".to_string()),
                (ContextDescriptorKind::Struct, "Inner".to_string()),
            ],
        );
        assert!(names(&path, "Inner"));
        assert!(names(&path, "App.Outer.Inner"));
        assert!(!names(&path, "Outer.Inner"));
    }
}
