// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::{
    ContextDescriptorFlags, ContextDescriptorKind, ImageContext, MangledName, MetadataError,
    RelativePointer,
};
use serde::Serialize;
use std::fmt;

const CONTEXT_HEADER_SIZE: usize = 8;
const NAMED_CONTEXT_SIZE: usize = 12;

const STDLIB_MODULE: &str = "Swift";
const IMPORTED_MODULE: &str = "__C";

/// Location of a declaration: its module plus the names of the enclosing
/// declarations, outermost first, ending with the declaration itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContextPath {
    module: String,
    components: Vec<String>,
    #[serde(skip)]
    kinds: Vec<ContextDescriptorKind>,
}

impl ContextPath {
    pub fn new(module: impl Into<String>, components: Vec<(ContextDescriptorKind, String)>) -> Self {
        let (kinds, components): (Vec<_>, Vec<_>) = components.into_iter().unzip();
        Self {
            module: module.into(),
            components,
            kinds,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Kind of each component, in the same order as `components`.
    pub fn kinds(&self) -> &[ContextDescriptorKind] {
        &self.kinds
    }

    pub fn name(&self) -> &str {
        self.components.last().map(String::as_str).unwrap_or(&self.module)
    }

    pub fn qualified(&self) -> String {
        let mut out = self.module.clone();
        for component in &self.components {
            out.push('.');
            out.push_str(component);
        }
        out
    }

    /// Swift type mangling of the path without word substitutions, e.g.
    /// `3App3FooC` or `3App5OuterV4NodeO`.
    pub fn mangled_name(&self) -> String {
        let mut out = match self.module.as_str() {
            STDLIB_MODULE => "s".to_string(),
            IMPORTED_MODULE => "So".to_string(),
            module => mangle_identifier(module),
        };
        for (name, kind) in self.components.iter().zip(&self.kinds) {
            out.push_str(&mangle_identifier(name));
            out.push_str(match kind {
                ContextDescriptorKind::Class => "C",
                ContextDescriptorKind::Struct => "V",
                ContextDescriptorKind::Enum => "O",
                ContextDescriptorKind::Protocol => "P",
                _ => "",
            });
        }
        out
    }

    fn extended(mut self, inner: Vec<(ContextDescriptorKind, String)>) -> Self {
        for (kind, name) in inner {
            self.kinds.push(kind);
            self.components.push(name);
        }
        self
    }
}

fn mangle_identifier(name: &str) -> String {
    format!("{}{}", name.len(), name)
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// The part of a context descriptor needed to walk a parent chain.
#[derive(Debug, Clone)]
pub enum ParentContext {
    Module { name: String },
    Extension { extended: Option<MangledName> },
    Anonymous,
    OpaqueType,
    Named { kind: ContextDescriptorKind, name: String },
}

#[derive(Debug, Clone)]
pub struct ContextNode {
    pub address: Address,
    pub flags: ContextDescriptorFlags,
    pub parent: RelativePointer,
    pub context: ParentContext,
}

pub fn read_context(ctx: &ImageContext, address: Address) -> Result<ContextNode, MetadataError> {
    let mut header = ctx.read_record(address, CONTEXT_HEADER_SIZE)?;
    let flags = ContextDescriptorFlags::from_bits_retain(header.u32());
    let parent = header.relative();
    let kind = flags.kind().ok_or_else(|| {
        MetadataError::malformed(address, format!("unknown kind tag 0x{:02x}", flags.kind_raw()))
    })?;

    let context = match kind {
        ContextDescriptorKind::Anonymous => ParentContext::Anonymous,
        ContextDescriptorKind::OpaqueType => ParentContext::OpaqueType,
        ContextDescriptorKind::Extension => {
            let mut record = ctx.read_record(address, NAMED_CONTEXT_SIZE)?;
            record.u32();
            record.relative();
            let extended = record.relative();
            let extended = match extended.target() {
                Some(target) => MangledName::read(ctx, target).ok(),
                None => None,
            };
            ParentContext::Extension { extended }
        }
        ContextDescriptorKind::Module => {
            let name = read_context_name(ctx, address)?;
            ParentContext::Module { name }
        }
        ContextDescriptorKind::Protocol
        | ContextDescriptorKind::Class
        | ContextDescriptorKind::Struct
        | ContextDescriptorKind::Enum => {
            let name = read_context_name(ctx, address)?;
            ParentContext::Named { kind, name }
        }
    };

    Ok(ContextNode {
        address,
        flags,
        parent,
        context,
    })
}

fn read_context_name(ctx: &ImageContext, address: Address) -> Result<String, MetadataError> {
    let mut record = ctx.read_record(address, NAMED_CONTEXT_SIZE)?;
    record.u32();
    record.relative();
    let name = record.relative();
    ctx.read_string(name, address, "name")
}

/// Walks parent references from a declaration named `name` until a module
/// context is reached.
pub fn resolve_path(
    ctx: &ImageContext,
    address: Address,
    kind: ContextDescriptorKind,
    name: &str,
    parent: RelativePointer,
    depth: usize,
) -> Result<ContextPath, MetadataError> {
    let mut components = vec![(kind, name.to_string())];
    let mut parent = parent;
    let mut owner = address;

    for remaining in (0..depth).rev() {
        let parent_address = ctx
            .resolve_indirectable(parent, owner)?
            .ok_or_else(|| MetadataError::malformed(address, "context chain ends without a module"))?;
        let node = read_context(ctx, parent_address)?;

        match node.context {
            ParentContext::Module { name } => {
                components.reverse();
                return Ok(ContextPath::new(name, components));
            }
            ParentContext::Extension { extended } => {
                if let Some(target) = extended.and_then(|m| m.single_context_reference()) {
                    let base = resolve_context_path(ctx, target, remaining)?;
                    components.reverse();
                    return Ok(base.extended(components));
                }
            }
            ParentContext::Named { kind, name } => components.push((kind, name)),
            ParentContext::Anonymous | ParentContext::OpaqueType => {}
        }

        owner = parent_address;
        parent = node.parent;
    }

    Err(MetadataError::malformed(address, "context chain too deep"))
}

/// Path of the context descriptor at `address`, whatever its kind. A module
/// context yields a path with no components.
pub fn resolve_context_path(ctx: &ImageContext, address: Address, depth: usize) -> Result<ContextPath, MetadataError> {
    if depth == 0 {
        return Err(MetadataError::malformed(address, "context chain too deep"));
    }
    let node = read_context(ctx, address)?;
    match node.context {
        ParentContext::Module { name } => Ok(ContextPath::new(name, Vec::new())),
        ParentContext::Named { kind, name } => resolve_path(ctx, address, kind, &name, node.parent, depth - 1),
        _ => Err(MetadataError::malformed(address, "context has no name")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        let path = ContextPath::new(
            "App",
            vec![
                (ContextDescriptorKind::Struct, "Outer".to_string()),
                (ContextDescriptorKind::Enum, "Inner".to_string()),
            ],
        );
        assert_eq!(path.qualified(), "App.Outer.Inner");
        assert_eq!(path.name(), "Inner");
        assert_eq!(path.to_string(), "App.Outer.Inner");
        assert_eq!(path.mangled_name(), "3App5OuterV5InnerO");
    }

    #[test]
    fn test_mangled_module_shorthands() {
        let int = ContextPath::new("Swift", vec![(ContextDescriptorKind::Struct, "Int".to_string())]);
        assert_eq!(int.mangled_name(), "s3IntV");
        let object = ContextPath::new("__C", vec![(ContextDescriptorKind::Class, "NSObject".to_string())]);
        assert_eq!(object.mangled_name(), "So8NSObjectC");
    }

    #[test]
    fn test_module_path_name() {
        let path = ContextPath::new("App", Vec::new());
        assert_eq!(path.name(), "App");
        assert_eq!(path.qualified(), "App");
    }
}
