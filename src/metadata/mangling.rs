// Sun Oct 18 2026 - Alex

use crate::memory::{Address, MemoryError};
use crate::metadata::{context, ImageContext, MetadataError};
use crate::symbol::demangle;

const DIRECT_CONTEXT_REF: u8 = 0x01;
const INDIRECT_CONTEXT_REF: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolicReference {
    pub kind: u8,
    pub position: usize,
    pub target: Option<Address>,
}

impl SymbolicReference {
    pub fn is_context(&self) -> bool {
        matches!(self.kind, DIRECT_CONTEXT_REF | INDIRECT_CONTEXT_REF)
    }
}

/// A mangled type name as embedded in metadata: plain mangling text with
/// symbolic references spliced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MangledName {
    address: Address,
    bytes: Vec<u8>,
    references: Vec<SymbolicReference>,
}

impl MangledName {
    pub fn read(ctx: &ImageContext, address: Address) -> Result<Self, MemoryError> {
        let reader = ctx.reader();
        let max_len = ctx.limits().max_name_length;
        let mut bytes = Vec::new();
        let mut references = Vec::new();
        let mut cursor = address;

        loop {
            if bytes.len() >= max_len {
                return Err(MemoryError::InvalidString(address.as_u64()));
            }
            let byte = reader.read_u8(cursor)?;
            match byte {
                0 => break,
                0x01..=0x17 => {
                    let field = cursor + 1;
                    let offset = reader.read_i32(field)?;
                    let target = match field.relative(offset) {
                        Some(slot) if byte == INDIRECT_CONTEXT_REF => ctx.resolve_slot(slot)?,
                        other => other,
                    };
                    references.push(SymbolicReference {
                        kind: byte,
                        position: bytes.len(),
                        target,
                    });
                    bytes.extend_from_slice(&reader.read_bytes(cursor, 5)?);
                    cursor = cursor + 5;
                }
                0x18..=0x1f => {
                    let raw = reader.read_u64(cursor + 1)?;
                    references.push(SymbolicReference {
                        kind: byte,
                        position: bytes.len(),
                        target: ctx.module().resolve_pointer(raw),
                    });
                    bytes.extend_from_slice(&reader.read_bytes(cursor, 9)?);
                    cursor = cursor + 9;
                }
                _ => {
                    bytes.push(byte);
                    cursor = cursor + 1;
                }
            }
        }

        Ok(Self {
            address,
            bytes,
            references,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn references(&self) -> &[SymbolicReference] {
        &self.references
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The descriptor this name refers to when the whole name is a single
    /// context reference.
    pub fn single_context_reference(&self) -> Option<Address> {
        match self.references.as_slice() {
            [reference] if reference.is_context() && reference.position == 0 && self.bytes.len() == 5 => {
                reference.target
            }
            _ => None,
        }
    }

    /// Plain mangling text with symbolic references rendered as `\xNN`.
    pub fn escaped(&self) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < self.bytes.len() {
            match self.references.iter().find(|r| r.position == i) {
                Some(reference) => {
                    out.push_str(&format!("\\x{:02x}", reference.kind));
                    i += if reference.kind >= 0x18 { 9 } else { 5 };
                }
                None => {
                    out.push(self.bytes[i] as char);
                    i += 1;
                }
            }
        }
        out
    }

    /// Human-readable rendering. Context references become the referenced
    /// type's qualified name, plain manglings go through the type demangler.
    pub fn readable(&self, ctx: &ImageContext) -> String {
        if self.references.is_empty() {
            let text = String::from_utf8_lossy(&self.bytes);
            return demangle::demangle_type(&text).unwrap_or_else(|| text.into_owned());
        }

        let mut out = String::new();
        let mut i = 0;
        while i < self.bytes.len() {
            match self.references.iter().find(|r| r.position == i) {
                Some(reference) => {
                    out.push_str(&self.render_reference(ctx, reference));
                    i += if reference.kind >= 0x18 { 9 } else { 5 };
                }
                None => {
                    let end = self
                        .references
                        .iter()
                        .map(|r| r.position)
                        .filter(|&p| p > i)
                        .min()
                        .unwrap_or(self.bytes.len());
                    let text = String::from_utf8_lossy(&self.bytes[i..end]);
                    out.push_str(&render_suffix(&text));
                    i = end;
                }
            }
        }
        out
    }

    fn render_reference(&self, ctx: &ImageContext, reference: &SymbolicReference) -> String {
        let resolved: Result<String, MetadataError> = match reference.target {
            Some(target) if reference.is_context() => {
                context::resolve_context_path(ctx, target, ctx.limits().max_context_depth)
                    .map(|path| path.qualified())
            }
            _ => Err(MetadataError::malformed(self.address, "unresolvable symbolic reference")),
        };
        resolved.unwrap_or_else(|_| format!("\\x{:02x}", reference.kind))
    }
}

fn render_suffix(text: &str) -> String {
    match text {
        "Sg" => "?".to_string(),
        "SgSg" => "??".to_string(),
        other => demangle::demangle_type(other).unwrap_or_else(|| other.to_string()),
    }
}
