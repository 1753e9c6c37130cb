// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::flags::{ProtocolRequirementFlags, ProtocolRequirementKind};
use crate::metadata::{ImageContext, MetadataError};
use serde::Serialize;

pub const GENERIC_REQUIREMENT_SIZE: u64 = 12;
pub const PROTOCOL_REQUIREMENT_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtocolRequirement {
    pub kind: ProtocolRequirementKind,
    pub is_instance: bool,
    pub is_async: bool,
    pub has_default_implementation: bool,
}

impl ProtocolRequirement {
    pub fn from_flags(flags: ProtocolRequirementFlags, has_default_implementation: bool) -> Self {
        Self {
            kind: flags.kind(),
            is_instance: flags.contains(ProtocolRequirementFlags::IS_INSTANCE),
            is_async: flags.contains(ProtocolRequirementFlags::IS_ASYNC),
            has_default_implementation,
        }
    }
}

/// Reads `count` requirements starting at `start`, which sits right after
/// the protocol's requirement signature.
pub fn read_requirements(
    ctx: &ImageContext,
    owner: Address,
    start: Address,
    count: u32,
) -> Result<Vec<ProtocolRequirement>, MetadataError> {
    ctx.check_count(owner, count, "requirement")?;
    let mut requirements = Vec::with_capacity(count as usize);
    for i in 0..count as u64 {
        let address = start + i * PROTOCOL_REQUIREMENT_SIZE;
        let mut record = ctx
            .read_record(address, PROTOCOL_REQUIREMENT_SIZE as usize)
            .map_err(|e| MetadataError::malformed(owner, format!("requirement {}: {}", i, e)))?;
        let flags = ProtocolRequirementFlags::from_bits_retain(record.u32());
        let default_implementation = record.relative();
        requirements.push(ProtocolRequirement::from_flags(
            flags,
            !default_implementation.is_null(),
        ));
    }
    Ok(requirements)
}
