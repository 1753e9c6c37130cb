// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::flags::{FieldDescriptorKind, FieldRecordFlags};
use crate::metadata::{ImageContext, MangledName, MetadataError};
use serde::Serialize;

const FIELD_DESCRIPTOR_HEADER_SIZE: u64 = 16;
const FIELD_RECORD_SIZE: u16 = 12;

#[derive(Debug, Clone)]
pub struct FieldRecord {
    pub flags: FieldRecordFlags,
    pub name: Option<String>,
    pub mangled_type_name: Option<MangledName>,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub address: Address,
    pub kind: FieldDescriptorKind,
    pub mangled_type_name: Option<MangledName>,
    pub superclass: Option<MangledName>,
    pub records: Vec<FieldRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub type_name: Option<String>,
    pub mangled_type_name: Option<String>,
    pub is_var: bool,
    pub is_indirect: bool,
    pub is_artificial: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumCase {
    pub name: String,
    pub payload_type: Option<String>,
    pub is_indirect: bool,
}

impl FieldDescriptor {
    /// Reads the field descriptor at `address` on behalf of the type
    /// descriptor at `owner`; failures are attributed to the owner.
    pub fn read(ctx: &ImageContext, address: Address, owner: Address) -> Result<Self, MetadataError> {
        let mut header = ctx
            .read_record(address, FIELD_DESCRIPTOR_HEADER_SIZE as usize)
            .map_err(|e| MetadataError::malformed(owner, format!("field descriptor: {}", e)))?;
        let type_name = header.relative();
        let superclass = header.relative();
        let kind = FieldDescriptorKind::from(header.u16());
        let record_size = header.u16();
        let num_fields = header.u32();

        ctx.check_count(owner, num_fields, "field")?;
        if num_fields > 0 && record_size < FIELD_RECORD_SIZE {
            return Err(MetadataError::malformed(
                owner,
                format!("field record size {} too small", record_size),
            ));
        }

        let mut records = Vec::with_capacity(num_fields as usize);
        for i in 0..num_fields as u64 {
            let record_address = address + FIELD_DESCRIPTOR_HEADER_SIZE + i * record_size as u64;
            let mut record = ctx
                .read_record(record_address, FIELD_RECORD_SIZE as usize)
                .map_err(|e| MetadataError::malformed(owner, format!("field record {}: {}", i, e)))?;
            let flags = FieldRecordFlags::from_bits_retain(record.u32());
            let mangled = record.relative();
            let name = record.relative();

            records.push(FieldRecord {
                flags,
                name: ctx.read_optional_string(name, owner, "field name")?,
                mangled_type_name: read_mangled(ctx, mangled.target(), owner)?,
            });
        }

        Ok(Self {
            address,
            kind,
            mangled_type_name: read_mangled(ctx, type_name.target(), owner)?,
            superclass: read_mangled(ctx, superclass.target(), owner)?,
            records,
        })
    }

    pub fn fields(&self, ctx: &ImageContext) -> Vec<Field> {
        self.records
            .iter()
            .map(|record| Field {
                name: record.name.clone().unwrap_or_default(),
                type_name: record.mangled_type_name.as_ref().map(|m| m.readable(ctx)),
                mangled_type_name: record.mangled_type_name.as_ref().map(|m| m.escaped()),
                is_var: record.flags.contains(FieldRecordFlags::IS_VAR),
                is_indirect: record.flags.contains(FieldRecordFlags::IS_INDIRECT_CASE),
                is_artificial: record.flags.contains(FieldRecordFlags::IS_ARTIFICIAL),
            })
            .collect()
    }

    /// Enum cases: payload cases come first and carry a type; an empty
    /// payload type name also marks a case without payload.
    pub fn cases(&self, ctx: &ImageContext, payload_cases: u32) -> Vec<EnumCase> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let payload_type = if (i as u32) < payload_cases {
                    record
                        .mangled_type_name
                        .as_ref()
                        .filter(|m| !m.is_empty())
                        .map(|m| m.readable(ctx))
                } else {
                    None
                };
                EnumCase {
                    name: record.name.clone().unwrap_or_default(),
                    payload_type,
                    is_indirect: record.flags.contains(FieldRecordFlags::IS_INDIRECT_CASE),
                }
            })
            .collect()
    }
}

pub(crate) fn read_mangled(ctx: &ImageContext, target: Option<Address>, owner: Address) -> Result<Option<MangledName>, MetadataError> {
    match target {
        Some(target) => MangledName::read(ctx, target)
            .map(Some)
            .map_err(|e| MetadataError::malformed(owner, format!("mangled name: {}", e))),
        None => Ok(None),
    }
}
