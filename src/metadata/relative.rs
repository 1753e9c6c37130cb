// Sun Oct 18 2026 - Alex

use crate::host::LoadedModule;
use crate::memory::{Address, MemoryError, MemoryReader};
use bytes::{Buf, Bytes};

const INDIRECT_BIT: i32 = 1;

/// A 32-bit signed offset stored at `field`, pointing at `field + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelativePointer {
    field: Address,
    offset: i32,
}

impl RelativePointer {
    pub fn new(field: Address, offset: i32) -> Self {
        Self { field, offset }
    }

    pub fn read(reader: &dyn MemoryReader, field: Address) -> Result<Self, MemoryError> {
        Ok(Self::new(field, reader.read_i32(field)?))
    }

    pub fn field(&self) -> Address {
        self.field
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn is_null(&self) -> bool {
        self.offset == 0
    }

    /// Drops low tag bits packed into the offset.
    pub fn untagged(&self, mask: i32) -> Self {
        Self::new(self.field, self.offset & !mask)
    }

    pub fn tag(&self, mask: i32) -> i32 {
        self.offset & mask
    }

    pub fn target(&self) -> Option<Address> {
        self.field.relative(self.offset)
    }

    pub fn is_indirect(&self) -> bool {
        self.tag(INDIRECT_BIT) != 0
    }

    /// The reference with its indirection bit cleared.
    pub fn direct(&self) -> Self {
        self.untagged(INDIRECT_BIT)
    }

    /// Resolves a reference whose low bit marks an indirection through a
    /// pointer-sized slot.
    pub fn resolve_indirectable(&self, module: &dyn LoadedModule) -> Result<Option<Address>, MemoryError> {
        if self.is_indirect() {
            self.direct().resolve_through_slot(module)
        } else {
            Ok(self.target())
        }
    }

    pub fn resolve_through_slot(&self, module: &dyn LoadedModule) -> Result<Option<Address>, MemoryError> {
        let Some(slot) = self.target() else {
            return Ok(None);
        };
        let raw = module.reader().read_u64(slot)?;
        Ok(module.resolve_pointer(raw))
    }
}

/// Sequential little-endian reader over a record already copied out of the
/// image. Relative fields remember the address they were read from.
pub struct RecordCursor {
    base: Address,
    pos: u64,
    buf: Bytes,
}

impl RecordCursor {
    pub fn new(base: Address, data: Vec<u8>) -> Self {
        Self {
            base,
            pos: 0,
            buf: Bytes::from(data),
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn position(&self) -> Address {
        self.base + self.pos
    }

    pub fn u16(&mut self) -> u16 {
        self.pos += 2;
        self.buf.get_u16_le()
    }

    pub fn u32(&mut self) -> u32 {
        self.pos += 4;
        self.buf.get_u32_le()
    }

    pub fn relative(&mut self) -> RelativePointer {
        let field = self.position();
        self.pos += 4;
        RelativePointer::new(field, self.buf.get_i32_le())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ByteImage;

    fn image_with(data: Vec<u8>) -> ByteImage {
        ByteImage::new("rel", Address::new(0x4000), data)
    }

    #[test]
    fn test_zero_offset_is_absent() {
        let image = image_with(vec![0; 16]);
        let ptr = RelativePointer::read(&image, Address::new(0x4004)).unwrap();
        assert!(ptr.is_null());
        assert_eq!(ptr.target(), None);
        assert_eq!(ptr.resolve_indirectable(&image).unwrap(), None);
    }

    #[test]
    fn test_direct_target() {
        let mut data = vec![0u8; 16];
        data[4..8].copy_from_slice(&8i32.to_le_bytes());
        let image = image_with(data);
        let ptr = RelativePointer::read(&image, Address::new(0x4004)).unwrap();
        assert_eq!(ptr.target(), Some(Address::new(0x400c)));
        assert_eq!(ptr.resolve_indirectable(&image).unwrap(), Some(Address::new(0x400c)));
    }

    #[test]
    fn test_indirect_target_reads_slot() {
        let mut data = vec![0u8; 24];
        data[0..4].copy_from_slice(&(8i32 | 1).to_le_bytes());
        data[8..16].copy_from_slice(&0x4010u64.to_le_bytes());
        let image = image_with(data);
        let ptr = RelativePointer::read(&image, Address::new(0x4000)).unwrap();
        assert_eq!(ptr.resolve_indirectable(&image).unwrap(), Some(Address::new(0x4010)));
    }

    #[test]
    fn test_cursor_tracks_field_addresses() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x11u32.to_le_bytes());
        data.extend_from_slice(&(-4i32).to_le_bytes());
        data.extend_from_slice(&7u16.to_le_bytes());
        let mut cursor = RecordCursor::new(Address::new(0x100), data);
        assert_eq!(cursor.u32(), 0x11);
        let rel = cursor.relative();
        assert_eq!(rel.field(), Address::new(0x104));
        assert_eq!(rel.target(), Some(Address::new(0x100)));
        assert_eq!(cursor.u16(), 7);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_indirect_null_slot() {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(&(8i32 | 1).to_le_bytes());
        let image = image_with(data);
        let ptr = RelativePointer::read(&image, Address::new(0x4000)).unwrap();
        assert_eq!(ptr.resolve_indirectable(&image).unwrap(), None);
    }
}
