// Sun Oct 18 2026 - Alex

use crate::memory::{Address, MemoryError};

pub trait MemoryReader: Send + Sync {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError>;

    fn read_u8(&self, addr: Address) -> Result<u8, MemoryError> {
        let bytes = self.read_bytes(addr, 1)?;
        Ok(bytes[0])
    }

    fn read_u16(&self, addr: Address) -> Result<u16, MemoryError> {
        let bytes = self.read_bytes(addr, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&self, addr: Address) -> Result<u32, MemoryError> {
        let bytes = self.read_bytes(addr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&self, addr: Address) -> Result<i32, MemoryError> {
        Ok(self.read_u32(addr)? as i32)
    }

    fn read_u64(&self, addr: Address) -> Result<u64, MemoryError> {
        let bytes = self.read_bytes(addr, 8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn read_c_string(&self, addr: Address, max_len: usize) -> Result<String, MemoryError> {
        let bytes = self.read_c_bytes(addr, max_len)?;
        String::from_utf8(bytes).map_err(|_| MemoryError::InvalidString(addr.as_u64()))
    }

    /// Bytes up to (not including) the first NUL. Fails if no terminator is
    /// found within `max_len` bytes.
    fn read_c_bytes(&self, addr: Address, max_len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut bytes = Vec::new();
        let mut current = addr;
        while bytes.len() < max_len {
            let byte = self.read_u8(current)?;
            if byte == 0 {
                return Ok(bytes);
            }
            bytes.push(byte);
            current = current + 1;
        }
        Err(MemoryError::InvalidString(addr.as_u64()))
    }
}
