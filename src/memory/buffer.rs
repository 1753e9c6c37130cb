// Sun Oct 18 2026 - Alex

use crate::host::LoadedModule;
use crate::memory::{Address, BinarySection, BinarySymbol, MemoryError, MemoryReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// An image held in memory at a fixed base address. Used for images handed
/// over by a host as raw bytes and for synthesized test images.
pub struct ByteImage {
    name: String,
    path: PathBuf,
    base: Address,
    data: Vec<u8>,
    sections: Vec<BinarySection>,
    symbols: Vec<BinarySymbol>,
    binds: Vec<(Address, String)>,
    header_valid: bool,
    mapped: AtomicBool,
}

impl ByteImage {
    pub fn new(name: impl Into<String>, base: Address, data: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(format!("/memory/{}", name)),
            name,
            base,
            data,
            sections: Vec::new(),
            symbols: Vec::new(),
            binds: Vec::new(),
            header_valid: true,
            mapped: AtomicBool::new(true),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_sections(mut self, sections: Vec<BinarySection>) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_symbols(mut self, symbols: Vec<BinarySymbol>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Pointer slots the loader would bind to another image's symbol.
    pub fn with_binds(mut self, binds: Vec<(Address, String)>) -> Self {
        self.binds = binds;
        self
    }

    /// Makes the section table unreadable, as if the header were damaged.
    pub fn with_corrupt_header(mut self) -> Self {
        self.header_valid = false;
        self
    }

    pub fn unmap(&self) {
        self.mapped.store(false, Ordering::SeqCst);
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped.load(Ordering::SeqCst)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn check_mapped(&self) -> Result<(), MemoryError> {
        if self.is_mapped() {
            Ok(())
        } else {
            Err(MemoryError::Unmapped(self.name.clone()))
        }
    }
}

impl MemoryReader for ByteImage {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        self.check_mapped()?;
        let offset = addr
            .as_u64()
            .checked_sub(self.base.as_u64())
            .ok_or(MemoryError::OutOfBounds(addr.as_u64()))? as usize;
        let end = offset
            .checked_add(len)
            .ok_or(MemoryError::OutOfBounds(addr.as_u64()))?;
        if end > self.data.len() {
            return Err(MemoryError::OutOfBounds(addr.as_u64()));
        }
        Ok(self.data[offset..end].to_vec())
    }
}

impl LoadedModule for ByteImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn base(&self) -> Address {
        self.base
    }

    fn reader(&self) -> &dyn MemoryReader {
        self
    }

    fn sections(&self) -> Result<Vec<BinarySection>, MemoryError> {
        self.check_mapped()?;
        if !self.header_valid {
            return Err(MemoryError::BinaryParseError(format!(
                "Bad image header in {}",
                self.name
            )));
        }
        Ok(self.sections.clone())
    }

    fn exported_symbols(&self) -> Result<Vec<BinarySymbol>, MemoryError> {
        self.check_mapped()?;
        if !self.header_valid {
            return Err(MemoryError::BinaryParseError(format!(
                "Bad image header in {}",
                self.name
            )));
        }
        Ok(self.symbols.clone())
    }

    fn bound_symbol(&self, slot: Address, _raw: u64) -> Option<String> {
        self.binds
            .iter()
            .find(|(address, _)| *address == slot)
            .map(|(_, name)| name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_within_bounds() {
        let image = ByteImage::new("img", Address::new(0x1000), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(image.read_u32(Address::new(0x1000)).unwrap(), 0x04030201);
        assert_eq!(image.read_i32(Address::new(0x1004)).unwrap(), 0x08070605);
        assert!(image.read_bytes(Address::new(0x1006), 4).is_err());
        assert!(image.read_bytes(Address::new(0xfff), 1).is_err());
    }

    #[test]
    fn test_unmapped_is_distinguishable() {
        let image = ByteImage::new("img", Address::new(0x1000), vec![0; 16]);
        image.unmap();
        let err = image.read_bytes(Address::new(0x1000), 4).unwrap_err();
        assert!(err.is_unmapped());
        assert!(image.sections().unwrap_err().is_unmapped());
    }

    #[test]
    fn test_c_string_needs_terminator() {
        let image = ByteImage::new("img", Address::new(0), b"Foo\0Barbaz".to_vec());
        assert_eq!(image.read_c_string(Address::new(0), 64).unwrap(), "Foo");
        assert!(image.read_c_string(Address::new(4), 64).is_err());
        assert!(image.read_c_string(Address::new(0), 2).is_err());
    }
}
