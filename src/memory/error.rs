// Sun Oct 18 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image is no longer mapped: {0}")]
    Unmapped(String),
    #[error("Out of bounds: address 0x{0:x} not in image")]
    OutOfBounds(u64),
    #[error("Binary parse error: {0}")]
    BinaryParseError(String),
    #[error("Invalid string at address 0x{0:x}")]
    InvalidString(u64),
    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl MemoryError {
    pub fn is_unmapped(&self) -> bool {
        matches!(self, Self::Unmapped(_))
    }
}
