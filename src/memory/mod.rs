// Sun Oct 18 2026 - Alex

pub mod address;
pub mod binary;
pub mod buffer;
pub mod error;
pub mod range;
pub mod traits;

pub use address::Address;
pub use binary::{BinarySection, BinarySegment, BinarySymbol, ImageFormat, MappedImage};
pub use buffer::ByteImage;
pub use error::MemoryError;
pub use range::{Entries, MemoryRange};
pub use traits::MemoryReader;
