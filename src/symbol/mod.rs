// Sun Oct 18 2026 - Alex

pub mod demangle;
pub mod enumerate;
pub mod error;
pub mod symbol_info;

pub use demangle::{Demangler, SwiftDemangler};
pub use enumerate::{enumerate_demangled_symbols, enumerate_with_filter, SymbolFilter};
pub use error::SymbolError;
pub use symbol_info::SymbolRecord;
