// Sun Oct 18 2026 - Alex

pub mod config;
pub mod host;
pub mod memory;
pub mod metadata;
pub mod registry;
pub mod runtime;
pub mod symbol;
pub mod types;
pub mod utils;

pub use config::Config;
pub use host::{ImageHost, LoadedModule, ModuleHost};
pub use registry::{BuildReport, ModuleSummary, Registry, SwiftModule};
pub use runtime::{Runtime, RuntimeError};
pub use symbol::{Demangler, SwiftDemangler, SymbolRecord};
pub use types::{Class, Conformance, Enum, Protocol, Struct, Type, TypeKind};
