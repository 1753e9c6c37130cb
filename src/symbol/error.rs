// Sun Oct 18 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("Module unreadable: {module}: {reason}")]
    ModuleUnreadable { module: String, reason: String },
    #[error("Demangling rejected: {0}")]
    DemangleRejected(String),
    #[error("Invalid mangling prefix pattern: {0}")]
    InvalidPrefix(#[from] regex::Error),
}
