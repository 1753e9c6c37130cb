// Sun Oct 18 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("No module host installed")]
    NotInstalled,
    #[error("Module enumeration failed: {0}")]
    EnumerationFailed(String),
    #[error("Module not found: {0}")]
    ModuleNotFound(String),
}
