// Sun Oct 18 2026 - Alex

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedModule {
    pub name: String,
    pub reason: String,
}

/// What a registry build had to leave out. None of it is fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub modules_scanned: usize,
    pub skipped_modules: Vec<SkippedModule>,
    pub malformed_descriptors: usize,
    pub unresolved_conformances: usize,
    pub duplicate_conformances: usize,
}

impl BuildReport {
    pub fn skip_module(&mut self, name: impl Into<String>, reason: impl ToString) {
        self.skipped_modules.push(SkippedModule {
            name: name.into(),
            reason: reason.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.skipped_modules.is_empty() && self.malformed_descriptors == 0 && self.unresolved_conformances == 0
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} modules scanned, {} skipped, {} malformed descriptors, {} unresolved conformances",
            self.modules_scanned,
            self.skipped_modules.len(),
            self.malformed_descriptors,
            self.unresolved_conformances
        )
    }
}
