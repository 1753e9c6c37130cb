// Sun Oct 18 2026 - Alex

pub mod error;

pub use error::HostError;

use crate::memory::{Address, BinarySection, BinarySymbol, MappedImage, MemoryError, MemoryReader};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One loaded binary image as seen through the host environment.
pub trait LoadedModule: Send + Sync {
    fn name(&self) -> &str;
    fn path(&self) -> &Path;
    fn base(&self) -> Address;
    fn reader(&self) -> &dyn MemoryReader;
    fn sections(&self) -> Result<Vec<BinarySection>, MemoryError>;
    fn exported_symbols(&self) -> Result<Vec<BinarySymbol>, MemoryError>;

    /// Turns the raw contents of a pointer-sized slot into an address in this
    /// module's address space.
    fn resolve_pointer(&self, raw: u64) -> Option<Address> {
        (raw != 0).then(|| Address::new(raw))
    }

    /// Name of the symbol the loader binds into the pointer slot at `slot`,
    /// for slots `resolve_pointer` cannot follow. `raw` is the slot content.
    fn bound_symbol(&self, _slot: Address, _raw: u64) -> Option<String> {
        None
    }
}

pub trait ModuleHost: Send + Sync {
    fn current_modules(&self) -> Result<Vec<Arc<dyn LoadedModule>>, HostError>;

    fn find_module(&self, name: &str) -> Result<Arc<dyn LoadedModule>, HostError> {
        self.current_modules()?
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| HostError::ModuleNotFound(name.to_string()))
    }
}

/// A fixed set of images, reported in insertion order.
#[derive(Default)]
pub struct ImageHost {
    modules: Vec<Arc<dyn LoadedModule>>,
}

impl ImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module: Arc<dyn LoadedModule>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn add_module(&mut self, module: Arc<dyn LoadedModule>) {
        self.modules.push(module);
    }

    /// Maps every path that can be opened. Paths that fail are logged and
    /// left out; header problems surface later as unreadable modules.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut host = Self::new();
        for path in paths {
            match MappedImage::load(path) {
                Ok(image) => host.add_module(Arc::new(image)),
                Err(e) => log::warn!("Skipping {}: {}", path.as_ref().display(), e),
            }
        }
        host
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.modules.iter().map(|m| m.path().to_path_buf()).collect()
    }
}

impl ModuleHost for ImageHost {
    fn current_modules(&self) -> Result<Vec<Arc<dyn LoadedModule>>, HostError> {
        Ok(self.modules.clone())
    }
}

static INSTALLED_HOST: Lazy<RwLock<Option<Arc<dyn ModuleHost>>>> = Lazy::new(|| RwLock::new(None));

pub fn install(host: Arc<dyn ModuleHost>) {
    *INSTALLED_HOST.write() = Some(host);
}

pub fn uninstall() -> Option<Arc<dyn ModuleHost>> {
    INSTALLED_HOST.write().take()
}

pub fn current() -> Result<Arc<dyn ModuleHost>, HostError> {
    INSTALLED_HOST.read().clone().ok_or(HostError::NotInstalled)
}

pub fn is_installed() -> bool {
    INSTALLED_HOST.read().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ByteImage;

    #[test]
    fn test_image_host_order() {
        let host = ImageHost::new()
            .with_module(Arc::new(ByteImage::new("first", Address::new(0x1000), vec![0; 4])))
            .with_module(Arc::new(ByteImage::new("second", Address::new(0x2000), vec![0; 4])));
        let names: Vec<String> = host
            .current_modules()
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(host.find_module("second").unwrap().base(), Address::new(0x2000));
        assert!(matches!(host.find_module("third"), Err(HostError::ModuleNotFound(_))));
    }

    #[test]
    fn test_from_paths_skips_missing_files() {
        let host = ImageHost::from_paths(&["/nonexistent/swift-introspect/image"]);
        assert!(host.is_empty());
    }
}
