// Sun Oct 18 2026 - Alex

use crate::symbol::enumerate::DEFAULT_MANGLED_PREFIXES;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "SWIFT_INTROSPECT_CONFIG";
pub const MODULES_ENV: &str = "SWIFT_INTROSPECT_MODULES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub module_paths: Vec<PathBuf>,
    pub max_context_depth: usize,
    pub max_name_length: usize,
    pub max_trailing_records: u32,
    pub log_level: String,
    /// Appends log lines to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    pub mangled_prefixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module_paths: Vec::new(),
            max_context_depth: 32,
            max_name_length: 1024,
            max_trailing_records: 65536,
            log_level: "warn".to_string(),
            log_file: None,
            mangled_prefixes: DEFAULT_MANGLED_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_paths.push(path.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_max_context_depth(mut self, depth: usize) -> Self {
        self.max_context_depth = depth;
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !ext.eq_ignore_ascii_case("json") {
            return Err(ConfigError::UnsupportedFormat(ext.to_string()));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        if !ext.eq_ignore_ascii_case("json") {
            return Err(ConfigError::UnsupportedFormat(ext.to_string()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Reads the file named by `SWIFT_INTROSPECT_CONFIG` when set, then
    /// appends the paths listed in `SWIFT_INTROSPECT_MODULES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path))?,
            None => Self::default(),
        };
        if let Some(paths) = env::var_os(MODULES_ENV) {
            config
                .module_paths
                .extend(env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_context_depth == 0 {
            return Err(ConfigError::Validation("max_context_depth must be > 0".to_string()));
        }
        if self.max_name_length == 0 {
            return Err(ConfigError::Validation("max_name_length must be > 0".to_string()));
        }
        if self.mangled_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Validation("mangled_prefixes must not contain empty prefixes".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("swift-introspect-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_context_depth, 32);
        assert_eq!(config.max_name_length, 1024);
        assert_eq!(config.max_trailing_records, 65536);
        assert_eq!(config.mangled_prefixes, ["$s", "$S", "$e", "_T0"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let config = Config::new().with_max_context_depth(0);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip.json");
        let config = Config::new().with_module("/usr/lib/libApp.dylib").with_log_level("debug");
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = temp_path("partial.json");
        fs::write(&path, r#"{ "max_context_depth": 8 }"#).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.max_context_depth, 8);
        assert_eq!(loaded.max_name_length, 1024);
        assert_eq!(loaded.log_file, None);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Config::load(temp_path("missing.json")),
            Err(ConfigError::NotFound(_))
        ));

        let path = temp_path("config.toml");
        fs::write(&path, "").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::UnsupportedFormat(_))));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_from_env_appends_modules() {
        let joined = env::join_paths(["/tmp/A.dylib", "/tmp/B.so"]).unwrap();
        env::set_var(MODULES_ENV, &joined);
        let config = Config::from_env().unwrap();
        env::remove_var(MODULES_ENV);

        assert_eq!(
            config.module_paths,
            [PathBuf::from("/tmp/A.dylib"), PathBuf::from("/tmp/B.so")]
        );
    }
}
