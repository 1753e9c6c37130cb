// Sun Oct 18 2026 - Alex

use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Installs the colored stderr logger. Only the first logger installed in a
/// process takes effect.
pub fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    init_with_level(level);
}

pub fn init_with_level(level: LevelFilter) {
    if log::set_boxed_logger(Box::new(ColoredLogger::new(level))).is_ok() {
        log::set_max_level(level);
    }
}

pub fn init_with_file(level: LevelFilter, path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    if log::set_boxed_logger(Box::new(FileLogger::new(level, file))).is_ok() {
        log::set_max_level(level);
    }
    Ok(())
}

/// `RUST_LOG`-driven logging through env_logger.
pub fn init_from_env() {
    let _ = env_logger::try_init();
}

pub fn level_from_str(s: &str) -> LevelFilter {
    match s.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Warn,
    }
}

struct ColoredLogger {
    level: LevelFilter,
}

impl ColoredLogger {
    fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

fn format_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red().bold(),
        Level::Warn => "WARN ".yellow().bold(),
        Level::Info => "INFO ".green().bold(),
        Level::Debug => "DEBUG".blue().bold(),
        Level::Trace => "TRACE".magenta().bold(),
    }
}

impl Log for ColoredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let target = format!("[{}]", record.target());
            eprintln!("{} {} {}", format_level(record.level()), target.dimmed(), record.args());
        }
    }

    fn flush(&self) {}
}

struct FileLogger {
    level: LevelFilter,
    file: Mutex<File>,
}

impl FileLogger {
    fn new(level: LevelFilter, file: File) -> Self {
        Self {
            level,
            file: Mutex::new(file),
        }
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format!(
                "{} {:5} [{}] {}\n",
                timestamp(),
                record.level(),
                record.target(),
                record.args()
            );
            if let Ok(mut file) = self.file.lock() {
                let _ = file.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

fn timestamp() -> String {
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}

/// Logs how long a scope took, at debug level, when dropped.
pub struct ScopedTimer {
    name: String,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(name: &str) -> Self {
        log::debug!("[TIMER] {} started", name);
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        log::debug!("[TIMER] {} took {:.2}ms", self.name, self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str() {
        assert_eq!(level_from_str("TRACE"), LevelFilter::Trace);
        assert_eq!(level_from_str("warning"), LevelFilter::Warn);
        assert_eq!(level_from_str("off"), LevelFilter::Off);
        assert_eq!(level_from_str("loud"), LevelFilter::Warn);
    }

    #[test]
    fn test_file_logger_filters_by_level() {
        let path = std::env::temp_dir().join(format!("swift-introspect-log-{}.txt", std::process::id()));
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(&path).unwrap();
        let logger = FileLogger::new(LevelFilter::Info, file);

        logger.log(&Record::builder().level(Level::Info).target("registry").args(format_args!("built")).build());
        logger.log(&Record::builder().level(Level::Debug).target("registry").args(format_args!("hidden")).build());
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(contents.contains("INFO  [registry] built"));
        assert!(!contents.contains("hidden"));
    }
}
