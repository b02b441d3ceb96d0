#![deny(missing_docs)]
//! Shared logging utilities for the grabber workspace.
//!
//! This crate provides the `grab_*` logging macros used across the codebase,
//! the run logger used by the binary and a minimal test initializer.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! grab_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! grab_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! grab_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! grab_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! grab_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Where and how verbosely a run logs.
#[derive(Debug, Clone)]
pub struct RunLogSettings {
    /// Log file, truncated at the start of every run. `None` disables it.
    pub file: Option<PathBuf>,
    /// Level written to the log file.
    pub file_level: LevelFilter,
    /// Level echoed to the terminal.
    pub terminal_level: LevelFilter,
}

impl Default for RunLogSettings {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("grabber.log")),
            file_level: LevelFilter::Debug,
            terminal_level: LevelFilter::Warn,
        }
    }
}

/// Install the global logger for a run: a timestamped file log plus a
/// terminal echo. Returns the file path actually opened, if any.
pub fn initialize_run_logging(settings: &RunLogSettings) -> Option<PathBuf> {
    let config = build_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        settings.terminal_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let opened = settings.file.as_deref().and_then(|path| {
        create_file_logger(path, settings.file_level, config).map(|logger| {
            loggers.push(logger);
            path.to_path_buf()
        })
    });

    let _ = CombinedLogger::init(loggers);
    opened
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    // File::create truncates, so every run starts with a fresh log.
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logger_truncates_existing_log() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("run.log");
        std::fs::write(&path, "stale line from a previous run\n").unwrap();

        let logger = create_file_logger(&path, LevelFilter::Info, build_config());
        assert!(logger.is_some());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unwritable_log_path_is_skipped() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("missing").join("run.log");
        assert!(create_file_logger(&path, LevelFilter::Info, build_config()).is_none());
    }
}
