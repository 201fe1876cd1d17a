//! Console and file logging for transcription runs.
//!
//! One combined logger per process: a terminal logger and, optionally, a
//! file logger writing to `log_<date>_<time>.txt`.
use chrono::Local;
use log::{LevelFilter, SetLoggerError};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("cannot create log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("a logger is already installed")]
    AlreadySet(#[from] SetLoggerError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggerSettings {
    pub level: LevelFilter,
    pub log_to_console: bool,
    pub log_to_file: Option<PathBuf>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        LoggerSettings {
            level: LevelFilter::Info,
            log_to_console: true,
            log_to_file: None,
        }
    }
}

/// `log_%Y-%m-%d_%H-%M-%S.txt`
pub fn timestamped_log_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("log_{}.txt", date_and_time)
}

impl LoggerSettings {
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Also write to a timestamped file inside `dir`.
    pub fn with_file_in<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.log_to_file = Some(dir.as_ref().join(timestamped_log_name()));
        self
    }

    fn loggers(&self) -> Result<Vec<Box<dyn SharedLogger>>, LoggerError> {
        let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
        if self.log_to_console {
            loggers.push(TermLogger::new(
                self.level,
                Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            ));
        }
        if let Some(ref filename) = self.log_to_file {
            let file = File::create(filename)?;
            loggers.push(WriteLogger::new(self.level, Config::default(), file));
        }
        Ok(loggers)
    }

    /// Installs the logger. Fails if the log file cannot be created or a
    /// logger is already installed in this process.
    pub fn init(&self) -> Result<(), LoggerError> {
        let loggers = self.loggers()?;
        if loggers.is_empty() {
            return Ok(());
        }
        CombinedLogger::init(loggers)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_name_format() {
        let name = timestamped_log_name();
        assert!(name.starts_with("log_"));
        assert!(name.ends_with(".txt"));
        // log_YYYY-mm-dd_HH-MM-SS.txt
        assert_eq!(name.len(), "log_".len() + 19 + ".txt".len());
    }

    #[test]
    fn test_file_logger_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LoggerSettings::default().with_file_in(dir.path());
        let loggers = settings.loggers().unwrap();
        assert_eq!(loggers.len(), 2);
        assert!(settings.log_to_file.as_ref().unwrap().exists());
    }

    #[test]
    fn test_unwritable_log_file() {
        let settings = LoggerSettings {
            log_to_file: Some(PathBuf::from("no/such/dir/log.txt")),
            ..Default::default()
        };
        assert!(matches!(settings.loggers(), Err(LoggerError::Io(_))));
    }

    #[test]
    fn test_single_logger_per_process() {
        let settings = LoggerSettings::default().with_level(LevelFilter::Warn);
        let _ = settings.init();
        assert!(matches!(settings.init(), Err(LoggerError::AlreadySet(_))));
    }
}
