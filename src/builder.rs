//! Builder pattern for initializing logging configuration.
//!
//! This module provides a convenient builder API for configuring a logger and
//! either opening it directly or installing it as the process-wide instance.
//!
//! # Example
//!
//! ```rust,no_run
//! use sevlog::Severity;
//!
//! // Console logging, owned by the caller
//! let logger = sevlog::builder()
//!     .with_severity(Severity::Info)
//!     .open()
//!     .expect("Failed to open logger");
//! logger.log(Severity::Info, "ready");
//!
//! // Rotated files, installed process-wide
//! sevlog::builder()
//!     .with_base_path("/var/log/app/server")
//!     .with_max_file_size(10 * 1024 * 1024)
//!     .with_max_file_count(20)
//!     .with_console(true)
//!     .init()
//!     .expect("Failed to initialize logging");
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::{LogConfig, Logger, Result, Severity, registry};

/// A builder for configuring and initializing logging.
///
/// This provides a fluent interface for setting up logging configuration
/// and starting a logging session in one chain of calls.
#[derive(Debug, Clone)]
pub struct LogBuilder {
    config: LogConfig,
}

impl LogBuilder {
    /// Create a new LogBuilder with default configuration.
    pub fn new() -> Self {
        Self {
            config: LogConfig::new(),
        }
    }

    /// Create a LogBuilder from an existing configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self { config }
    }

    /// Write to rotated files named after `path` (`<dir>/<stem>`).
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_base_path(path);
        self
    }

    /// Set the severity threshold.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.config = self.config.with_severity(severity);
        self
    }

    /// Set the size at which the active file rolls over.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.config = self.config.with_max_file_size(bytes);
        self
    }

    /// Set how many rotated files are kept.
    pub fn with_max_file_count(mut self, count: usize) -> Self {
        self.config = self.config.with_max_file_count(count);
        self
    }

    /// Mirror file output to the console.
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config = self.config.with_console(enabled);
        self
    }

    /// Enable or disable line buffering.
    pub fn with_buffering(mut self, enabled: bool) -> Self {
        self.config = self.config.with_buffering(enabled);
        self
    }

    /// Set how many buffered lines trigger an automatic drain.
    pub fn with_buffer_capacity(mut self, lines: usize) -> Self {
        self.config = self.config.with_buffer_capacity(lines);
        self
    }

    /// Enable or disable the START/FINISH banners.
    pub fn with_banner(mut self, enabled: bool) -> Self {
        self.config = self.config.with_banner(enabled);
        self
    }

    /// Get the current configuration without starting a session.
    pub fn build(self) -> LogConfig {
        self.config
    }

    /// Start a session owned by the caller.
    pub fn open(self) -> Result<Logger> {
        Logger::new(self.config)
    }

    /// Start a session and install it as the process-wide logger.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A process-wide logger is already installed
    /// - Invalid configuration is provided
    pub fn init(self) -> Result<Arc<Logger>> {
        if registry::instance().is_some() {
            return Err(crate::Error::Init(
                "a process-wide logger is already installed".to_string(),
            ));
        }
        registry::install(Logger::new(self.config)?)
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
