use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::rotation::{DEFAULT_MAX_FILE_COUNT, DEFAULT_MAX_FILE_SIZE, deserialize_size};
use crate::{Error, Result, Severity};

/// Configuration for logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Base path of the rotated files (`<dir>/<stem>`); console only when absent
    #[serde(default)]
    pub base_path: Option<PathBuf>,
    /// Least urgent severity still written
    #[serde(default)]
    pub severity: Severity,
    /// Maximum size of one log file in bytes.
    /// Can be a number of bytes or a string with units (K/M/G, case-insensitive).
    #[serde(
        default = "default_max_file_size",
        deserialize_with = "deserialize_size"
    )]
    pub max_file_size: u64,
    /// Maximum number of log files kept on disk
    #[serde(default = "default_max_file_count")]
    pub max_file_count: usize,
    /// Mirror output to the console
    #[serde(default)]
    pub console: bool,
    /// Buffer lines in memory; defaults to on when writing to files
    #[serde(default)]
    pub buffering: Option<bool>,
    /// Pending lines that trigger an automatic drain (0 = never)
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Write START/FINISH banners
    #[serde(default = "default_banner")]
    pub banner: bool,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self {
            base_path: None,
            severity: Severity::default(),
            max_file_size: default_max_file_size(),
            max_file_count: default_max_file_count(),
            console: false,
            buffering: None,
            buffer_capacity: default_buffer_capacity(),
            banner: default_banner(),
        }
    }

    /// Write to rotated files derived from `base_path`
    pub fn with_base_path<P: Into<PathBuf>>(mut self, base_path: P) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Set severity threshold
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set maximum file size in bytes
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Set maximum number of files
    pub fn with_max_file_count(mut self, max_file_count: usize) -> Self {
        self.max_file_count = max_file_count;
        self
    }

    /// Enable console output
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Enable or disable buffering
    pub fn with_buffering(mut self, buffering: bool) -> Self {
        self.buffering = Some(buffering);
        self
    }

    /// Set automatic drain threshold
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Enable or disable session banners
    pub fn with_banner(mut self, banner: bool) -> Self {
        self.banner = banner;
        self
    }

    /// Whether output goes to rotated files.
    pub fn is_file_backed(&self) -> bool {
        self.base_path.is_some()
    }

    /// Buffering in effect: the explicit setting, else on for file output.
    pub fn effective_buffering(&self) -> bool {
        self.buffering.unwrap_or_else(|| self.is_file_backed())
    }

    /// Check the limits are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(Error::Config("max_file_size must be positive".to_string()));
        }
        if self.max_file_count == 0 {
            return Err(Error::Config("max_file_count must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_file_count() -> usize {
    DEFAULT_MAX_FILE_COUNT
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_banner() -> bool {
    true
}
