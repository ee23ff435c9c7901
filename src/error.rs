use thiserror::Error as ThisError;

/// Errors that can occur in the logging library
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// A numeric severity outside the CRIT..DEBUG range.
    #[error("Invalid severity level: {0}")]
    InvalidSeverity(i32),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
