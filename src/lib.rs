//! # Sevlog
//!
//! A severity-filtered logger writing to the console or to a rotating set of
//! log files.
//!
//! ## Features
//!
//! - Six severity levels, CRIT to DEBUG, with an inclusive threshold
//! - Files named `<stem>_<YYYYMMDD>_<HHMMSS>.log`, rolled over by size
//! - Oldest files deleted once a count limit is exceeded
//! - Optional in-memory line buffering with FIFO draining
//! - Forwarding of `tracing` events into a logger
//!
//! ## Example
//!
//! ```rust
//! use sevlog::{LogConfig, Logger, Severity};
//!
//! let logger = Logger::new(LogConfig::new().with_severity(Severity::Info))?;
//! logger.log(Severity::High, "This is a high-importance message");
//! logger.log(Severity::Debug, "This one is filtered out");
//! # Ok::<(), sevlog::Error>(())
//! ```

pub mod buffer;
pub mod builder;
pub mod clock;
pub mod config;
pub mod error;
pub mod logger;
pub mod naming;
pub mod registry;
pub mod rotation;
pub mod severity;
pub mod tracing_init;
pub mod writer;

pub use buffer::LineBuffer;
pub use builder::LogBuilder;
pub use config::LogConfig;
pub use error::{Error, Result};
pub use logger::{Logger, SessionMode};
pub use naming::FileNameSequencer;
pub use rotation::{Enforcement, RotationPolicy};
pub use severity::Severity;
pub use tracing_init::{SeverityLayer, init_tracing};
pub use writer::LogSink;

/// Start configuring a logger.
pub fn builder() -> LogBuilder {
    LogBuilder::new()
}
