//! The public logging surface.
//!
//! A [`Logger`] owns one session: its threshold, its sink (console and/or the
//! active rotated file), and its line buffer. Every operation runs under a
//! single mutex, so a `Logger` can be shared between threads through an
//! `Arc`. Slow file-system calls block other callers for their duration.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::buffer::LineBuffer;
use crate::naming::FileNameSequencer;
use crate::rotation::RotationPolicy;
use crate::writer::LogSink;
use crate::{LogConfig, Result, Severity, clock};

const SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

/// Name reported for a console-only session.
pub const STDOUT_NAME: &str = "<STDOUT>";

/// Where a session sends its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Console output only.
    ConsoleOnly,
    /// Rotated files, optionally mirrored to the console.
    FileBacked,
    /// The session has ended; further calls are ignored.
    Closed,
}

struct Session {
    mode: SessionMode,
    threshold: Severity,
    sink: LogSink,
    buffer: LineBuffer,
    buffering: bool,
    buffer_capacity: usize,
    banner: bool,
    /// Limits reported while no rotation policy is attached.
    fallback_limits: (u64, usize),
}

impl Session {
    fn is_closed(&self) -> bool {
        self.mode == SessionMode::Closed
    }

    /// Queue or write one complete line.
    fn emit(&mut self, line: String) {
        if self.is_closed() {
            return;
        }
        if self.buffering {
            self.buffer.push(line);
            if self.buffer_capacity > 0 && self.buffer.len() >= self.buffer_capacity {
                self.drain();
            }
        } else if let Err(e) = self.sink.write_text(&line) {
            tracing::debug!("log write failed: {}", e);
        }
    }

    fn drain(&mut self) {
        if let Err(e) = self.buffer.drain_all(&mut self.sink) {
            tracing::debug!("draining buffered log lines failed: {}", e);
        }
    }

    fn name(&self) -> String {
        match self.mode {
            SessionMode::ConsoleOnly => STDOUT_NAME.to_string(),
            _ => self
                .sink
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    fn write_start_banner(&mut self) {
        let banner = format!(
            "{sep}\nSTART: {ts}\n filename = {name}\n severity = {sev}\n{sep}\n",
            sep = SEPARATOR,
            ts = clock::full_timestamp(true),
            name = self.name(),
            sev = self.threshold.code(),
        );
        if let Err(e) = self.sink.write_text(&banner) {
            tracing::debug!("log write failed: {}", e);
        }
    }

    fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        if self.banner {
            self.emit(format!(
                "{sep}\nFINISH: {ts}\n{sep}\n",
                sep = SEPARATOR,
                ts = clock::full_timestamp(true),
            ));
        }
        self.drain();
        let _ = self.sink.flush_all();
        self.sink.close();
        self.mode = SessionMode::Closed;
    }
}

/// A severity-filtered logger writing to the console or to rotated files.
pub struct Logger {
    session: Mutex<Session>,
}

impl Logger {
    /// Start a session described by `config`, with console output on stdout.
    ///
    /// Fails only for unusable limits. A file that cannot be opened is
    /// reported as a diagnostic and leaves the session without file output.
    pub fn new(config: LogConfig) -> Result<Self> {
        Self::start(config, Box::new(std::io::stdout()))
    }

    /// Like [`Logger::new`], but console output goes to `console`.
    pub fn with_console_writer(config: LogConfig, console: Box<dyn Write + Send>) -> Result<Self> {
        Self::start(config, console)
    }

    /// Console-only logger at `severity`.
    pub fn console(severity: Severity) -> Result<Self> {
        Self::new(LogConfig::new().with_severity(severity))
    }

    /// File-backed logger over `base_path` at `severity`.
    pub fn file<P: Into<PathBuf>>(base_path: P, severity: Severity) -> Result<Self> {
        Self::new(
            LogConfig::new()
                .with_base_path(base_path)
                .with_severity(severity),
        )
    }

    fn start(config: LogConfig, console: Box<dyn Write + Send>) -> Result<Self> {
        config.validate()?;

        let (mode, sink) = match config.base_path.as_deref() {
            None => (SessionMode::ConsoleOnly, LogSink::new(Some(console))),
            Some(base) => {
                let console = config.console.then_some(console);
                (SessionMode::FileBacked, open_file_sink(base, &config, console))
            }
        };

        let mut session = Session {
            mode,
            threshold: config.severity,
            sink,
            buffer: LineBuffer::new(),
            buffering: config.effective_buffering(),
            buffer_capacity: config.buffer_capacity,
            banner: config.banner,
            fallback_limits: (config.max_file_size, config.max_file_count),
        };

        tracing::info!(
            "logging at level {} to {}",
            session.threshold.code(),
            session.name()
        );
        if session.banner {
            session.write_start_banner();
        }

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `message` at `severity` if it passes the current threshold.
    pub fn log(&self, severity: Severity, message: impl AsRef<str>) {
        let mut session = self.lock();
        if session.is_closed() || !severity.passes(session.threshold) {
            return;
        }
        let line = format!(
            "{} [{}] {}\n",
            clock::full_timestamp(true),
            severity.code(),
            message.as_ref()
        );
        session.emit(line);
    }

    /// Change the threshold, recording the change in the log.
    pub fn set_severity(&self, severity: Severity) {
        let mut session = self.lock();
        session.threshold = severity;
        let line = format!(
            "{} Set severity level to {}\n",
            clock::full_timestamp(true),
            severity.code()
        );
        session.emit(line);
    }

    /// Change the threshold from a raw level number.
    ///
    /// A level outside the CRIT..DEBUG range is rejected, noted in the log,
    /// and leaves the threshold unchanged.
    pub fn set_severity_level(&self, level: i32) -> Result<()> {
        match Severity::try_from(level) {
            Ok(severity) => {
                self.set_severity(severity);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("rejected severity level {}", level);
                let line = format!(
                    "{} ERROR: Invalid verbosity specified, {}\n",
                    clock::full_timestamp(true),
                    level
                );
                self.lock().emit(line);
                Err(e)
            }
        }
    }

    pub fn severity(&self) -> Severity {
        self.lock().threshold
    }

    /// Whether a message at `severity` would be written.
    pub fn is_displayed(&self, severity: Severity) -> bool {
        severity.passes(self.lock().threshold)
    }

    /// Turn buffering on or off.
    ///
    /// Turning it off writes out everything pending; turning it on starts
    /// from an empty buffer.
    pub fn set_buffering(&self, on: bool) {
        let mut session = self.lock();
        if session.buffering && !on {
            session.drain();
        } else if !session.buffering && on {
            session.buffer.clear();
        }
        session.buffering = on;
    }

    pub fn is_buffering(&self) -> bool {
        self.lock().buffering
    }

    /// Number of lines waiting in the buffer.
    pub fn buffered_lines(&self) -> usize {
        self.lock().buffer.len()
    }

    /// Write all buffered lines to the sink and flush it.
    pub fn drain_buffer(&self) {
        self.lock().drain();
    }

    /// Flush the console and the active file; buffered lines stay buffered.
    pub fn flush(&self) {
        if let Err(e) = self.lock().sink.flush_all() {
            tracing::debug!("log flush failed: {}", e);
        }
    }

    /// End the session: write the FINISH banner, drain the buffer, and
    /// release the file. Later calls do nothing.
    pub fn close(&self) {
        self.lock().close();
    }

    pub fn mode(&self) -> SessionMode {
        self.lock().mode
    }

    /// Active file path, or `<STDOUT>` for a console-only session.
    pub fn name(&self) -> String {
        self.lock().name()
    }

    pub fn active_file(&self) -> Option<PathBuf> {
        self.lock().sink.path().map(Path::to_path_buf)
    }

    /// Rotated files known to this session, oldest first.
    pub fn known_files(&self) -> Vec<PathBuf> {
        self.lock()
            .sink
            .rotation()
            .map(RotationPolicy::known_files)
            .unwrap_or_default()
    }

    /// Length of the active file on disk, 0 when no file is open.
    pub fn size(&self) -> u64 {
        self.lock().sink.size()
    }

    pub fn max_file_size(&self) -> u64 {
        let session = self.lock();
        session
            .sink
            .rotation()
            .map(RotationPolicy::max_file_size)
            .unwrap_or(session.fallback_limits.0)
    }

    pub fn max_file_count(&self) -> usize {
        let session = self.lock();
        session
            .sink
            .rotation()
            .map(RotationPolicy::max_file_count)
            .unwrap_or(session.fallback_limits.1)
    }

    /// Change the size limit; applies from the next write.
    pub fn set_max_file_size(&self, size: u64) {
        let mut session = self.lock();
        match session.sink.rotation_mut() {
            Some(rotation) => rotation.set_max_file_size(size),
            None => session.fallback_limits.0 = size.max(1),
        }
    }

    /// Change the count limit; applies from the next write.
    pub fn set_max_file_count(&self, count: usize) {
        let mut session = self.lock();
        match session.sink.rotation_mut() {
            Some(rotation) => rotation.set_max_file_count(count),
            None => session.fallback_limits.1 = count.max(1),
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .close();
    }
}

/// Build the sink of a file-backed session: discover existing files, pick
/// the starting file, open it and apply the limits once.
fn open_file_sink(
    base: &Path,
    config: &LogConfig,
    console: Option<Box<dyn Write + Send>>,
) -> LogSink {
    let sink = LogSink::new(console);

    if let Some(parent) = base.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        tracing::warn!("unable to create log directory {}: {}", parent.display(), e);
    }

    let sequencer = match FileNameSequencer::new(base) {
        Ok(sequencer) => sequencer,
        Err(e) => {
            tracing::warn!("unable to open output file for {:?}: {}", base, e);
            return sink;
        }
    };

    let mut policy = RotationPolicy::new(sequencer, config.max_file_size, config.max_file_count);
    let start = policy.starting_file();
    let mut sink = sink.with_rotation(policy);

    match sink.open(&start, true) {
        Ok(()) => {
            let report = sink.enforce();
            if !report.evicted.is_empty() {
                tracing::debug!("evicted {} old log files", report.evicted.len());
            }
        }
        Err(e) => tracing::warn!("unable to open output file {}: {}", start.display(), e),
    }
    sink
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn console_logger(config: LogConfig) -> (Logger, Captured) {
        let out = Captured::default();
        let logger = Logger::with_console_writer(config, Box::new(out.clone())).unwrap();
        (logger, out)
    }

    #[test]
    fn test_console_session_banner() {
        let (logger, out) = console_logger(LogConfig::new());
        assert_eq!(logger.mode(), SessionMode::ConsoleOnly);
        assert_eq!(logger.name(), STDOUT_NAME);

        let text = out.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], SEPARATOR);
        assert!(lines[1].starts_with("START: "));
        assert_eq!(lines[2], " filename = <STDOUT>");
        assert_eq!(lines[3], " severity = MED__");
        assert_eq!(lines[4], SEPARATOR);
    }

    #[test]
    fn test_line_format() {
        let (logger, out) = console_logger(LogConfig::new().with_banner(false));
        logger.log(Severity::High, "disk almost full");

        let text = out.text();
        let line = text.lines().next().unwrap();
        // "YYYY-MM-DD HH:MM:SS.mmm [HIGH_] disk almost full"
        assert_eq!(&line[23..], " [HIGH_] disk almost full");
        assert_eq!(&line[4..5], "-");
        assert_eq!(&line[19..20], ".");
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let (logger, out) = console_logger(
            LogConfig::new()
                .with_banner(false)
                .with_severity(Severity::Med),
        );
        logger.log(Severity::Low, "low");
        logger.log(Severity::High, "high");
        logger.log(Severity::Med, "med");

        let text = out.text();
        assert!(!text.contains("[LOW__]"));
        assert!(text.contains("[HIGH_] high"));
        assert!(text.contains("[MED__] med"));
    }

    #[test]
    fn test_set_severity_level_rejects_out_of_range() {
        let (logger, out) = console_logger(LogConfig::new().with_banner(false));

        assert!(logger.set_severity_level(9).is_err());
        assert_eq!(logger.severity(), Severity::Med);
        assert!(out.text().contains("ERROR: Invalid verbosity specified, 9"));

        assert!(logger.set_severity_level(6).is_ok());
        assert_eq!(logger.severity(), Severity::Info);
        assert!(out.text().contains("Set severity level to INFO_"));
        assert!(logger.is_displayed(Severity::Info));
        assert!(!logger.is_displayed(Severity::Debug));
    }

    #[test]
    fn test_buffered_lines_wait_for_drain() {
        let (logger, out) = console_logger(
            LogConfig::new()
                .with_banner(false)
                .with_buffering(true),
        );
        logger.log(Severity::Crit, "L1");
        logger.log(Severity::Crit, "L2");
        logger.log(Severity::Crit, "L3");
        assert_eq!(out.text(), "");
        assert_eq!(logger.buffered_lines(), 3);

        logger.drain_buffer();
        let text = out.text();
        let l1 = text.find("L1").unwrap();
        let l2 = text.find("L2").unwrap();
        let l3 = text.find("L3").unwrap();
        assert!(l1 < l2 && l2 < l3);
        assert_eq!(logger.buffered_lines(), 0);
    }

    #[test]
    fn test_suppressed_messages_are_not_buffered() {
        let (logger, _out) = console_logger(
            LogConfig::new()
                .with_banner(false)
                .with_buffering(true),
        );
        logger.log(Severity::Debug, "hidden");
        assert_eq!(logger.buffered_lines(), 0);
    }

    #[test]
    fn test_disabling_buffering_drains() {
        let (logger, out) = console_logger(
            LogConfig::new()
                .with_banner(false)
                .with_buffering(true),
        );
        logger.log(Severity::Crit, "pending");
        logger.set_buffering(false);
        assert!(!logger.is_buffering());
        assert!(out.text().contains("pending"));

        logger.log(Severity::Crit, "direct");
        assert!(out.text().contains("direct"));
    }

    #[test]
    fn test_buffer_capacity_triggers_drain() {
        let (logger, out) = console_logger(
            LogConfig::new()
                .with_banner(false)
                .with_buffering(true)
                .with_buffer_capacity(2),
        );
        logger.log(Severity::Crit, "one");
        assert_eq!(out.text(), "");
        logger.log(Severity::Crit, "two");
        assert!(out.text().contains("one"));
        assert!(out.text().contains("two"));
        assert_eq!(logger.buffered_lines(), 0);
    }

    #[test]
    fn test_flush_does_not_drain() {
        let (logger, out) = console_logger(
            LogConfig::new()
                .with_banner(false)
                .with_buffering(true),
        );
        logger.log(Severity::Crit, "held");
        logger.flush();
        assert_eq!(out.text(), "");
        assert_eq!(logger.buffered_lines(), 1);
    }

    #[test]
    fn test_close_drains_and_is_idempotent() {
        let (logger, out) = console_logger(LogConfig::new().with_buffering(true));
        logger.log(Severity::Crit, "last words");
        logger.close();
        logger.close();

        let text = out.text();
        assert!(text.contains("last words"));
        assert_eq!(text.matches("FINISH: ").count(), 1);
        assert!(text.find("last words").unwrap() < text.find("FINISH: ").unwrap());
        assert_eq!(logger.mode(), SessionMode::Closed);

        logger.log(Severity::Crit, "after close");
        assert!(!out.text().contains("after close"));
    }

    #[test]
    fn test_drop_closes_session() {
        let out = Captured::default();
        {
            let logger =
                Logger::with_console_writer(LogConfig::new(), Box::new(out.clone())).unwrap();
            logger.log(Severity::Crit, "bye");
        }
        assert!(out.text().contains("FINISH: "));
    }

    #[test]
    fn test_invalid_limits_are_rejected() {
        assert!(Logger::new(LogConfig::new().with_max_file_count(0)).is_err());
    }

    #[test]
    fn test_file_session_buffers_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_console_writer(
            LogConfig::new()
                .with_base_path(dir.path().join("app"))
                .with_banner(false),
            Box::new(io::sink()),
        )
        .unwrap();
        assert_eq!(logger.mode(), SessionMode::FileBacked);
        assert!(logger.is_buffering());

        let active = logger.active_file().unwrap();
        logger.log(Severity::Crit, "buffered");
        assert_eq!(std::fs::read_to_string(&active).unwrap(), "");

        logger.drain_buffer();
        assert!(std::fs::read_to_string(&active).unwrap().contains("buffered"));
    }

    #[test]
    fn test_file_session_without_console_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, out) = console_logger(
            LogConfig::new()
                .with_base_path(dir.path().join("app"))
                .with_buffering(false),
        );
        logger.log(Severity::Crit, "file only");
        assert_eq!(out.text(), "");

        let content = std::fs::read_to_string(logger.active_file().unwrap()).unwrap();
        assert!(content.contains("START: "));
        assert!(content.contains("file only"));
    }

    #[test]
    fn test_file_session_with_console_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, out) = console_logger(
            LogConfig::new()
                .with_base_path(dir.path().join("app"))
                .with_console(true)
                .with_buffering(false)
                .with_banner(false),
        );
        logger.log(Severity::Crit, "mirrored");
        assert!(out.text().contains("mirrored"));
        let content = std::fs::read_to_string(logger.active_file().unwrap()).unwrap();
        assert!(content.contains("mirrored"));
    }

    #[test]
    fn test_empty_base_path_degrades_to_console() {
        let (logger, out) = console_logger(
            LogConfig::new()
                .with_base_path("")
                .with_console(true)
                .with_buffering(false)
                .with_banner(false),
        );
        assert!(logger.active_file().is_none());
        assert!(logger.known_files().is_empty());

        logger.log(Severity::Crit, "still visible");
        assert!(out.text().contains("still visible"));
    }

    #[test]
    fn test_limit_setters() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_console_writer(
            LogConfig::new().with_base_path(dir.path().join("app")),
            Box::new(io::sink()),
        )
        .unwrap();
        assert_eq!(logger.max_file_size(), 2 * 1024 * 1024);
        assert_eq!(logger.max_file_count(), 128);

        logger.set_max_file_size(64);
        logger.set_max_file_count(3);
        assert_eq!(logger.max_file_size(), 64);
        assert_eq!(logger.max_file_count(), 3);

        logger.set_max_file_size(0);
        assert_eq!(logger.max_file_size(), 1);
    }

    #[test]
    fn test_limit_setters_apply_to_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_console_writer(
            LogConfig::new()
                .with_base_path(dir.path().join("app"))
                .with_buffering(false)
                .with_banner(false),
            Box::new(io::sink()),
        )
        .unwrap();
        let first = logger.active_file().unwrap();

        logger.set_max_file_size(10);
        logger.log(Severity::Crit, "longer than ten bytes");
        assert_ne!(logger.active_file().unwrap(), first);
        assert_eq!(logger.known_files().len(), 2);

        logger.set_max_file_count(1);
        logger.log(Severity::Crit, "again longer than ten bytes");
        assert_eq!(logger.known_files().len(), 1);
        assert!(!first.exists());
    }

    #[test]
    fn test_size_tracks_active_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_console_writer(
            LogConfig::new()
                .with_base_path(dir.path().join("app"))
                .with_buffering(false)
                .with_banner(false),
            Box::new(io::sink()),
        )
        .unwrap();
        assert_eq!(logger.size(), 0);

        logger.log(Severity::Crit, "abc");
        let on_disk = std::fs::metadata(logger.active_file().unwrap()).unwrap().len();
        assert_eq!(logger.size(), on_disk);
        assert!(on_disk > 0);
    }

    #[test]
    fn test_console_session_size_is_zero() {
        let (logger, _out) = console_logger(LogConfig::new().with_banner(false));
        logger.log(Severity::Crit, "not in a file");
        assert_eq!(logger.size(), 0);
    }
}
