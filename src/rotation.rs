use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, de};

use crate::naming::FileNameSequencer;
use crate::writer::ActiveFile;

/// Default maximum size of a single log file (2 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Default maximum number of log files kept on disk.
pub const DEFAULT_MAX_FILE_COUNT: usize = 128;

/// Parse a size string with optional units (K/M/G, case-insensitive), defaulting to bytes if no unit.
pub(crate) fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err("empty size string".to_string());
    };

    let (num_str, multiplier) = if last.is_alphabetic() {
        let multiplier = match last.to_ascii_uppercase() {
            'K' => 1024,
            'M' => 1024 * 1024,
            'G' => 1024 * 1024 * 1024,
            unit => return Err(format!("invalid unit: {}, supported: K/M/G", unit)),
        };
        (&s[..s.len() - last.len_utf8()], multiplier)
    } else {
        (s, 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Deserialize a byte size given as a number of bytes or a string with units.
pub(crate) fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    /// Size value that can be a number or string with units.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeValue {
        Number(u64),
        String(String),
    }

    match SizeValue::deserialize(deserializer)? {
        SizeValue::Number(n) => Ok(n),
        SizeValue::String(s) => parse_size(&s).map_err(de::Error::custom),
    }
}

/// What a rotation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enforcement {
    /// The file opened by a rollover, if one happened.
    pub rolled_over: Option<PathBuf>,
    /// Files evicted to honour the count limit, oldest first.
    pub evicted: Vec<PathBuf>,
}

impl Enforcement {
    pub fn is_empty(&self) -> bool {
        self.rolled_over.is_none() && self.evicted.is_empty()
    }

    pub(crate) fn merge(&mut self, other: Enforcement) {
        if other.rolled_over.is_some() {
            self.rolled_over = other.rolled_over;
        }
        self.evicted.extend(other.evicted);
    }
}

/// Size and count limits over the files of one base path.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    max_file_size: u64,
    max_file_count: usize,
    sequencer: FileNameSequencer,
}

impl RotationPolicy {
    /// Create a policy over the files tracked by `sequencer`.
    ///
    /// Limits below 1 are raised to 1.
    pub fn new(sequencer: FileNameSequencer, max_file_size: u64, max_file_count: usize) -> Self {
        Self {
            max_file_size: max_file_size.max(1),
            max_file_count: max_file_count.max(1),
            sequencer,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn max_file_count(&self) -> usize {
        self.max_file_count
    }

    pub fn set_max_file_size(&mut self, size: u64) {
        self.max_file_size = size.max(1);
    }

    pub fn set_max_file_count(&mut self, count: usize) {
        self.max_file_count = count.max(1);
    }

    /// Known files, oldest first.
    pub fn known_files(&self) -> Vec<PathBuf> {
        self.sequencer.files().iter().cloned().collect()
    }

    /// The file a session should start in: the newest known file, or a newly
    /// generated one when none exist yet.
    pub fn starting_file(&mut self) -> PathBuf {
        match self.sequencer.latest() {
            Some(latest) => latest.to_path_buf(),
            None => self.sequencer.generate(),
        }
    }

    /// Roll over before a write of `incoming` bytes that would push a
    /// non-empty active file past the size limit.
    pub fn prepare(&mut self, active: &mut Option<ActiveFile>, incoming: u64) -> Enforcement {
        let mut report = Enforcement::default();
        let Some(current) = active.as_ref() else {
            return report;
        };

        let size = current.size();
        if size > 0 && size.saturating_add(incoming) > self.max_file_size {
            report.rolled_over = self.roll_over(active);
            report.evicted = self.evict();
        }
        report
    }

    /// Enforce both limits after a write.
    ///
    /// A file at or over the size limit is closed and replaced by a newly
    /// named one; then the oldest files are deleted until the count limit
    /// holds. Deletion failures are ignored and the file is forgotten anyway.
    pub fn enforce(&mut self, active: &mut Option<ActiveFile>) -> Enforcement {
        let mut report = Enforcement::default();

        if active
            .as_ref()
            .is_some_and(|current| current.size() >= self.max_file_size)
        {
            report.rolled_over = self.roll_over(active);
        }

        report.evicted = self.evict();
        report
    }

    fn roll_over(&mut self, active: &mut Option<ActiveFile>) -> Option<PathBuf> {
        if let Some(mut previous) = active.take() {
            let _ = previous.file.flush();
        }

        let path = self.sequencer.generate();
        match ActiveFile::open(&path, true) {
            Ok(next) => {
                tracing::debug!("rolled over to {}", path.display());
                *active = Some(next);
                Some(path)
            }
            Err(e) => {
                tracing::warn!(
                    "unable to open log file {}: {}; file output disabled",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    fn evict(&mut self) -> Vec<PathBuf> {
        let mut evicted = Vec::new();
        while self.sequencer.len() > self.max_file_count {
            let Some(oldest) = self.sequencer.pop_oldest() else {
                break;
            };
            remove_best_effort(&oldest);
            evicted.push(oldest);
        }
        evicted
    }
}

fn remove_best_effort(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::debug!("could not delete old log file {}: {}", path.display(), e);
    }
}
