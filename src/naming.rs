//! Discovery and generation of rotated log file names.
//!
//! Every file of a session is named `<stem>_<YYYYMMDD>_<HHMMSS>.log` and lives
//! in the directory component of the base path. The fixed-width numeric stamp
//! makes lexical order match creation order.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, PrimitiveDateTime, Time};

use crate::{Error, Result, clock};

/// Length of `_YYYYMMDD_HHMMSS.log`.
const STAMP_SUFFIX_LEN: usize = "_YYYYMMDD_HHMMSS.log".len();

const LOG_EXTENSION: &str = ".log";

/// Stamp embedded in every generated file name.
const STAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// Split a base path into its absolute directory and file stem.
fn split_base(base: &Path) -> Result<(PathBuf, String)> {
    let stem = base
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem.is_empty() {
        return Err(Error::Config(format!(
            "base path has no file stem: {:?}",
            base
        )));
    }

    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let dir = if dir.is_absolute() {
        dir
    } else {
        std::env::current_dir()?.join(dir)
    };

    Ok((dir, stem))
}

/// Parse the embedded stamp of `name` if it is a file of the given stem.
fn parse_stamp(stem: &str, name: &str) -> Option<PrimitiveDateTime> {
    if name.len() != stem.len() + STAMP_SUFFIX_LEN {
        return None;
    }
    let rest = name.strip_prefix(stem)?.strip_prefix('_')?;
    let stamp = rest.strip_suffix(LOG_EXTENSION)?;
    if !stamp.bytes().all(|b| b.is_ascii_digit() || b == b'_') {
        return None;
    }
    PrimitiveDateTime::parse(stamp, STAMP_FORMAT).ok()
}

/// Find the existing rotated files of `base`, oldest first.
///
/// Returns an empty list when the base has no stem or its directory cannot be
/// read.
pub fn discover(base: &Path) -> Vec<PathBuf> {
    match split_base(base) {
        Ok((dir, stem)) => scan(&dir, &stem),
        Err(e) => {
            tracing::warn!("cannot discover log files for {:?}: {}", base, e);
            Vec::new()
        }
    }
}

fn scan(dir: &Path, stem: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot read log directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| parse_stamp(stem, name).is_some())
        })
        .map(|e| dir.join(e.file_name()))
        .filter(|path| path.is_file())
        .collect();
    found.sort();
    found
}

/// Tracks the known files of one base path and generates new names.
#[derive(Debug, Clone)]
pub struct FileNameSequencer {
    dir: PathBuf,
    stem: String,
    files: VecDeque<PathBuf>,
    last_stamp: Option<PrimitiveDateTime>,
}

impl FileNameSequencer {
    /// Create a sequencer for `base` and populate it from disk.
    pub fn new(base: &Path) -> Result<Self> {
        let (dir, stem) = split_base(base)?;
        let files: VecDeque<PathBuf> = scan(&dir, &stem).into();
        let last_stamp = files
            .back()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .and_then(|n| parse_stamp(&stem, n));

        Ok(Self {
            dir,
            stem,
            files,
            last_stamp,
        })
    }

    /// Directory that holds the rotated files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Known files, oldest first.
    pub fn files(&self) -> &VecDeque<PathBuf> {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The most recent known file.
    pub fn latest(&self) -> Option<&Path> {
        self.files.back().map(PathBuf::as_path)
    }

    /// Forget the oldest known file and return its path.
    pub fn pop_oldest(&mut self) -> Option<PathBuf> {
        self.files.pop_front()
    }

    /// Generate a new file name from the current time and append it to the
    /// known files.
    ///
    /// Stamps never repeat: when the clock has not moved past the newest known
    /// stamp, the new stamp is one second after it. A newest stamp at the end
    /// of the representable range falls back to the current time.
    pub fn generate(&mut self) -> PathBuf {
        let now = clock::now();
        let whole_second =
            Time::from_hms(now.hour(), now.minute(), now.second()).unwrap_or(now.time());
        let now = PrimitiveDateTime::new(now.date(), whole_second);

        let stamp = match self.last_stamp {
            Some(last) if now <= last => match last.checked_add(Duration::SECOND) {
                Some(next) => next,
                None => {
                    tracing::warn!(
                        "log file stamp {} cannot be advanced, using the current time",
                        last
                    );
                    now
                }
            },
            _ => now,
        };
        self.last_stamp = Some(stamp);

        let path = self.dir.join(self.file_name_for(stamp));
        self.files.push_back(path.clone());
        path
    }

    fn file_name_for(&self, stamp: PrimitiveDateTime) -> String {
        let stamp = stamp.format(STAMP_FORMAT).unwrap_or_default();
        format!("{}_{}{}", self.stem, stamp, LOG_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_parse_stamp_matches_generated_shape() {
        assert!(parse_stamp("app", "app_20260115_134507.log").is_some());
        assert!(parse_stamp("app", "app_20260115_134507.txt").is_none());
        assert!(parse_stamp("app", "app_2026-01-15_134507.log").is_none());
        assert!(parse_stamp("app", "other_20260115_134507.log").is_none());
        assert!(parse_stamp("app", "app_20261315_134507.log").is_none());
        assert!(parse_stamp("app", "app.log").is_none());
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("app_20260115_134507.log"));
        touch(&dir.path().join("app_20250101_000000.log"));
        touch(&dir.path().join("app.log"));
        touch(&dir.path().join("apple_20260115_134507.log"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("app_20270101_000000.log")).unwrap();

        let found = discover(&dir.path().join("app"));
        assert_eq!(
            found,
            vec![
                dir.path().join("app_20250101_000000.log"),
                dir.path().join("app_20260115_134507.log"),
            ]
        );
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let found = discover(&dir.path().join("missing").join("app"));
        assert!(found.is_empty());
    }

    #[test]
    fn test_discover_empty_base_is_empty() {
        assert!(discover(Path::new("")).is_empty());
    }

    #[test]
    fn test_generate_appends_and_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("app");
        let mut seq = FileNameSequencer::new(&base).unwrap();
        assert!(seq.is_empty());

        let path = seq.generate();
        assert_eq!(seq.latest(), Some(path.as_path()));
        assert_eq!(seq.len(), 1);

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("app_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "app".len() + STAMP_SUFFIX_LEN);

        touch(&path);
        assert_eq!(discover(&base), vec![path]);
    }

    #[test]
    fn test_generate_is_strictly_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = FileNameSequencer::new(&dir.path().join("app")).unwrap();

        let names: Vec<PathBuf> = (0..5).map(|_| seq.generate()).collect();
        for pair in names.windows(2) {
            assert!(pair[0] < pair[1], "{:?} !< {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_generate_continues_after_discovered_files() {
        let dir = tempfile::tempdir().unwrap();
        let future = dir.path().join("app_29991231_235959.log");
        touch(&future);

        let mut seq = FileNameSequencer::new(&dir.path().join("app")).unwrap();
        assert_eq!(seq.latest(), Some(future.as_path()));

        let next = seq.generate();
        assert!(next > future);
        assert_eq!(
            next.file_name().unwrap().to_str().unwrap(),
            "app_30000101_000000.log"
        );
    }

    #[test]
    fn test_generate_after_last_representable_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let last = dir.path().join("app_99991231_235959.log");
        touch(&last);

        let mut seq = FileNameSequencer::new(&dir.path().join("app")).unwrap();
        let next = seq.generate();
        let name = next.file_name().unwrap().to_str().unwrap();

        assert_ne!(next, last);
        assert!(parse_stamp("app", name).is_some());
        assert_eq!(seq.len(), 2);
        // Later names keep moving forward from the fallback stamp.
        let after = seq.generate();
        assert!(after > next);
    }

    #[test]
    fn test_file_name_for_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let seq = FileNameSequencer::new(&dir.path().join("app")).unwrap();
        let stamp = time::macros::datetime!(2026-03-07 09:05:04);
        assert_eq!(seq.file_name_for(stamp), "app_20260307_090504.log");
    }

    #[test]
    fn test_pop_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = FileNameSequencer::new(&dir.path().join("app")).unwrap();
        let first = seq.generate();
        let _second = seq.generate();
        assert_eq!(seq.pop_oldest(), Some(first));
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_relative_base_resolves_against_cwd() {
        let seq = FileNameSequencer::new(Path::new("logs/app")).unwrap();
        assert!(seq.dir().is_absolute());
        assert!(seq.dir().ends_with("logs"));
        assert_eq!(seq.stem(), "app");
    }

    #[test]
    fn test_new_rejects_empty_stem() {
        assert!(matches!(
            FileNameSequencer::new(Path::new("")),
            Err(Error::Config(_))
        ));
    }
}
