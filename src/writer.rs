use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::rotation::{Enforcement, RotationPolicy};
use crate::{Error, Result};

/// The file currently receiving output.
#[derive(Debug)]
pub struct ActiveFile {
    /// Absolute path of the open file.
    pub path: PathBuf,
    /// The open file handle.
    pub file: File,
}

impl ActiveFile {
    /// Open `path` for append or truncate, resolving a relative path against
    /// the current working directory.
    pub fn open(path: &Path, append: bool) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(Error::Config("no log file name".to_string()));
        }

        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&path)?;

        Ok(Self { path, file })
    }

    /// Length of the file as currently stored on disk.
    pub fn size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

/// The single point of output: console, active file, or both.
///
/// Every write is flushed immediately and followed by a rotation check when a
/// [`RotationPolicy`] is attached.
pub struct LogSink {
    console: Option<Box<dyn Write + Send>>,
    active: Option<ActiveFile>,
    rotation: Option<RotationPolicy>,
}

impl LogSink {
    /// Create a sink with an optional console writer and no file.
    pub fn new(console: Option<Box<dyn Write + Send>>) -> Self {
        Self {
            console,
            active: None,
            rotation: None,
        }
    }

    /// Attach the rotation policy consulted after every write.
    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn rotation(&self) -> Option<&RotationPolicy> {
        self.rotation.as_ref()
    }

    pub fn rotation_mut(&mut self) -> Option<&mut RotationPolicy> {
        self.rotation.as_mut()
    }

    /// Open `path` as the active file, replacing any file already open.
    pub fn open(&mut self, path: &Path, append: bool) -> Result<()> {
        self.close();
        self.active = Some(ActiveFile::open(path, append)?);
        Ok(())
    }

    /// Path of the active file, if one is open.
    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Length of the active file on disk, 0 when no file is open.
    pub fn size(&self) -> u64 {
        self.active.as_ref().map(ActiveFile::size).unwrap_or(0)
    }

    /// Write a block of text to every destination, flush, then enforce the
    /// rotation limits.
    pub fn write_text(&mut self, text: &str) -> io::Result<Enforcement> {
        self.write_block(text.as_bytes())
    }

    /// Run the rotation limits without writing anything.
    pub fn enforce(&mut self) -> Enforcement {
        match self.rotation.as_mut() {
            Some(rotation) => rotation.enforce(&mut self.active),
            None => Enforcement::default(),
        }
    }

    fn write_block(&mut self, buf: &[u8]) -> io::Result<Enforcement> {
        let mut report = Enforcement::default();
        if let Some(rotation) = self.rotation.as_mut() {
            report.merge(rotation.prepare(&mut self.active, buf.len() as u64));
        }

        let mut first_err: Option<io::Error> = None;

        if let Some(console) = self.console.as_mut()
            && let Err(e) = console.write_all(buf).and_then(|_| console.flush())
        {
            first_err.get_or_insert(e);
        }

        if let Some(active) = self.active.as_mut()
            && let Err(e) = active.file.write_all(buf).and_then(|_| active.file.flush())
        {
            first_err.get_or_insert(e);
        }

        report.merge(self.enforce());

        match first_err {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Flush the console and the active file.
    pub fn flush_all(&mut self) -> io::Result<()> {
        if let Some(console) = self.console.as_mut() {
            console.flush()?;
        }
        if let Some(active) = self.active.as_mut() {
            active.file.flush()?;
        }
        Ok(())
    }

    /// Flush and release the active file.
    pub fn close(&mut self) {
        if let Some(mut active) = self.active.take() {
            let _ = active.file.flush();
        }
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_block(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_all()
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        self.close();
    }
}
