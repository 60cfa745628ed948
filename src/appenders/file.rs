//! File appender implementation

use crate::core::{Appender, LogEntry, LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// How an existing file is treated when the sink opens it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    #[default]
    Append,
    Truncate,
}

/// Create the parent directory of `path` if it is missing
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            LoggerError::sink_io(parent.display().to_string(), "creating log directory", e)
        })?;
    }
    Ok(())
}

/// Reject a target that can never be opened without creating anything:
/// one that names a directory, or whose nearest existing ancestor is not one
pub(crate) fn check_target(path: &Path) -> Result<()> {
    let target = path.display().to_string();
    if path.is_dir() {
        return Err(LoggerError::sink(target, "checking sink", "target is a directory"));
    }
    let mut ancestor = path.parent();
    while let Some(dir) = ancestor.filter(|p| !p.as_os_str().is_empty()) {
        if dir.exists() {
            if !dir.is_dir() {
                return Err(LoggerError::sink(
                    target,
                    "checking sink",
                    format!("'{}' is not a directory", dir.display()),
                ));
            }
            break;
        }
        ancestor = dir.parent();
    }
    Ok(())
}

pub(crate) fn open_log_file(path: &Path, mode: FileMode) -> Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        FileMode::Append => options.append(true),
        FileMode::Truncate => options.write(true).truncate(true),
    };
    options
        .open(path)
        .map_err(|e| LoggerError::sink_io(path.display().to_string(), "opening sink", e))
}

/// Appends one line per record to a single, never-rotated file
pub struct FileAppender {
    path: PathBuf,
    mode: FileMode,
    writer: Option<BufWriter<File>>,
}

impl FileAppender {
    /// Open (creating parent directories) in append mode
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(path, FileMode::Append, false)
    }

    /// Open with an explicit mode; with `delay` the file is opened on the
    /// first record instead of now
    pub fn with_options(path: impl Into<PathBuf>, mode: FileMode, delay: bool) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;

        let writer = if delay {
            None
        } else {
            Some(BufWriter::new(open_log_file(&path, mode)?))
        };

        Ok(Self { path, mode, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the underlying file is currently open
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl Appender for FileAppender {
    fn append(&mut self, _entry: &LogEntry, formatted: &str) -> Result<()> {
        if self.writer.is_none() {
            self.writer = Some(BufWriter::new(open_log_file(&self.path, self.mode)?));
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(LoggerError::sink(
                self.path.display().to_string(),
                "writing record",
                "File writer not initialized",
            ));
        };

        writer
            .write_all(formatted.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| LoggerError::sink_io(self.path.display().to_string(), "writing record", e))
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer
                .flush()
                .map_err(|e| LoggerError::sink_io(self.path.display().to_string(), "flushing", e))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use chrono::Utc;
    use tempfile::tempdir;

    fn entry() -> LogEntry {
        LogEntry::new("t", LogLevel::Info, "x", Utc::now())
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("program.log");

        let mut appender = FileAppender::new(&path).unwrap();
        appender.append(&entry(), "first").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");
    }

    #[test]
    fn test_truncate_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.log");
        fs::write(&path, "old\n").unwrap();

        let mut appender = FileAppender::with_options(&path, FileMode::Truncate, false).unwrap();
        appender.append(&entry(), "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn test_delay_opens_on_first_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("delayed.log");

        let mut appender = FileAppender::with_options(&path, FileMode::Append, true).unwrap();
        assert!(!path.exists());
        assert!(!appender.is_open());

        appender.append(&entry(), "hello").unwrap();
        assert!(appender.is_open());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
