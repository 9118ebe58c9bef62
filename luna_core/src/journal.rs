//! Append-only JSONL journal of log entries.
//!
//! Each line of the journal is one JSON `LogEntry`. Appends and rewrites
//! serialize on an exclusive lock over a sidecar `.lock` file; reads take a
//! shared lock on the same file. Rewrites (edits and deletions) go through a
//! temp file that is renamed over the journal.

use crate::{LogEntry, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// JSONL-backed journal with file locking
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    /// Create a journal handle for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("jsonl.lock")
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn open_lock(&self) -> Result<File> {
        self.ensure_parent_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        Ok(file)
    }

    /// Append one entry as a JSON line
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        lock.unlock()?;
        tracing::debug!("Appended entry {} to journal", entry.id);
        Ok(())
    }

    /// Read all entries in file order
    pub fn read_all(&self) -> Result<Vec<LogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let entries = read_entries(&self.path);
        lock.unlock()?;
        entries
    }

    /// Read, transform and atomically rewrite the whole journal.
    ///
    /// The closure runs while the exclusive lock is held, so no append can
    /// slip in between the read and the rename.
    pub fn rewrite<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<LogEntry>) -> Result<T>,
    {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let result = self.rewrite_locked(f);
        lock.unlock()?;
        result
    }

    fn rewrite_locked<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<LogEntry>) -> Result<T>,
    {
        let mut entries = if self.path.exists() {
            read_entries(&self.path)?
        } else {
            Vec::new()
        };
        let output = f(&mut entries)?;

        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "journal path missing parent")
        })?;
        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for entry in &entries {
                serde_json::to_writer(&mut writer, entry)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path)
            .map_err(|e| crate::Error::Io(e.error))?;

        tracing::debug!("Rewrote journal with {} entries", entries.len());
        Ok(output)
    }
}

/// Read all entries from a journal file without locking
///
/// Corrupted lines are skipped with a warning.
pub fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    tracing::debug!("Read {} entries from journal", entries.len());
    Ok(entries)
}
