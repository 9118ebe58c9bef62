//! Cycle settings persistence with file locking.
//!
//! Settings are a single small JSON document per user, written atomically.
//! Readers and writers coordinate through a sidecar `.lock` file, since the
//! settings file itself is replaced on every save.

use crate::{CycleSettings, Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("json.lock")
}

fn parent_dir(path: &Path) -> Result<&Path> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "settings path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;
    Ok(parent)
}

fn open_lock(path: &Path) -> Result<File> {
    parent_dir(path)?;
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    Ok(file)
}

impl CycleSettings {
    /// Load settings from a file with shared locking
    ///
    /// Returns `None` if the file doesn't exist. A corrupted or unreadable
    /// file is logged and also treated as absent.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::info!("No settings file found at {:?}", path);
            return Ok(None);
        }

        let lock = open_lock(path)?;
        if let Err(e) = lock.lock_shared() {
            tracing::warn!("Unable to lock settings file {:?}: {}. Ignoring it.", path, e);
            return Ok(None);
        }
        let settings = read_settings(path);
        lock.unlock()?;
        Ok(settings)
    }

    /// Save settings atomically (temp file, fsync, rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let lock = open_lock(path)?;
        lock.lock_exclusive()?;
        let result = self.write_settings(path);
        lock.unlock()?;
        result
    }

    /// Read, transform and save settings under one exclusive lock.
    ///
    /// The closure sees the current settings (`None` if missing or
    /// unreadable) and returns the settings to store.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(Option<Self>) -> Result<Self>,
    {
        let lock = open_lock(path)?;
        lock.lock_exclusive()?;

        let result = f(read_settings(path)).and_then(|updated| {
            updated.write_settings(path)?;
            Ok(updated)
        });
        lock.unlock()?;
        result
    }

    fn write_settings(&self, path: &Path) -> Result<()> {
        let temp = NamedTempFile::new_in(parent_dir(path)?)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Read settings without locking; missing or corrupt files yield `None`
fn read_settings(path: &Path) -> Option<CycleSettings> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Unable to open settings file {:?}: {}. Ignoring it.", path, e);
            return None;
        }
    };

    let mut contents = String::new();
    if let Err(e) = file.read_to_string(&mut contents) {
        tracing::warn!("Failed to read settings file {:?}: {}. Ignoring it.", path, e);
        return None;
    }

    match serde_json::from_str::<CycleSettings>(&contents) {
        Ok(settings) => {
            tracing::debug!("Loaded settings from {:?}", path);
            Some(settings)
        }
        Err(e) => {
            tracing::warn!("Failed to parse settings file {:?}: {}. Ignoring it.", path, e);
            None
        }
    }
}
