//! Repositories for log entries and cycle settings.
//!
//! The prediction code never touches storage; callers read a snapshot
//! through these traits and hand it over. `FileStore` keeps one directory
//! per user, `MemoryStore` keeps everything in memory.

use crate::journal::JsonlJournal;
use crate::{CycleSettings, Error, LogEntry, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Sort order for `LogRepository::list`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Create/list/update/delete of dated log entries
pub trait LogRepository {
    /// Entries ordered by date, truncated to `limit` if given
    fn list(&self, order: ListOrder, limit: Option<usize>) -> Result<Vec<LogEntry>>;

    /// Store a new entry, stamping `created_at` if unset
    fn create(&mut self, entry: LogEntry) -> Result<LogEntry>;

    /// Replace the stored entry with the same id
    fn update(&mut self, entry: &LogEntry) -> Result<()>;

    /// Remove an entry; returns whether anything was removed
    fn delete(&mut self, id: Uuid) -> Result<bool>;
}

/// Load/save of a user's cycle settings
pub trait SettingsRepository {
    /// Stored settings, or `None` if the user never saved any
    fn load_settings(&self) -> Result<Option<CycleSettings>>;

    fn save_settings(&mut self, settings: &CycleSettings) -> Result<()>;

    /// Stored settings or defaults
    fn settings_or_default(&self) -> Result<CycleSettings> {
        Ok(self.load_settings()?.unwrap_or_default())
    }

    /// Read-modify-write of the stored settings.
    ///
    /// Implementations shared between processes must hold a lock across the
    /// whole update so concurrent writers cannot lose each other's changes.
    fn update_settings(
        &mut self,
        f: &mut dyn FnMut(Option<CycleSettings>) -> Result<CycleSettings>,
    ) -> Result<CycleSettings> {
        let updated = f(self.load_settings()?)?;
        self.save_settings(&updated)?;
        Ok(updated)
    }
}

fn sort_and_limit(mut entries: Vec<LogEntry>, order: ListOrder, limit: Option<usize>) -> Vec<LogEntry> {
    match order {
        ListOrder::NewestFirst => entries.sort_by(|a, b| b.date.cmp(&a.date)),
        ListOrder::OldestFirst => entries.sort_by(|a, b| a.date.cmp(&b.date)),
    }
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

fn stamp(mut entry: LogEntry) -> LogEntry {
    if entry.created_at.is_none() {
        entry.created_at = Some(Utc::now());
    }
    entry
}

/// Store a new entry and keep settings in step with it.
///
/// The entry's date is validated first. A period entry moves
/// `last_period_start` forward to its date; if the user has no settings yet
/// they are created with the default cycle and period lengths.
pub fn record_entry<R>(store: &mut R, entry: LogEntry) -> Result<LogEntry>
where
    R: LogRepository + SettingsRepository + ?Sized,
{
    let date = entry.parsed_date()?;
    let is_period = entry.is_period();
    let stored = store.create(entry)?;

    if is_period {
        store.update_settings(&mut |current| {
            Ok(match current {
                Some(mut current) => {
                    if current.last_period_start.map_or(true, |last| date > last) {
                        current.last_period_start = Some(date);
                    }
                    current
                }
                None => CycleSettings::with_defaults(Some(date)),
            })
        })?;
        tracing::info!("Period logged for {}", date);
    }

    Ok(stored)
}

// ============================================================================
// File-backed store
// ============================================================================

/// Per-user directory holding `logs.jsonl` and `settings.json`
pub struct FileStore {
    dir: PathBuf,
    journal: JsonlJournal,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let journal = JsonlJournal::new(dir.join("logs.jsonl"));
        Self { dir, journal }
    }

    /// Store for `user` under `data_dir`
    pub fn for_user(data_dir: &Path, user: &str) -> Self {
        Self::new(data_dir.join(user))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn journal_path(&self) -> &Path {
        self.journal.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join("settings.json")
    }
}

impl LogRepository for FileStore {
    fn list(&self, order: ListOrder, limit: Option<usize>) -> Result<Vec<LogEntry>> {
        Ok(sort_and_limit(self.journal.read_all()?, order, limit))
    }

    fn create(&mut self, entry: LogEntry) -> Result<LogEntry> {
        let entry = stamp(entry);
        self.journal.append(&entry)?;
        Ok(entry)
    }

    fn update(&mut self, entry: &LogEntry) -> Result<()> {
        self.journal.rewrite(|entries| {
            let slot = entries
                .iter_mut()
                .find(|e| e.id == entry.id)
                .ok_or_else(|| Error::NotFound(format!("log entry {}", entry.id)))?;
            *slot = entry.clone();
            Ok(())
        })
    }

    fn delete(&mut self, id: Uuid) -> Result<bool> {
        if !self.journal.path().exists() {
            return Ok(false);
        }
        self.journal.rewrite(|entries| {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            Ok(entries.len() != before)
        })
    }
}

impl SettingsRepository for FileStore {
    fn load_settings(&self) -> Result<Option<CycleSettings>> {
        CycleSettings::load(&self.settings_path())
    }

    fn save_settings(&mut self, settings: &CycleSettings) -> Result<()> {
        settings.save(&self.settings_path())
    }

    fn update_settings(
        &mut self,
        f: &mut dyn FnMut(Option<CycleSettings>) -> Result<CycleSettings>,
    ) -> Result<CycleSettings> {
        CycleSettings::update(&self.settings_path(), |current| f(current))
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store that never touches the filesystem
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Vec<LogEntry>,
    settings: Option<CycleSettings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<LogEntry>) -> Self {
        Self {
            entries,
            settings: None,
        }
    }
}

impl LogRepository for MemoryStore {
    fn list(&self, order: ListOrder, limit: Option<usize>) -> Result<Vec<LogEntry>> {
        Ok(sort_and_limit(self.entries.clone(), order, limit))
    }

    fn create(&mut self, entry: LogEntry) -> Result<LogEntry> {
        let entry = stamp(entry);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn update(&mut self, entry: &LogEntry) -> Result<()> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| Error::NotFound(format!("log entry {}", entry.id)))?;
        *slot = entry.clone();
        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        Ok(self.entries.len() != before)
    }
}

impl SettingsRepository for MemoryStore {
    fn load_settings(&self) -> Result<Option<CycleSettings>> {
        Ok(self.settings.clone())
    }

    fn save_settings(&mut self, settings: &CycleSettings) -> Result<()> {
        self.settings = Some(settings.clone());
        Ok(())
    }
}
