//! CSV export of the journal.
//!
//! List fields are joined with `;` so each entry stays on one row.

use crate::{LogEntry, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: String,
    date: &'a str,
    log_type: &'static str,
    flow_intensity: Option<&'static str>,
    symptoms: String,
    moods: String,
    notes: Option<&'a str>,
    sleep_hours: Option<f64>,
    sleep_quality: Option<u8>,
    water_intake: Option<u32>,
    exercise: bool,
    stress_level: Option<u8>,
    created_at: Option<String>,
}

impl<'a> From<&'a LogEntry> for CsvRow<'a> {
    fn from(entry: &'a LogEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            date: &entry.date,
            log_type: entry.log_type.as_str(),
            flow_intensity: entry.flow_intensity.map(|f| f.as_str()),
            symptoms: entry.symptoms.join(";"),
            moods: entry.moods.join(";"),
            notes: entry.notes.as_deref(),
            sleep_hours: entry.sleep_hours,
            sleep_quality: entry.sleep_quality,
            water_intake: entry.water_intake,
            exercise: entry.exercise,
            stress_level: entry.stress_level,
            created_at: entry.created_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Write all entries to `csv_path`, replacing any existing file
///
/// The file is synced to disk before returning. Returns the number of rows.
pub fn export_csv(logs: &[LogEntry], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(csv_path)?;
    for entry in logs {
        writer.serialize(CsvRow::from(entry))?;
    }
    writer.flush()?;

    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} entries to {:?}", logs.len(), csv_path);
    Ok(logs.len())
}
