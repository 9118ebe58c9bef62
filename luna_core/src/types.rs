//! Core domain types for the Luna cycle tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Log entries and their payload (flow, symptoms, moods, lifestyle)
//! - Cycle settings kept per user
//! - Prediction and regularity results handed back to callers

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Cycle length used when neither the data nor the settings provide one
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

/// Period length used when the settings provide none
pub const DEFAULT_PERIOD_LENGTH: u32 = 5;

// ============================================================================
// Log Types
// ============================================================================

/// Kind of a log entry. Only `Period` entries drive prediction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Period,
    Symptom,
    Mood,
    Note,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Period => "period",
            LogType::Symptom => "symptom",
            LogType::Mood => "mood",
            LogType::Note => "note",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bleeding intensity recorded on a period day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FlowIntensity {
    Spotting,
    Light,
    Medium,
    Heavy,
}

impl FlowIntensity {
    pub const ALL: [FlowIntensity; 4] = [
        FlowIntensity::Spotting,
        FlowIntensity::Light,
        FlowIntensity::Medium,
        FlowIntensity::Heavy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowIntensity::Spotting => "spotting",
            FlowIntensity::Light => "light",
            FlowIntensity::Medium => "medium",
            FlowIntensity::Heavy => "heavy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for FlowIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dated record in a user's journal
///
/// `date` is kept as the stored text so that malformed records survive a
/// round trip through the store; it is parsed when the record is used.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub date: String,
    pub log_type: LogType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_intensity: Option<FlowIntensity>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_intake: Option<u32>,
    #[serde(default)]
    pub exercise: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LogEntry {
    /// New entry with a fresh id and an empty payload
    pub fn new(date: NaiveDate, log_type: LogType) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: date.format("%Y-%m-%d").to_string(),
            log_type,
            flow_intensity: None,
            symptoms: Vec::new(),
            moods: Vec::new(),
            notes: None,
            sleep_hours: None,
            sleep_quality: None,
            water_intake: None,
            exercise: false,
            stress_level: None,
            created_at: None,
        }
    }

    /// Period entry for the given day and flow
    pub fn period(date: NaiveDate, flow: FlowIntensity) -> Self {
        let mut entry = Self::new(date, LogType::Period);
        entry.flow_intensity = Some(flow);
        entry
    }

    pub fn is_period(&self) -> bool {
        self.log_type == LogType::Period
    }

    /// Calendar date of this entry
    pub fn parsed_date(&self) -> Result<NaiveDate> {
        parse_log_date(&self.date)
    }
}

/// Parse a stored log date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps (reduced to their calendar
/// date). Anything else is an `InvalidInput` error.
pub fn parse_log_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(ts) => Ok(ts.date_naive()),
        Err(e) => Err(Error::InvalidInput {
            date: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Per-user cycle settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleSettings {
    #[serde(default)]
    pub average_cycle_length: Option<u32>,
    #[serde(default)]
    pub average_period_length: Option<u32>,
    #[serde(default)]
    pub last_period_start: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub birth_year: Option<u16>,
}

fn default_true() -> bool {
    true
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            average_cycle_length: None,
            average_period_length: None,
            last_period_start: None,
            notifications_enabled: true,
            birth_year: None,
        }
    }
}

impl CycleSettings {
    /// Settings created implicitly by the first period log
    pub fn with_defaults(last_period_start: Option<NaiveDate>) -> Self {
        Self {
            average_cycle_length: Some(DEFAULT_CYCLE_LENGTH),
            average_period_length: Some(DEFAULT_PERIOD_LENGTH),
            last_period_start,
            notifications_enabled: true,
            birth_year: None,
        }
    }

    /// Stored cycle length, or `default` when missing or zero
    pub fn cycle_length_or(&self, default: u32) -> u32 {
        match self.average_cycle_length {
            Some(len) if len > 0 => len,
            _ => {
                tracing::info!("No average cycle length set, using {} days", default);
                default
            }
        }
    }

    /// Stored period length, or `default` when missing or zero
    pub fn period_length_or(&self, default: u32) -> u32 {
        match self.average_period_length {
            Some(len) if len > 0 => len,
            _ => {
                tracing::info!("No average period length set, using {} days", default);
                default
            }
        }
    }

    pub fn cycle_length(&self) -> u32 {
        self.cycle_length_or(DEFAULT_CYCLE_LENGTH)
    }

    pub fn period_length(&self) -> u32 {
        self.period_length_or(DEFAULT_PERIOD_LENGTH)
    }
}

// ============================================================================
// Prediction and Regularity
// ============================================================================

/// How tightly past cycle lengths cluster
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(s)
    }
}

/// Forecast of the next period start
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CyclePrediction {
    pub predicted_date: NaiveDate,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub confidence: Confidence,
    pub insight: String,
}

/// Summary of how much cycle lengths vary
///
/// With fewer than two valid cycles the statistics are `None` and
/// `is_irregular` is `false`: unknown is reported as not irregular.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct RegularityVerdict {
    pub cycle_lengths: Vec<u32>,
    pub average: Option<u32>,
    pub min: Option<u32>,
    pub max: Option<u32>,
    pub is_irregular: bool,
}
