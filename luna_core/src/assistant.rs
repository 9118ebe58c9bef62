//! Input for the external chat assistant.
//!
//! The assistant itself lives behind a proxy; this module only prepares what
//! gets sent: a plain-text summary of the user's data and a bounded message
//! history.

use crate::{CyclePrediction, CycleSettings, LogEntry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Recent entries of each kind included in the context
const RECENT_LIMIT: usize = 20;

/// Messages forwarded to the model per request
pub const HISTORY_WINDOW: usize = 12;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful menstrual health assistant.";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Body accepted by the chat proxy
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub system_prompt: String,
}

impl ChatRequest {
    /// Request with the user's data appended to the system prompt
    pub fn new(context: &str, history: &[ChatMessage]) -> Self {
        Self {
            messages: trim_history(history).to_vec(),
            system_prompt: format!("{}\n\n{}", DEFAULT_SYSTEM_PROMPT, context),
        }
    }
}

/// The last `HISTORY_WINDOW` messages
pub fn trim_history(messages: &[ChatMessage]) -> &[ChatMessage] {
    let start = messages.len().saturating_sub(HISTORY_WINDOW);
    &messages[start..]
}

/// Summarize the user's data for the assistant.
///
/// Entries are taken newest first, at most `RECENT_LIMIT` per section.
pub fn build_context(
    logs: &[LogEntry],
    settings: Option<&CycleSettings>,
    prediction: Option<&CyclePrediction>,
    today: NaiveDate,
) -> String {
    let mut recent: Vec<&LogEntry> = logs.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));

    let mut out = String::from("User's Menstrual Health Data:\n");

    if let Some(settings) = settings {
        let cycle_length = settings.cycle_length();
        let _ = writeln!(out, "- Average cycle length: {} days", cycle_length);
        let _ = writeln!(out, "- Average period length: {} days", settings.period_length());
        if let Some(start) = settings.last_period_start {
            let days_since = (today - start).num_days();
            let _ = writeln!(out, "- Last period started: {} ({} days ago)", start, days_since);
            let _ = writeln!(
                out,
                "- Current cycle day: {}",
                days_since.rem_euclid(i64::from(cycle_length)) + 1
            );
        }
    }

    if let Some(p) = prediction {
        let _ = writeln!(
            out,
            "- Next period predicted: {} (range {} to {}, {} confidence; {})",
            p.predicted_date, p.range_start, p.range_end, p.confidence, p.insight
        );
    }

    let periods: Vec<&&LogEntry> = recent.iter().filter(|e| e.is_period()).take(RECENT_LIMIT).collect();
    if !periods.is_empty() {
        out.push_str("\nRecent Period Logs:\n");
        for entry in periods {
            let flow = entry
                .flow_intensity
                .map_or("unspecified", |f| f.as_str());
            let _ = write!(out, "- {}: Flow {}", entry.date, flow);
            if !entry.symptoms.is_empty() {
                let _ = write!(out, ", Symptoms: {}", entry.symptoms.join(", "));
            }
            out.push('\n');
        }
    }

    let symptoms: Vec<&&LogEntry> = recent
        .iter()
        .filter(|e| !e.symptoms.is_empty())
        .take(RECENT_LIMIT)
        .collect();
    if !symptoms.is_empty() {
        out.push_str("\nRecent Symptoms:\n");
        for entry in symptoms {
            let _ = writeln!(out, "- {}: {}", entry.date, entry.symptoms.join(", "));
        }
    }

    let moods: Vec<&&LogEntry> = recent
        .iter()
        .filter(|e| !e.moods.is_empty())
        .take(RECENT_LIMIT)
        .collect();
    if !moods.is_empty() {
        out.push_str("\nRecent Moods:\n");
        for entry in moods {
            let _ = writeln!(out, "- {}: {}", entry.date, entry.moods.join(", "));
        }
    }

    out
}
