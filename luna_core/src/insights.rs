//! Aggregate statistics over a user's journal.
//!
//! Symptom ids may carry a severity suffix (`cramps:2`); only the part
//! before the colon is counted. Medications are stored among the symptoms
//! with a `med:` prefix and are counted separately.

use crate::{FlowIntensity, LogEntry};
use serde::Serialize;
use std::collections::BTreeMap;

const MEDICATION_PREFIX: &str = "med:";
const TOP_SYMPTOMS: usize = 8;
const TOP_MEDICATIONS: usize = 6;
const TOP_MOODS: usize = 6;

/// A label with how often it was logged
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Frequency {
    pub name: String,
    pub count: usize,
}

/// Summary shown on the insights screen
#[derive(Clone, Debug, Serialize, PartialEq, Default)]
pub struct InsightSummary {
    pub total_logs: usize,
    pub period_days: usize,
    pub symptoms: Vec<Frequency>,
    pub medications: Vec<Frequency>,
    pub moods: Vec<Frequency>,
    /// Flow buckets with at least one entry, lightest first
    pub flow_distribution: Vec<(FlowIntensity, usize)>,
    pub avg_sleep_hours: Option<f64>,
    pub avg_water_intake: Option<u32>,
    pub avg_stress_level: Option<f64>,
}

/// Build the insight summary for a log snapshot
pub fn summarize(logs: &[LogEntry]) -> InsightSummary {
    let mut symptoms = BTreeMap::new();
    let mut medications = BTreeMap::new();
    let mut moods = BTreeMap::new();
    let mut flows: BTreeMap<FlowIntensity, usize> = BTreeMap::new();

    for entry in logs {
        for symptom in &entry.symptoms {
            match symptom.strip_prefix(MEDICATION_PREFIX) {
                Some(med) => *medications.entry(display_name(med)).or_insert(0) += 1,
                None => {
                    let id = symptom.split(':').next().unwrap_or(symptom);
                    *symptoms.entry(display_name(id)).or_insert(0) += 1;
                }
            }
        }
        for mood in &entry.moods {
            *moods.entry(display_name(mood)).or_insert(0) += 1;
        }
        if let Some(flow) = entry.flow_intensity {
            *flows.entry(flow).or_insert(0) += 1;
        }
    }

    let sleep: Vec<f64> = logs.iter().filter_map(|e| e.sleep_hours).collect();
    let water: Vec<f64> = logs
        .iter()
        .filter_map(|e| e.water_intake.map(f64::from))
        .collect();
    let stress: Vec<f64> = logs
        .iter()
        .filter_map(|e| e.stress_level)
        .filter(|&s| s > 0)
        .map(f64::from)
        .collect();

    InsightSummary {
        total_logs: logs.len(),
        period_days: logs.iter().filter(|e| e.is_period()).count(),
        symptoms: top(symptoms, TOP_SYMPTOMS),
        medications: top(medications, TOP_MEDICATIONS),
        moods: top(moods, TOP_MOODS),
        flow_distribution: flows.into_iter().collect(),
        avg_sleep_hours: average(&sleep).map(round_tenth),
        avg_water_intake: average(&water).map(|w| w.round() as u32),
        avg_stress_level: average(&stress).map(round_tenth),
    }
}

fn display_name(id: &str) -> String {
    id.replace('_', " ")
}

/// Highest counts first; ties keep alphabetical order
fn top(counts: BTreeMap<String, usize>, limit: usize) -> Vec<Frequency> {
    let mut items: Vec<Frequency> = counts
        .into_iter()
        .map(|(name, count)| Frequency { name, count })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count));
    items.truncate(limit);
    items
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogType;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    #[test]
    fn test_empty_journal() {
        let summary = summarize(&[]);
        assert_eq!(summary, InsightSummary::default());
    }

    #[test]
    fn test_symptoms_and_medications_split() {
        let mut a = LogEntry::period(day(1), FlowIntensity::Heavy);
        a.symptoms = vec!["cramps:3".into(), "med:ibuprofen".into(), "back_pain".into()];
        let mut b = LogEntry::new(day(2), LogType::Symptom);
        b.symptoms = vec!["cramps:1".into(), "med:ibuprofen".into(), "med:heat_pad".into()];

        let summary = summarize(&[a, b]);
        assert_eq!(
            summary.symptoms,
            vec![
                Frequency { name: "cramps".into(), count: 2 },
                Frequency { name: "back pain".into(), count: 1 },
            ]
        );
        assert_eq!(summary.medications[0], Frequency { name: "ibuprofen".into(), count: 2 });
        assert_eq!(summary.medications[1].name, "heat pad");
    }

    #[test]
    fn test_top_lists_are_truncated() {
        let mut entry = LogEntry::new(day(1), LogType::Mood);
        entry.moods = (0..10).map(|i| format!("mood_{}", i)).collect();
        let summary = summarize(&[entry]);
        assert_eq!(summary.moods.len(), 6);
        assert_eq!(summary.moods[0].name, "mood 0");
    }

    #[test]
    fn test_flow_and_lifestyle_averages() {
        let mut a = LogEntry::period(day(1), FlowIntensity::Heavy);
        a.sleep_hours = Some(7.0);
        a.water_intake = Some(1500);
        a.stress_level = Some(3);
        let mut b = LogEntry::period(day(2), FlowIntensity::Light);
        b.sleep_hours = Some(6.25);
        b.water_intake = Some(2001);
        let mut c = LogEntry::period(day(3), FlowIntensity::Light);
        c.stress_level = Some(4);

        let summary = summarize(&[a, b, c]);
        assert_eq!(summary.total_logs, 3);
        assert_eq!(summary.period_days, 3);
        assert_eq!(
            summary.flow_distribution,
            vec![(FlowIntensity::Light, 2), (FlowIntensity::Heavy, 1)]
        );
        assert_eq!(summary.avg_sleep_hours, Some(6.6));
        assert_eq!(summary.avg_water_intake, Some(1751));
        assert_eq!(summary.avg_stress_level, Some(3.5));
    }
}
