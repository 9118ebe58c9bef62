//! Next-period prediction and regularity classification.
//!
//! This module ties the pipeline together:
//! - Period log dates are reduced to episode starts
//! - Episode starts become cycle length samples
//! - Samples yield a forecast with a confidence band and a regularity verdict
//!
//! Every function here is pure. Sparse data degrades to `None` or an empty
//! verdict; only malformed dates are reported as errors.

use crate::episodes::{period_dates, reconstruct_episodes};
use crate::estimator::{estimate, mean, valid_samples, CycleEstimate};
use crate::{Confidence, CyclePrediction, CycleSettings, LogEntry, RegularityVerdict, Result};
use chrono::{Duration, NaiveDate};

/// Deviation (days) at or below which confidence is high
pub const HIGH_CONFIDENCE_MAX_STD_DEV: f64 = 2.0;

/// Deviation (days) at or below which confidence is medium
pub const MEDIUM_CONFIDENCE_MAX_STD_DEV: f64 = 5.0;

/// Spread between shortest and longest cycle above which cycles are irregular
pub const IRREGULAR_SPREAD_DAYS: u32 = 7;

/// Sample count from which the insight reports an average
const AVERAGE_INSIGHT_MIN_SAMPLES: usize = 3;

/// Predict the next period from a log snapshot.
///
/// Returns `Ok(None)` when there are fewer than two period entries, fewer
/// than two reconstructed episodes, or no representable forecast date. The settings only supply the fallback
/// cycle length.
pub fn predict(logs: &[LogEntry], settings: &CycleSettings) -> Result<Option<CyclePrediction>> {
    let dates = period_dates(logs)?;
    if dates.len() < 2 {
        tracing::debug!("Only {} period entries, no prediction", dates.len());
        return Ok(None);
    }

    let starts = reconstruct_episodes(&dates);
    Ok(predict_from_starts(&starts, settings.cycle_length()))
}

/// Predict the next period from ascending episode starts.
///
/// Returns `None` with fewer than two starts, or when the forecast band
/// would fall past the last representable date.
pub fn predict_from_starts(
    starts: &[NaiveDate],
    fallback_cycle_length: u32,
) -> Option<CyclePrediction> {
    if starts.len() < 2 {
        tracing::debug!("Only {} episodes, no prediction", starts.len());
        return None;
    }
    let last_start = *starts.last()?;

    let est = estimate(starts, fallback_cycle_length);
    let margin = Duration::days(est.std_dev.ceil() as i64);
    let band = last_start
        .checked_add_signed(Duration::days(i64::from(est.weighted_mean)))
        .and_then(|date| {
            Some((
                date,
                date.checked_sub_signed(margin)?,
                date.checked_add_signed(margin)?,
            ))
        });
    let Some((predicted_date, range_start, range_end)) = band else {
        tracing::warn!("Prediction from {} falls outside the calendar range", last_start);
        return None;
    };

    let prediction = CyclePrediction {
        predicted_date,
        range_start,
        range_end,
        confidence: confidence_for(est.std_dev),
        insight: insight_for(&est),
    };

    tracing::debug!(
        "Predicted {} ({} confidence, sd {:.2})",
        prediction.predicted_date,
        prediction.confidence,
        est.std_dev
    );
    Some(prediction)
}

/// Map a standard deviation onto a confidence tier
pub fn confidence_for(std_dev: f64) -> Confidence {
    if std_dev <= HIGH_CONFIDENCE_MAX_STD_DEV {
        Confidence::High
    } else if std_dev <= MEDIUM_CONFIDENCE_MAX_STD_DEV {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn insight_for(est: &CycleEstimate) -> String {
    let n = est.samples.len();
    if n >= AVERAGE_INSIGHT_MIN_SAMPLES {
        format!("{}-day average across {} tracked cycles", est.weighted_mean, n)
    } else {
        let plural = if n > 1 { "s" } else { "" };
        format!("Based on {} recorded cycle{}", n, plural)
    }
}

/// Classify regularity from a log snapshot.
pub fn classify_regularity(logs: &[LogEntry]) -> Result<RegularityVerdict> {
    let dates = period_dates(logs)?;
    let starts = reconstruct_episodes(&dates);
    Ok(classify_samples(&valid_samples(&starts)))
}

/// Classify regularity from valid cycle length samples.
///
/// Fewer than two samples yields no statistics and `is_irregular = false`.
pub fn classify_samples(samples: &[u32]) -> RegularityVerdict {
    let (Some(&min), Some(&max)) = (samples.iter().min(), samples.iter().max()) else {
        return RegularityVerdict::default();
    };
    if samples.len() < 2 {
        return RegularityVerdict {
            cycle_lengths: samples.to_vec(),
            ..RegularityVerdict::default()
        };
    }

    RegularityVerdict {
        cycle_lengths: samples.to_vec(),
        average: Some(mean(samples).round() as u32),
        min: Some(min),
        max: Some(max),
        is_irregular: max - min > IRREGULAR_SPREAD_DAYS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlowIntensity, LogType};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period_logs(dates: &[&str]) -> Vec<LogEntry> {
        dates
            .iter()
            .map(|s| LogEntry::period(d(s), FlowIntensity::Medium))
            .collect()
    }

    #[test]
    fn test_regular_history_high_confidence() {
        let starts = vec![d("2024-01-01"), d("2024-01-29"), d("2024-02-26")];
        let pred = predict_from_starts(&starts, 28).unwrap();
        assert_eq!(pred.predicted_date, d("2024-03-25"));
        assert_eq!(pred.range_start, d("2024-03-25"));
        assert_eq!(pred.range_end, d("2024-03-25"));
        assert_eq!(pred.confidence, Confidence::High);
        assert_eq!(pred.insight, "Based on 2 recorded cycles");
    }

    #[test]
    fn test_predict_from_logs_with_multi_day_periods() {
        let logs = period_logs(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-03",
            "2024-01-29",
            "2024-01-30",
            "2024-02-26",
            "2024-02-27",
            "2024-02-28",
        ]);
        let pred = predict(&logs, &CycleSettings::default()).unwrap().unwrap();
        assert_eq!(pred.predicted_date, d("2024-03-25"));
        assert_eq!(pred.confidence, Confidence::High);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut logs = period_logs(&["2024-02-26", "2024-01-01", "2024-01-29"]);
        logs.push(LogEntry::new(d("2024-01-15"), LogType::Symptom));
        let pred = predict(&logs, &CycleSettings::default()).unwrap().unwrap();
        assert_eq!(pred.predicted_date, d("2024-03-25"));
    }

    #[test]
    fn test_single_entry_gives_no_prediction() {
        let logs = period_logs(&["2024-01-01"]);
        assert!(predict(&logs, &CycleSettings::default()).unwrap().is_none());

        let verdict = classify_regularity(&logs).unwrap();
        assert!(!verdict.is_irregular);
        assert!(verdict.cycle_lengths.is_empty());
        assert_eq!(verdict.average, None);
    }

    #[test]
    fn test_single_episode_gives_no_prediction() {
        let logs = period_logs(&["2024-01-01", "2024-01-02", "2024-01-02"]);
        assert!(predict(&logs, &CycleSettings::default()).unwrap().is_none());
    }

    #[test]
    fn test_short_gap_falls_back_to_settings() {
        let logs = period_logs(&["2024-01-01", "2024-01-11"]);

        let pred = predict(&logs, &CycleSettings::default()).unwrap().unwrap();
        assert_eq!(pred.predicted_date, d("2024-02-08"));
        assert_eq!(pred.range_start, pred.predicted_date);
        assert_eq!(pred.confidence, Confidence::High);
        assert_eq!(pred.insight, "Based on 1 recorded cycle");

        let settings = CycleSettings {
            average_cycle_length: Some(30),
            ..CycleSettings::default()
        };
        let pred = predict(&logs, &settings).unwrap().unwrap();
        assert_eq!(pred.predicted_date, d("2024-02-10"));
    }

    #[test]
    fn test_band_and_low_confidence() {
        // Samples [19, 50]: weighted (19 + 100) / 3 = 39.67 -> 40, sd 15.5 -> 16
        let starts = vec![d("2024-01-01"), d("2024-01-20"), d("2024-03-10")];
        let pred = predict_from_starts(&starts, 28).unwrap();
        assert_eq!(pred.predicted_date, d("2024-04-19"));
        assert_eq!(pred.range_start, d("2024-04-03"));
        assert_eq!(pred.range_end, d("2024-05-05"));
        assert_eq!(pred.confidence, Confidence::Low);
    }

    #[test]
    fn test_average_insight_with_three_cycles() {
        let starts = vec![
            d("2024-01-01"),
            d("2024-01-28"),
            d("2024-02-25"),
            d("2024-03-26"),
        ];
        let pred = predict_from_starts(&starts, 28).unwrap();
        assert_eq!(pred.insight, "29-day average across 3 tracked cycles");
        // sd of [27, 28, 30] is 1.25
        assert_eq!(pred.confidence, Confidence::High);
        assert_eq!(pred.range_start, d("2024-04-22"));
        assert_eq!(pred.range_end, d("2024-04-26"));
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(confidence_for(0.0), Confidence::High);
        assert_eq!(confidence_for(2.0), Confidence::High);
        assert_eq!(confidence_for(2.01), Confidence::Medium);
        assert_eq!(confidence_for(5.0), Confidence::Medium);
        assert_eq!(confidence_for(5.01), Confidence::Low);
    }

    #[test]
    fn test_predict_is_idempotent() {
        let logs = period_logs(&["2024-01-01", "2024-01-27", "2024-02-26", "2024-03-24"]);
        let settings = CycleSettings::default();
        let first = predict(&logs, &settings).unwrap();
        let second = predict(&logs, &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_period_date_is_error() {
        let mut logs = period_logs(&["2024-01-01", "2024-01-29"]);
        logs[1].date = "29/01/2024".into();
        assert!(matches!(
            predict(&logs, &CycleSettings::default()),
            Err(crate::Error::InvalidInput { .. })
        ));
        assert!(classify_regularity(&logs).is_err());
    }

    #[test]
    fn test_irregular_history() {
        let logs = period_logs(&["2024-01-01", "2024-01-20", "2024-03-10"]);
        let verdict = classify_regularity(&logs).unwrap();
        assert_eq!(verdict.cycle_lengths, vec![19, 50]);
        assert_eq!(verdict.min, Some(19));
        assert_eq!(verdict.max, Some(50));
        assert!(verdict.is_irregular);
    }

    #[test]
    fn test_spread_of_seven_is_regular() {
        let verdict = classify_samples(&[25, 32]);
        assert!(!verdict.is_irregular);
        assert_eq!(verdict.average, Some(29));

        let verdict = classify_samples(&[25, 33]);
        assert!(verdict.is_irregular);
    }

    #[test]
    fn test_one_sample_has_no_statistics() {
        let verdict = classify_samples(&[30]);
        assert_eq!(verdict.cycle_lengths, vec![30]);
        assert_eq!(verdict.min, None);
        assert!(!verdict.is_irregular);

        assert_eq!(classify_samples(&[]), RegularityVerdict::default());
    }

    #[test]
    fn test_regularity_ignores_fallback() {
        // Only gap is 10 days, so no valid samples at all
        let logs = period_logs(&["2024-01-01", "2024-01-11"]);
        let verdict = classify_regularity(&logs).unwrap();
        assert!(verdict.cycle_lengths.is_empty());
        assert!(!verdict.is_irregular);
    }

    #[test]
    fn test_forecast_past_calendar_end_is_none() {
        let last = NaiveDate::MAX - Duration::days(10);
        let starts = vec![last - Duration::days(28), last];
        assert!(predict_from_starts(&starts, 28).is_none());

        let logs: Vec<LogEntry> = starts
            .iter()
            .map(|&date| LogEntry::period(date, FlowIntensity::Medium))
            .collect();
        assert!(predict(&logs, &CycleSettings::default()).unwrap().is_none());
    }
}
