//! Cycle length estimation from episode starts.
//!
//! Cycle lengths outside `MIN_CYCLE_DAYS..=MAX_CYCLE_DAYS` are treated as
//! mis-logged data and dropped. The mean weights recent cycles linearly
//! heavier than old ones; the spread is the plain population deviation.

use chrono::NaiveDate;
use serde::Serialize;

/// Shortest cycle accepted as a sample
pub const MIN_CYCLE_DAYS: i64 = 18;

/// Longest cycle accepted as a sample
pub const MAX_CYCLE_DAYS: i64 = 50;

/// Output of the estimator
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CycleEstimate {
    /// Samples used for the statistics, oldest first
    pub samples: Vec<u32>,
    /// Recency-weighted mean, rounded to whole days
    pub weighted_mean: u32,
    /// Population standard deviation of `samples`
    pub std_dev: f64,
    /// True when no empirical sample survived and the default was used
    pub used_fallback: bool,
}

/// Differences between consecutive starts that fall inside the valid range
pub fn valid_samples(starts: &[NaiveDate]) -> Vec<u32> {
    starts
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .filter(|days| {
            let valid = (MIN_CYCLE_DAYS..=MAX_CYCLE_DAYS).contains(days);
            if !valid {
                tracing::debug!("Discarding implausible cycle length of {} days", days);
            }
            valid
        })
        .map(|days| days as u32)
        .collect()
}

/// Estimate cycle length from ascending episode starts.
///
/// If no valid sample exists, `fallback_cycle_length` becomes the only
/// sample and the deviation is zero.
pub fn estimate(starts: &[NaiveDate], fallback_cycle_length: u32) -> CycleEstimate {
    let mut samples = valid_samples(starts);
    let used_fallback = samples.is_empty();
    if used_fallback {
        tracing::info!(
            "No valid cycle lengths in {} episodes, falling back to {} days",
            starts.len(),
            fallback_cycle_length
        );
        samples.push(fallback_cycle_length);
    }

    CycleEstimate {
        weighted_mean: weighted_mean(&samples).round() as u32,
        std_dev: population_std_dev(&samples),
        samples,
        used_fallback,
    }
}

/// Mean where sample `i` (oldest = 0) has weight `i + 1`
pub fn weighted_mean(samples: &[u32]) -> f64 {
    let (sum, total_weight) = samples
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sum, total), (i, &len)| {
            let w = (i + 1) as f64;
            (sum + f64::from(len) * w, total + w)
        });
    if total_weight == 0.0 {
        return 0.0;
    }
    sum / total_weight
}

pub fn mean(samples: &[u32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&s| f64::from(s)).sum::<f64>() / samples.len() as f64
}

pub fn population_std_dev(samples: &[u32]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let avg = mean(samples);
    let variance = samples
        .iter()
        .map(|&s| (f64::from(s) - avg).powi(2))
        .sum::<f64>()
        / samples.len() as f64;
    variance.sqrt()
}
