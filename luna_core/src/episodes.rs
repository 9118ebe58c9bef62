//! Period episode reconstruction.
//!
//! Users log individual bleeding days. An episode is a run of period days
//! where consecutive logged days are at most one day apart; the first day of
//! each run is the episode start.

use crate::{LogEntry, Result};
use chrono::NaiveDate;

/// Collect the dates of all period-flagged entries, sorted ascending.
///
/// Fails with `InvalidInput` if any period entry has an unparseable date.
/// Entries of other kinds are not inspected.
pub fn period_dates(logs: &[LogEntry]) -> Result<Vec<NaiveDate>> {
    let mut dates = logs
        .iter()
        .filter(|entry| entry.is_period())
        .map(LogEntry::parsed_date)
        .collect::<Result<Vec<_>>>()?;

    dates.sort();
    tracing::debug!("Collected {} period dates", dates.len());
    Ok(dates)
}

/// Reduce ascending period dates to episode start dates.
///
/// A date starts a new episode when it is more than one day after the date
/// immediately before it. Same-day repeats have a gap of zero and are always
/// continuations.
pub fn reconstruct_episodes(period_dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let Some(&first) = period_dates.first() else {
        return Vec::new();
    };

    let mut starts = vec![first];
    for pair in period_dates.windows(2) {
        let gap = (pair[1] - pair[0]).num_days();
        if gap > 1 {
            starts.push(pair[1]);
        }
    }
    starts
}
