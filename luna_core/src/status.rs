//! Where the user is in the current cycle, from settings alone.

use crate::CycleSettings;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CycleStatus {
    /// 1-based day within the current cycle
    pub cycle_day: u32,
    pub next_period_in: u32,
    pub next_period_date: Option<NaiveDate>,
    pub cycle_length: u32,
    pub period_length: u32,
}

/// Compute the cycle position on `today`.
///
/// Cycles repeat every `cycle_length` days from `last_period_start`. Without
/// a known start the user is placed on day 1 with a full cycle ahead. The
/// next period date is `None` when it would fall past the calendar's end.
pub fn cycle_status(settings: &CycleSettings, today: NaiveDate) -> CycleStatus {
    let cycle_length = settings.cycle_length();
    let period_length = settings.period_length();

    let Some(last_start) = settings.last_period_start else {
        return CycleStatus {
            cycle_day: 1,
            next_period_in: cycle_length,
            next_period_date: None,
            cycle_length,
            period_length,
        };
    };

    let days_since = (today - last_start).num_days();
    let offset = days_since.rem_euclid(i64::from(cycle_length));
    let next_period_in = i64::from(cycle_length) - offset;

    CycleStatus {
        cycle_day: offset as u32 + 1,
        next_period_in: next_period_in as u32,
        next_period_date: today.checked_add_signed(Duration::days(next_period_in)),
        cycle_length,
        period_length,
    }
}
