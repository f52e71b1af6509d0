use chrono::NaiveDate;

use crate::models::{CycleRecord, DayClassification, PredictionWindow};

/// Classify one calendar day. First match wins:
///
/// 1. `Period` inside any logged flow range or the predicted next period.
/// 2. `Fertile` inside the predicted fertile window.
/// 3. `Safe` whenever there is history or a prediction to go on.
/// 4. `Unknown` otherwise.
pub fn classify_date(
    date: NaiveDate,
    records: &[CycleRecord],
    window: &PredictionWindow,
) -> DayClassification {
    if records.iter().any(|r| r.covers(date)) || window.in_next_period(date) {
        DayClassification::Period
    } else if window.in_fertile_window(date) {
        DayClassification::Fertile
    } else if window.is_defined() || !records.is_empty() {
        DayClassification::Safe
    } else {
        DayClassification::Unknown
    }
}

/// Classify every day from `first` through `last` inclusive.
pub fn classify_range(
    first: NaiveDate,
    last: NaiveDate,
    records: &[CycleRecord],
    window: &PredictionWindow,
) -> Vec<(NaiveDate, DayClassification)> {
    first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| (day, classify_date(day, records, window)))
        .collect()
}
