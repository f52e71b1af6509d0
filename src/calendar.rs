use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::classify::classify_date;
use crate::config::PredictionConfig;
use crate::models::{AveragesResult, CycleRecord, CycleStats, DayClassification, PredictionWindow};
use crate::prediction::predict_next_window_with;
use crate::stats::{compute_averages_with, cycle_stats};

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("invalid month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub classification: DayClassification,
    /// Inside a logged flow range, as opposed to a predicted one.
    pub logged: bool,
}

/// Data handed to a calendar renderer for one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayCell>,
    pub averages: AveragesResult,
    pub window: PredictionWindow,
    pub stats: CycleStats,
    pub current_cycle: Option<CycleRecord>,
}

pub fn month_view(
    year: i32,
    month: u32,
    records: &[CycleRecord],
    config: &PredictionConfig,
) -> Result<MonthView, CalendarError> {
    let (first_day, last_day) = month_bounds(year, month)?;

    let averages = compute_averages_with(records, config);
    let window = predict_next_window_with(records, &averages, config);

    let days = first_day
        .iter_days()
        .take_while(|day| *day <= last_day)
        .map(|date| DayCell {
            date,
            classification: classify_date(date, records, &window),
            logged: records.iter().any(|r| r.covers(date)),
        })
        .collect();

    let current_cycle = records
        .iter()
        .filter(|r| r.end_date.is_none())
        .max_by_key(|r| r.start_date)
        .cloned();

    Ok(MonthView {
        year,
        month,
        days,
        averages,
        window,
        stats: cycle_stats(records),
        current_cycle,
    })
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), CalendarError> {
    let invalid = || CalendarError::InvalidMonth { year, month };

    let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok((first_day, next_month - Duration::days(1)))
}
