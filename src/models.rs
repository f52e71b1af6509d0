use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier of a cycle record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One historical menstrual cycle, as logged by the user.
///
/// Field names on the wire follow the backend cycle-log format. Deserializing
/// always goes through [`crate::record::RawCycleRecord`] so malformed shapes are
/// rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "crate::record::RawCycleRecord")]
pub struct CycleRecord {
    pub id: RecordId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "cycle_length", skip_serializing_if = "Option::is_none")]
    pub cycle_length_days: Option<u32>,
    #[serde(rename = "period_length", skip_serializing_if = "Option::is_none")]
    pub period_length_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CycleRecord {
    pub fn new(id: RecordId, start_date: NaiveDate) -> Self {
        Self {
            id,
            start_date,
            end_date: None,
            cycle_length_days: None,
            period_length_days: None,
            symptoms: None,
            notes: None,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_cycle_length(mut self, days: u32) -> Self {
        self.cycle_length_days = Some(days);
        self
    }

    pub fn with_period_length(mut self, days: u32) -> Self {
        self.period_length_days = Some(days);
        self
    }

    /// Last day of logged flow. Falls back to the start day when the period is
    /// unterminated or the end date precedes the start.
    pub fn flow_end(&self) -> NaiveDate {
        match self.end_date {
            Some(end) if end >= self.start_date => end,
            _ => self.start_date,
        }
    }

    /// Whether `date` falls inside this record's logged flow range.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.flow_end()
    }
}

/// Average cycle and period lengths, rounded half-up to whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AveragesResult {
    pub average_cycle_length_days: u32,
    pub average_period_length_days: u32,
}

impl Default for AveragesResult {
    fn default() -> Self {
        Self {
            average_cycle_length_days: 28,
            average_period_length_days: 5,
        }
    }
}

/// Projected next period and fertile window. Every field is absent when there
/// is no history to project from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PredictionWindow {
    pub next_period_start: Option<NaiveDate>,
    pub next_period_end: Option<NaiveDate>,
    pub ovulation_day: Option<NaiveDate>,
    pub fertile_window_start: Option<NaiveDate>,
    pub fertile_window_end: Option<NaiveDate>,
}

impl PredictionWindow {
    pub fn is_defined(&self) -> bool {
        self.next_period_start.is_some()
    }

    pub fn in_next_period(&self, date: NaiveDate) -> bool {
        within(date, self.next_period_start, self.next_period_end)
    }

    pub fn in_fertile_window(&self, date: NaiveDate) -> bool {
        within(date, self.fertile_window_start, self.fertile_window_end)
    }
}

fn within(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => date >= start && date <= end,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayClassification {
    Period,
    Fertile,
    Safe,
    Unknown,
}

impl fmt::Display for DayClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayClassification::Period => "period",
            DayClassification::Fertile => "fertile",
            DayClassification::Safe => "safe",
            DayClassification::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Descriptive statistics for the history view. Averages here are not rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    pub total_cycles: usize,
    pub avg_cycle_length: Option<f32>,
    pub avg_period_length: Option<f32>,
    pub shortest_cycle: Option<u32>,
    pub longest_cycle: Option<u32>,
    pub cycle_length_std_dev: Option<f32>,
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
}

impl CycleStats {
    pub fn empty() -> Self {
        Self {
            total_cycles: 0,
            avg_cycle_length: None,
            avg_period_length: None,
            shortest_cycle: None,
            longest_cycle: None,
            cycle_length_std_dev: None,
            last_period_start: None,
            last_period_end: None,
        }
    }
}
