//! Derive cycle records from daily flow logs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::FlowConfig;
use crate::models::{CycleRecord, RecordId};
use crate::record::sort_recent_first;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlowLevel {
    None,
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayLog {
    pub date: NaiveDate,
    pub flow_level: FlowLevel,
    #[serde(default)]
    pub notes: String,
}

/// Group flow days into periods and turn each into a [`CycleRecord`].
///
/// Closed periods get a `period_length_days`; every period but the latest gets
/// a `cycle_length_days` measured to the next start. The latest period stays
/// open when its last flow day is within the grace window of `today`.
pub fn records_from_day_logs(
    logs: &[DayLog],
    today: NaiveDate,
    config: &FlowConfig,
) -> Vec<CycleRecord> {
    let mut flow_days: Vec<NaiveDate> = logs
        .iter()
        .filter(|l| l.flow_level != FlowLevel::None)
        .map(|l| l.date)
        .collect();
    flow_days.sort();
    flow_days.dedup();

    let Some((&first, rest)) = flow_days.split_first() else {
        return Vec::new();
    };

    let mut spans: Vec<(NaiveDate, NaiveDate)> = Vec::new();
    let (mut span_start, mut span_end) = (first, first);
    for &day in rest {
        if (day - span_end).num_days() <= i64::from(config.max_gap_days) {
            span_end = day;
        } else {
            spans.push((span_start, span_end));
            span_start = day;
            span_end = day;
        }
    }
    spans.push((span_start, span_end));

    let last_index = spans.len() - 1;
    let mut records: Vec<CycleRecord> = spans
        .iter()
        .enumerate()
        .map(|(i, &(start, end))| {
            let ongoing = i == last_index
                && (today - end).num_days() <= i64::from(config.ongoing_grace_days);
            let mut record = CycleRecord::new(RecordId::generate(), start);
            if !ongoing {
                record.end_date = Some(end);
                record.period_length_days = days_between(start, end).map(|d| d + 1);
            }
            record.cycle_length_days = spans
                .get(i + 1)
                .and_then(|&(next_start, _)| days_between(start, next_start));
            record.notes = joined_notes(logs, start, end);
            record
        })
        .collect();

    sort_recent_first(&mut records);
    records
}

fn days_between(from: NaiveDate, to: NaiveDate) -> Option<u32> {
    u32::try_from((to - from).num_days()).ok()
}

fn joined_notes(logs: &[DayLog], start: NaiveDate, end: NaiveDate) -> Option<String> {
    let mut in_span: Vec<&DayLog> = logs
        .iter()
        .filter(|l| l.date >= start && l.date <= end && !l.notes.trim().is_empty())
        .collect();
    in_span.sort_by_key(|l| l.date);

    let notes: Vec<&str> = in_span.iter().map(|l| l.notes.trim()).collect();
    if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    }
}
