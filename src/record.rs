//! Boundary parsing of backend cycle logs into [`CycleRecord`]s.
//!
//! Shape problems (no id, no start date, unreadable dates) fail here with
//! [`RecordError::InvalidRecordShape`] so the engine never sees them. Soft
//! problems in user-entered lengths are coerced to "absent" instead.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{CycleRecord, RecordId};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed cycle log payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid record shape at index {index}: {source}")]
    InvalidRecordShape { index: usize, source: ShapeError },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("missing id")]
    MissingId,
    #[error("missing start_date")]
    MissingStartDate,
    #[error("{field} is not a date: {value:?}")]
    InvalidDate { field: &'static str, value: String },
}

/// Cycle log as the backend sends it. Every field is optional here; the
/// conversion into [`CycleRecord`] decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCycleRecord {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
    #[serde(default, alias = "cycleLength", alias = "cycleLengthDays")]
    pub cycle_length: Option<f64>,
    #[serde(default, alias = "periodLength", alias = "periodLengthDays")]
    pub period_length: Option<f64>,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Backends hand out both numeric and string ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl TryFrom<RawCycleRecord> for CycleRecord {
    type Error = ShapeError;

    fn try_from(raw: RawCycleRecord) -> Result<Self, Self::Error> {
        let id = match raw.id {
            Some(RawId::Number(n)) => RecordId::new(n.to_string()),
            Some(RawId::Text(s)) => RecordId::new(s),
            None => return Err(ShapeError::MissingId),
        };
        if id.is_blank() {
            return Err(ShapeError::MissingId);
        }

        let start_date = match non_blank(raw.start_date) {
            Some(value) => parse_date("start_date", &value)?,
            None => return Err(ShapeError::MissingStartDate),
        };
        let end_date = non_blank(raw.end_date)
            .map(|value| parse_date("end_date", &value))
            .transpose()?;

        if let Some(end) = end_date {
            if end < start_date {
                warn!(
                    %id,
                    %start_date,
                    %end,
                    "end_date precedes start_date; using start day only"
                );
            }
        }

        Ok(CycleRecord {
            cycle_length_days: day_count(&id, "cycle_length", raw.cycle_length),
            period_length_days: day_count(&id, "period_length", raw.period_length),
            id,
            start_date,
            end_date,
            symptoms: raw.symptoms,
            notes: raw.notes,
        })
    }
}

/// Parse a JSON array of backend cycle logs, most recent first.
pub fn parse_records(json: &str) -> Result<Vec<CycleRecord>, RecordError> {
    let raw: Vec<RawCycleRecord> = serde_json::from_str(json)?;
    let mut records = raw
        .into_iter()
        .enumerate()
        .map(|(index, r)| {
            CycleRecord::try_from(r)
                .map_err(|source| RecordError::InvalidRecordShape { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    sort_recent_first(&mut records);
    debug!(count = records.len(), "parsed cycle records");
    Ok(records)
}

/// Re-check the shape rules on records built in code rather than parsed, so
/// nothing is persisted that [`parse_records`] would refuse to read back.
pub fn check_shapes(records: &[CycleRecord]) -> Result<(), RecordError> {
    match records.iter().position(|r| r.id.is_blank()) {
        Some(index) => Err(RecordError::InvalidRecordShape {
            index,
            source: ShapeError::MissingId,
        }),
        None => Ok(()),
    }
}

/// Sort descending by start date, ties broken by id.
pub fn sort_recent_first(records: &mut [CycleRecord]) {
    records.sort_by(recent_first_order);
}

pub(crate) fn recent_first_order(a: &CycleRecord, b: &CycleRecord) -> Ordering {
    b.start_date
        .cmp(&a.start_date)
        .then_with(|| a.id.cmp(&b.id))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ShapeError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| ShapeError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

/// User-entered day counts: non-finite, zero or negative values are dropped,
/// fractional ones rounded half-up.
fn day_count(id: &RecordId, field: &str, value: Option<f64>) -> Option<u32> {
    let value = value?;
    if !value.is_finite() || value <= 0.0 {
        warn!(%id, field, value, "ignoring non-positive day count");
        return None;
    }
    let rounded = (value + 0.5).floor();
    if rounded < 1.0 || rounded > f64::from(u32::MAX) {
        warn!(%id, field, value, "ignoring out-of-range day count");
        return None;
    }
    Some(rounded as u32)
}
