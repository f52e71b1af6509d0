use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{self, CalendarError, MonthView};
use crate::classify::classify_date;
use crate::config::EngineConfig;
use crate::models::{AveragesResult, CycleRecord, CycleStats, DayClassification, PredictionWindow};
use crate::prediction::{predict_next_window_with, upcoming_windows};
use crate::stats::{compute_averages_with, cycle_stats, prediction_confidence};
use crate::storage::{RecordSource, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Everything derived from one history snapshot. The averages are computed
/// once and the predictions are built from exactly those values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub averages: AveragesResult,
    pub window: PredictionWindow,
    pub upcoming: Vec<PredictionWindow>,
    pub stats: CycleStats,
    pub confidence: Option<f32>,
}

impl Forecast {
    pub fn compute(records: &[CycleRecord], config: &EngineConfig) -> Self {
        let averages = compute_averages_with(records, &config.prediction);
        Self {
            window: predict_next_window_with(records, &averages, &config.prediction),
            upcoming: upcoming_windows(records, &averages, &config.prediction),
            stats: cycle_stats(records),
            confidence: prediction_confidence(records),
            averages,
        }
    }
}

/// Runs the engine over whatever a [`RecordSource`] currently holds. Nothing
/// is cached: every call reloads and recomputes.
pub struct CycleTracker<S> {
    source: S,
    config: EngineConfig,
}

impl<S: RecordSource> CycleTracker<S> {
    pub fn new(source: S, config: EngineConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn records(&self) -> Result<Vec<CycleRecord>, TrackerError> {
        let records = self.source.load_records()?;
        debug!(count = records.len(), "loaded cycle history");
        Ok(records)
    }

    pub fn forecast(&self) -> Result<Forecast, TrackerError> {
        let records = self.records()?;
        Ok(Forecast::compute(&records, &self.config))
    }

    pub fn classify(&self, date: NaiveDate) -> Result<DayClassification, TrackerError> {
        let records = self.records()?;
        let averages = compute_averages_with(&records, &self.config.prediction);
        let window = predict_next_window_with(&records, &averages, &self.config.prediction);
        Ok(classify_date(date, &records, &window))
    }

    pub fn month(&self, year: i32, month: u32) -> Result<MonthView, TrackerError> {
        let records = self.records()?;
        Ok(calendar::month_view(year, month, &records, &self.config.prediction)?)
    }
}
