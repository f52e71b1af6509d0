//! Cycle prediction engine.
//!
//! Takes a history of [`CycleRecord`]s and derives average lengths, the next
//! predicted period and fertile window, and a per-day classification for
//! calendar views. The three core steps are pure functions:
//!
//! ```
//! use chrono::NaiveDate;
//! use cycle_forecast::{
//!     classify_date, compute_averages, predict_next_window, CycleRecord, RecordId,
//! };
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let records = vec![CycleRecord::new(RecordId::new("1"), start)];
//!
//! let averages = compute_averages(&records);
//! let window = predict_next_window(&records, &averages);
//! assert_eq!(window.next_period_start, NaiveDate::from_ymd_opt(2024, 1, 29));
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
//! assert_eq!(classify_date(day, &records, &window).to_string(), "fertile");
//! ```
//!
//! Fertile-window output is a midpoint heuristic, not a clinical model.

pub mod calendar;
pub mod classify;
pub mod config;
pub mod crypto;
pub mod flow;
pub mod models;
pub mod prediction;
pub mod record;
pub mod stats;
pub mod storage;
pub mod tracker;

pub use calendar::{month_view, CalendarError, DayCell, MonthView};
pub use classify::{classify_date, classify_range};
pub use config::{ConfigError, EngineConfig, FlowConfig, PredictionConfig};
pub use models::{
    AveragesResult, CycleRecord, CycleStats, DayClassification, PredictionWindow, RecordId,
};
pub use prediction::{predict_next_window, predict_next_window_with, upcoming_windows};
pub use record::{parse_records, RecordError, ShapeError};
pub use stats::{compute_averages, compute_averages_with, cycle_stats, prediction_confidence};
pub use storage::{JsonExportSource, RecordSource, StorageError, Vault};
pub use tracker::{CycleTracker, Forecast, TrackerError};
