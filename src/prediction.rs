use chrono::{Duration, NaiveDate};
use tracing::warn;

use crate::config::PredictionConfig;
use crate::models::{AveragesResult, CycleRecord, PredictionWindow};

/// Project the next period and fertile window from the most recent record,
/// using the default fertile-window tunables.
pub fn predict_next_window(records: &[CycleRecord], averages: &AveragesResult) -> PredictionWindow {
    predict_next_window_with(records, averages, &PredictionConfig::default())
}

/// The most recent record is the one with the latest start date, whatever
/// order `records` arrives in.
pub fn predict_next_window_with(
    records: &[CycleRecord],
    averages: &AveragesResult,
    config: &PredictionConfig,
) -> PredictionWindow {
    let Some(last) = records.iter().max_by_key(|r| r.start_date) else {
        return PredictionWindow::default();
    };

    let next_start = shift(last.start_date, i64::from(averages.average_cycle_length_days));
    next_start
        .and_then(|start| window_starting(start, averages, config))
        .unwrap_or_else(|| {
            warn!(last_start = %last.start_date, "projected window out of calendar range");
            PredictionWindow::default()
        })
}

/// The next `config.upcoming_periods` projected windows, one cycle apart.
pub fn upcoming_windows(
    records: &[CycleRecord],
    averages: &AveragesResult,
    config: &PredictionConfig,
) -> Vec<PredictionWindow> {
    let first = predict_next_window_with(records, averages, config);
    if !first.is_defined() {
        return Vec::new();
    }

    let cycle = i64::from(averages.average_cycle_length_days);
    let mut windows = Vec::with_capacity(config.upcoming_periods);
    let mut current = Some(first);
    while let Some(window) = current {
        if windows.len() >= config.upcoming_periods {
            break;
        }
        windows.push(window);
        current = window
            .next_period_start
            .and_then(|start| shift(start, cycle))
            .and_then(|start| window_starting(start, averages, config));
    }
    windows
}

/// Build the full window for a period predicted to start on `next_start`.
///
/// Ovulation is placed `round(cycle / 2)` days before the period, a midpoint
/// heuristic rather than a clinical estimate.
fn window_starting(
    next_start: NaiveDate,
    averages: &AveragesResult,
    config: &PredictionConfig,
) -> Option<PredictionWindow> {
    let period = i64::from(averages.average_period_length_days.max(1));
    let next_end = shift(next_start, period - 1)?;
    let ovulation = shift(next_start, -ovulation_offset(averages.average_cycle_length_days))?;
    let fertile_start = shift(ovulation, -i64::from(config.fertile_days_before_ovulation))?;
    let fertile_end = shift(ovulation, i64::from(config.fertile_days_after_ovulation))?;

    Some(PredictionWindow {
        next_period_start: Some(next_start),
        next_period_end: Some(next_end),
        ovulation_day: Some(ovulation),
        fertile_window_start: Some(fertile_start),
        fertile_window_end: Some(fertile_end),
    })
}

fn ovulation_offset(cycle_length_days: u32) -> i64 {
    (i64::from(cycle_length_days) + 1) / 2
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}
