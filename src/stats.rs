use crate::config::PredictionConfig;
use crate::models::{AveragesResult, CycleRecord, CycleStats};
use crate::record::recent_first_order;

/// Average cycle and period length over the recorded day counts, using the
/// default fallbacks (28 / 5).
pub fn compute_averages(records: &[CycleRecord]) -> AveragesResult {
    compute_averages_with(records, &PredictionConfig::default())
}

/// Cycle length and period length are averaged independently, each from its
/// own recorded field, each falling back to its configured default.
pub fn compute_averages_with(records: &[CycleRecord], config: &PredictionConfig) -> AveragesResult {
    let recent = recent_first(records, config.history_limit);

    let cycle_lengths: Vec<u32> = recent
        .iter()
        .filter_map(|r| r.cycle_length_days)
        .filter(|&d| d > 0)
        .collect();
    let period_lengths: Vec<u32> = recent
        .iter()
        .filter_map(|r| r.period_length_days)
        .filter(|&d| d > 0)
        .collect();

    AveragesResult {
        average_cycle_length_days: rounded_mean(&cycle_lengths)
            .unwrap_or(config.default_cycle_length_days),
        average_period_length_days: rounded_mean(&period_lengths)
            .unwrap_or(config.default_period_length_days),
    }
}

/// Descriptive statistics for the history view.
pub fn cycle_stats(records: &[CycleRecord]) -> CycleStats {
    if records.is_empty() {
        return CycleStats::empty();
    }

    let mut chronological: Vec<&CycleRecord> = records.iter().collect();
    chronological.sort_by_key(|r| r.start_date);

    let cycle_lengths = observed_cycle_lengths(&chronological);
    let period_lengths: Vec<u32> = chronological
        .iter()
        .filter_map(|r| observed_period_length(r))
        .collect();
    let cycle_values: Vec<f64> = cycle_lengths.iter().map(|&d| f64::from(d)).collect();
    let period_values: Vec<f64> = period_lengths.iter().map(|&d| f64::from(d)).collect();

    let last = chronological[chronological.len() - 1];

    CycleStats {
        total_cycles: chronological.len(),
        avg_cycle_length: mean(&cycle_values).map(|v| v as f32),
        avg_period_length: mean(&period_values).map(|v| v as f32),
        shortest_cycle: cycle_lengths.iter().copied().min(),
        longest_cycle: cycle_lengths.iter().copied().max(),
        cycle_length_std_dev: std_deviation(&cycle_values).map(|v| v as f32),
        last_period_start: Some(last.start_date),
        last_period_end: last.end_date,
    }
}

/// How regular the history is, from 0.1 (erratic) to 0.95 (very regular).
/// A single observed cycle gives 0.5.
pub fn prediction_confidence(records: &[CycleRecord]) -> Option<f32> {
    if records.is_empty() {
        return None;
    }

    let mut chronological: Vec<&CycleRecord> = records.iter().collect();
    chronological.sort_by_key(|r| r.start_date);
    let lengths: Vec<f64> = observed_cycle_lengths(&chronological)
        .into_iter()
        .map(f64::from)
        .collect();

    match (mean(&lengths), std_deviation(&lengths)) {
        (Some(avg), Some(std_dev)) if avg > 0.0 => {
            Some((1.0 - (std_dev / avg) as f32).clamp(0.1, 0.95))
        }
        _ => Some(0.5),
    }
}

/// Records ordered most recent first (ties by id), optionally cut to the
/// newest `limit`.
pub(crate) fn recent_first(records: &[CycleRecord], limit: Option<usize>) -> Vec<&CycleRecord> {
    let mut sorted: Vec<&CycleRecord> = records.iter().collect();
    sorted.sort_by(|a, b| recent_first_order(a, b));
    if let Some(limit) = limit {
        sorted.truncate(limit);
    }
    sorted
}

/// Recorded cycle length, else the gap to the next record's start.
/// Expects chronological order.
fn observed_cycle_lengths(chronological: &[&CycleRecord]) -> Vec<u32> {
    chronological
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            record.cycle_length_days.filter(|&d| d > 0).or_else(|| {
                let next = chronological.get(i + 1)?;
                let gap = (next.start_date - record.start_date).num_days();
                u32::try_from(gap).ok().filter(|&d| d > 0)
            })
        })
        .collect()
}

/// Recorded period length, else the inclusive logged flow span.
fn observed_period_length(record: &CycleRecord) -> Option<u32> {
    record.period_length_days.filter(|&d| d > 0).or_else(|| {
        let end = record.end_date.filter(|&end| end >= record.start_date)?;
        u32::try_from((end - record.start_date).num_days() + 1).ok()
    })
}

/// Mean rounded half-up, in integer arithmetic.
fn rounded_mean(values: &[u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    let n = values.len() as u64;
    u32::try_from((2 * sum + n) / (2 * n)).ok()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn std_deviation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_record(start: &str, cycle: Option<u32>, period: Option<u32>) -> CycleRecord {
        CycleRecord {
            cycle_length_days: cycle,
            period_length_days: period,
            ..CycleRecord::new(RecordId::generate(), date(start))
        }
    }

    #[test]
    fn empty_history_uses_defaults() {
        let averages = compute_averages(&[]);
        assert_eq!(averages.average_cycle_length_days, 28);
        assert_eq!(averages.average_period_length_days, 5);
    }

    #[test]
    fn averages_cycle_lengths() {
        let records = vec![
            make_record("2024-03-01", Some(28), None),
            make_record("2024-02-01", Some(30), None),
            make_record("2024-01-01", Some(26), None),
        ];
        assert_eq!(compute_averages(&records).average_cycle_length_days, 28);
    }

    #[test]
    fn period_length_averaged_from_its_own_field() {
        let records = vec![
            make_record("2024-02-01", Some(30), Some(4)),
            make_record("2024-01-01", Some(32), Some(6)),
        ];
        let averages = compute_averages(&records);
        assert_eq!(averages.average_cycle_length_days, 31);
        assert_eq!(averages.average_period_length_days, 5);

        let no_periods = vec![make_record("2024-01-01", Some(35), None)];
        assert_eq!(compute_averages(&no_periods).average_period_length_days, 5);
    }

    #[test]
    fn rounds_half_up() {
        let records = vec![
            make_record("2024-02-01", Some(28), Some(3)),
            make_record("2024-01-01", Some(29), Some(4)),
        ];
        let averages = compute_averages(&records);
        assert_eq!(averages.average_cycle_length_days, 29);
        assert_eq!(averages.average_period_length_days, 4);
    }

    #[test]
    fn zero_lengths_are_ignored() {
        let records = vec![
            make_record("2024-02-01", Some(0), Some(0)),
            make_record("2024-01-01", Some(30), None),
        ];
        let averages = compute_averages(&records);
        assert_eq!(averages.average_cycle_length_days, 30);
        assert_eq!(averages.average_period_length_days, 5);
    }

    #[test]
    fn history_limit_keeps_most_recent() {
        let records = vec![
            make_record("2024-01-01", Some(40), None),
            make_record("2024-03-01", Some(26), None),
            make_record("2024-02-01", Some(28), None),
        ];
        let config = PredictionConfig {
            history_limit: Some(2),
            ..PredictionConfig::default()
        };
        assert_eq!(compute_averages_with(&records, &config).average_cycle_length_days, 27);
    }

    #[test]
    fn history_limit_cut_ignores_input_order_on_ties() {
        let tied = |id: &str, cycle: u32| CycleRecord {
            cycle_length_days: Some(cycle),
            ..CycleRecord::new(RecordId::new(id), date("2024-02-01"))
        };
        let forward = vec![
            make_record("2024-03-01", Some(26), None),
            tied("a", 30),
            tied("b", 40),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        let config = PredictionConfig {
            history_limit: Some(2),
            ..PredictionConfig::default()
        };
        let expected = compute_averages_with(&forward, &config);
        assert_eq!(expected.average_cycle_length_days, 28);
        assert_eq!(compute_averages_with(&backward, &config), expected);
    }

    #[test]
    fn configured_fallbacks() {
        let config = PredictionConfig {
            default_cycle_length_days: 30,
            default_period_length_days: 4,
            ..PredictionConfig::default()
        };
        let averages = compute_averages_with(&[], &config);
        assert_eq!(averages.average_cycle_length_days, 30);
        assert_eq!(averages.average_period_length_days, 4);
    }

    #[test]
    fn cycle_stats_computed() {
        let records = vec![
            make_record("2026-01-29", None, None).with_end_date(date("2026-02-02")),
            make_record("2026-01-01", None, None).with_end_date(date("2026-01-05")),
        ];
        let stats = cycle_stats(&records);
        assert_eq!(stats.total_cycles, 2);
        assert_eq!(stats.avg_cycle_length, Some(28.0));
        assert_eq!(stats.avg_period_length, Some(5.0));
        assert_eq!(stats.shortest_cycle, Some(28));
        assert_eq!(stats.cycle_length_std_dev, None);
        assert_eq!(stats.last_period_start, Some(date("2026-01-29")));
        assert_eq!(stats.last_period_end, Some(date("2026-02-02")));
    }

    #[test]
    fn recorded_lengths_win_over_gaps() {
        let records = vec![
            make_record("2024-03-01", None, Some(3)),
            make_record("2024-01-30", Some(31), None).with_end_date(date("2024-02-03")),
        ];
        let stats = cycle_stats(&records);
        assert_eq!(stats.shortest_cycle, Some(31));
        assert_eq!(stats.longest_cycle, Some(31));
        assert_eq!(stats.avg_period_length, Some(4.0));
    }

    #[test]
    fn cycle_stats_empty() {
        assert_eq!(cycle_stats(&[]), CycleStats::empty());
    }

    #[test]
    fn confidence_tracks_regularity() {
        assert_eq!(prediction_confidence(&[]), None);

        let single = vec![make_record("2024-01-01", Some(28), None)];
        assert_eq!(prediction_confidence(&single), Some(0.5));

        let regular = vec![
            make_record("2024-01-01", Some(28), None),
            make_record("2024-01-29", Some(28), None),
            make_record("2024-02-26", Some(28), None),
        ];
        assert_eq!(prediction_confidence(&regular), Some(0.95));

        let erratic = vec![
            make_record("2024-01-01", Some(20), None),
            make_record("2024-01-21", Some(45), None),
            make_record("2024-03-06", Some(22), None),
        ];
        let confidence = prediction_confidence(&erratic).unwrap();
        assert!(confidence < 0.7, "confidence was {confidence}");
    }
}
