use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub flow: FlowConfig,
}

/// Tunables for averaging and projection.
///
/// The fertile window is a heuristic: ovulation is placed at the cycle
/// midpoint before the predicted period and the window spans
/// `fertile_days_before_ovulation` days before it through
/// `fertile_days_after_ovulation` days after. Not a clinical model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub default_cycle_length_days: u32,
    pub default_period_length_days: u32,
    pub fertile_days_before_ovulation: u32,
    pub fertile_days_after_ovulation: u32,
    /// Average only the N most recent records. `None` uses all of them.
    pub history_limit: Option<usize>,
    pub upcoming_periods: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            default_cycle_length_days: 28,
            default_period_length_days: 5,
            fertile_days_before_ovulation: 5,
            fertile_days_after_ovulation: 1,
            history_limit: None,
            upcoming_periods: 3,
        }
    }
}

/// Grouping rules for turning daily flow logs into cycle records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Flow days at most this far apart belong to the same period.
    pub max_gap_days: u32,
    /// A final period whose last flow day is this close to today is still ongoing.
    pub ongoing_grace_days: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_gap_days: 2,
            ongoing_grace_days: 2,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prediction.validate()?;
        if self.flow.max_gap_days == 0 {
            return Err(ConfigError::Invalid("flow.max_gap_days must be at least 1"));
        }
        Ok(())
    }
}

impl PredictionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_cycle_length_days == 0 {
            return Err(ConfigError::Invalid(
                "prediction.default_cycle_length_days must be at least 1",
            ));
        }
        if self.default_period_length_days == 0 {
            return Err(ConfigError::Invalid(
                "prediction.default_period_length_days must be at least 1",
            ));
        }
        if self.history_limit == Some(0) {
            return Err(ConfigError::Invalid("prediction.history_limit must be at least 1"));
        }
        Ok(())
    }
}
