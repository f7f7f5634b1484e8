//! Pipeline thresholds.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::geometry::{AspectRatio, ReframePolicy};

/// Default minimum clip duration (seconds)
pub const DEFAULT_MIN_DURATION: f64 = 10.0;
/// Default maximum clip duration (seconds)
pub const DEFAULT_MAX_DURATION: f64 = 60.0;
/// Default overlap threshold
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.3;
/// Default quality threshold on the 0-10 scale
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 6.0;
/// Default number of clips for the fixed-count policy
pub const DEFAULT_TOP_N: usize = 5;
/// Number of clips returned when nothing meets the quality threshold
pub const THRESHOLD_FALLBACK_COUNT: usize = 3;

/// How the final clip set is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Keep the best `top_n` by score
    #[default]
    FixedCount,
    /// Keep everything at or above the quality threshold
    Threshold,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::FixedCount => write!(f, "fixed_count"),
            SelectionPolicy::Threshold => write!(f, "threshold"),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed_count" | "fixed" | "count" => Ok(SelectionPolicy::FixedCount),
            "threshold" | "quality" => Ok(SelectionPolicy::Threshold),
            other => Err(ModelError::invalid_config(format!(
                "unknown selection policy '{}'",
                other
            ))),
        }
    }
}

/// Thresholds passed explicitly into every pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// Minimum clip duration in seconds
    #[serde(default = "default_min_duration")]
    pub min_duration: f64,

    /// Maximum clip duration in seconds
    #[serde(default = "default_max_duration")]
    pub max_duration: f64,

    /// Maximum tolerated overlap ratio between accepted clips, in [0, 1]
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f64,

    /// Minimum composite quality for the threshold policy, in [0, 10]
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Number of clips for the fixed-count policy
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Selection policy
    #[serde(default)]
    pub selection: SelectionPolicy,

    /// Reframe policy for rendering
    #[serde(default)]
    pub reframe: ReframePolicy,

    /// Target aspect ratio for rendering
    #[serde(default)]
    pub target_aspect: AspectRatio,
}

fn default_min_duration() -> f64 {
    DEFAULT_MIN_DURATION
}
fn default_max_duration() -> f64 {
    DEFAULT_MAX_DURATION
}
fn default_overlap_threshold() -> f64 {
    DEFAULT_OVERLAP_THRESHOLD
}
fn default_quality_threshold() -> f64 {
    DEFAULT_QUALITY_THRESHOLD
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_duration: DEFAULT_MIN_DURATION,
            max_duration: DEFAULT_MAX_DURATION,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            selection: SelectionPolicy::default(),
            reframe: ReframePolicy::default(),
            target_aspect: AspectRatio::default(),
        }
    }
}

impl PipelineConfig {
    /// Builder-style setter for the duration window.
    pub fn with_durations(mut self, min_duration: f64, max_duration: f64) -> Self {
        self.min_duration = min_duration;
        self.max_duration = max_duration;
        self
    }

    /// Builder-style setter for the selection policy.
    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Reject invalid thresholds before any stage runs.
    pub fn validate(&self) -> ModelResult<()> {
        if !self.min_duration.is_finite() || self.min_duration <= 0.0 {
            return Err(ModelError::invalid_config(format!(
                "min_duration must be positive, got {}",
                self.min_duration
            )));
        }

        if !self.max_duration.is_finite() || self.max_duration <= 0.0 {
            return Err(ModelError::invalid_config(format!(
                "max_duration must be positive, got {}",
                self.max_duration
            )));
        }

        if self.min_duration > self.max_duration {
            return Err(ModelError::invalid_config(format!(
                "min_duration ({}) exceeds max_duration ({})",
                self.min_duration, self.max_duration
            )));
        }

        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(ModelError::invalid_config(format!(
                "overlap_threshold must be within [0, 1], got {}",
                self.overlap_threshold
            )));
        }

        if !(0.0..=10.0).contains(&self.quality_threshold) {
            return Err(ModelError::invalid_config(format!(
                "quality_threshold must be within [0, 10], got {}",
                self.quality_threshold
            )));
        }

        if self.selection == SelectionPolicy::FixedCount && self.top_n == 0 {
            return Err(ModelError::invalid_config("top_n must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_min_above_max_rejected() {
        let config = PipelineConfig::default().with_durations(30.0, 10.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds max_duration"));
    }

    #[test]
    fn test_threshold_ranges() {
        let mut config = PipelineConfig::default();
        config.overlap_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.quality_threshold = 11.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.top_n = 0;
        assert!(config.validate().is_err());
        config.selection = SelectionPolicy::Threshold;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_selection_policy_parse() {
        assert_eq!(
            "threshold".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::Threshold
        );
        assert_eq!(
            "FIXED_COUNT".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::FixedCount
        );
        assert!("best".parse::<SelectionPolicy>().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"min_duration": 3, "max_duration": 10}"#).unwrap();
        assert_eq!(config.min_duration, 3.0);
        assert_eq!(config.top_n, DEFAULT_TOP_N);
        assert_eq!(config.selection, SelectionPolicy::FixedCount);
    }
}
