//! Run identity and the per-run report.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique run identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcript,
    Generate,
    Overlap,
    TopicFilter,
    Quality,
    Select,
    Probe,
    Render,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcript => "transcript",
            Stage::Generate => "generate",
            Stage::Overlap => "overlap",
            Stage::TopicFilter => "topic_filter",
            Stage::Quality => "quality",
            Stage::Select => "select",
            Stage::Probe => "probe",
            Stage::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recoverable failure that degraded part of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StageFailure {
    pub stage: Stage,

    /// What failed, e.g. a candidate label or an output file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    pub reason: String,
}

impl StageFailure {
    pub fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            subject: None,
            reason: reason.into(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Counts and failures for one run, written next to the rendered clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    pub segments: usize,
    pub generated: usize,
    pub deduplicated: usize,
    pub topic_boosted: usize,
    pub judged: usize,
    pub judge_fallbacks: usize,
    pub selected: usize,
    pub rendered: usize,
    pub render_failures: usize,

    #[serde(default)]
    pub failures: Vec<StageFailure>,
}

impl RunReport {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            segments: 0,
            generated: 0,
            deduplicated: 0,
            topic_boosted: 0,
            judged: 0,
            judge_fallbacks: 0,
            selected: 0,
            rendered: 0,
            render_failures: 0,
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, failure: StageFailure) {
        self.failures.push(failure);
    }

    pub fn failures_for(&self, stage: Stage) -> impl Iterator<Item = &StageFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock run duration, once finished.
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_failures_by_stage() {
        let mut report = RunReport::new(RunId::new());
        report.record_failure(StageFailure::new(Stage::Quality, "timeout").with_subject("clip 1"));
        report.record_failure(StageFailure::new(Stage::Render, "ffmpeg exited 1"));

        assert_eq!(report.failures_for(Stage::Quality).count(), 1);
        assert_eq!(report.failures_for(Stage::TopicFilter).count(), 0);
        assert!(report.elapsed_secs().is_none());

        report.finish();
        assert!(report.elapsed_secs().unwrap() >= 0.0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failures"][0]["stage"], "quality");
    }
}
