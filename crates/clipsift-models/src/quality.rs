//! Quality assessment models.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Axis weights for the composite: viral potential, coherence, engagement,
/// technical quality, hook strength.
pub const AXIS_WEIGHTS: [f64; 5] = [0.30, 0.25, 0.25, 0.10, 0.10];

/// Upper bound of every axis and of the composite.
pub const MAX_AXIS_SCORE: f64 = 10.0;

/// Composite score at or above which a clip is recommended.
pub const RECOMMEND_THRESHOLD: f64 = 5.0;

/// Per-axis quality scores, each in [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AxisScores {
    pub viral_potential: f64,
    pub coherence: f64,
    pub engagement: f64,
    pub technical_quality: f64,
    pub hook_strength: f64,
}

impl AxisScores {
    fn as_array(&self) -> [(&'static str, f64); 5] {
        [
            ("viral_potential", self.viral_potential),
            ("coherence", self.coherence),
            ("engagement", self.engagement),
            ("technical_quality", self.technical_quality),
            ("hook_strength", self.hook_strength),
        ]
    }

    /// Reject values outside [0, 10] or non-finite.
    pub fn validate(&self) -> ModelResult<()> {
        for (name, value) in self.as_array() {
            if !value.is_finite() || !(0.0..=MAX_AXIS_SCORE).contains(&value) {
                return Err(ModelError::ScoreOutOfRange(format!("{} = {}", name, value)));
            }
        }
        Ok(())
    }

    /// Clamp every axis into [0, 10]. Non-finite values become 0.
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| {
            if v.is_finite() {
                v.clamp(0.0, MAX_AXIS_SCORE)
            } else {
                0.0
            }
        };
        Self {
            viral_potential: clamp(self.viral_potential),
            coherence: clamp(self.coherence),
            engagement: clamp(self.engagement),
            technical_quality: clamp(self.technical_quality),
            hook_strength: clamp(self.hook_strength),
        }
    }

    /// Weighted composite of the five axes.
    pub fn composite(&self) -> f64 {
        self.as_array()
            .iter()
            .zip(AXIS_WEIGHTS)
            .map(|((_, value), weight)| value * weight)
            .sum()
    }
}

/// Which analyzer produced an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerSource {
    ExternalJudge,
    Heuristic,
}

impl fmt::Display for AnalyzerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerSource::ExternalJudge => write!(f, "external_judge"),
            AnalyzerSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Quality verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QualityAssessment {
    pub axes: AxisScores,

    /// Composite in [0, 10]
    pub overall_score: f64,

    pub recommended: bool,

    pub source: AnalyzerSource,

    /// Free-text rationale from the judge, when it gave one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Why the external judge was not used for this candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl QualityAssessment {
    /// Assessment whose overall score is the plain weighted composite.
    pub fn from_axes(axes: AxisScores, source: AnalyzerSource) -> Self {
        Self::with_overall(axes, axes.composite(), source)
    }

    /// Assessment with an explicit overall score, clamped to [0, 10].
    pub fn with_overall(axes: AxisScores, overall: f64, source: AnalyzerSource) -> Self {
        let overall_score = if overall.is_finite() {
            overall.clamp(0.0, MAX_AXIS_SCORE)
        } else {
            0.0
        };
        Self {
            axes: axes.clamped(),
            overall_score,
            recommended: overall_score >= RECOMMEND_THRESHOLD,
            source,
            explanation: None,
            fallback_reason: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_fallback_reason(mut self, reason: impl Into<String>) -> Self {
        self.fallback_reason = Some(reason.into());
        self
    }
}

/// Source metadata handed to the quality analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,

    #[serde(default)]
    pub topics: Vec<String>,
}

impl AnalysisContext {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.source_title = Some(title.into());
        self
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(v: f64) -> AxisScores {
        AxisScores {
            viral_potential: v,
            coherence: v,
            engagement: v,
            technical_quality: v,
            hook_strength: v,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum: f64 = AXIS_WEIGHTS.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!((axes(7.0).composite() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_range() {
        assert!(axes(10.0).validate().is_ok());
        assert!(axes(10.5).validate().is_err());
        assert!(axes(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_assessment_clamps_and_recommends() {
        let a = QualityAssessment::with_overall(axes(4.0), 12.0, AnalyzerSource::Heuristic);
        assert_eq!(a.overall_score, 10.0);
        assert!(a.recommended);

        let b = QualityAssessment::from_axes(axes(4.9), AnalyzerSource::ExternalJudge);
        assert!(!b.recommended);
    }
}
