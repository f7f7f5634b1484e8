//! Clip candidate models.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::segment::TranscriptSegment;
use crate::timestamp::format_seconds;

/// Generation strategy that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClipType {
    /// A single transcript segment
    Segment,
    /// Sliding combination of contiguous segments
    Combined,
    /// Natural-boundary (sentence) segmentation
    Sentence,
    /// Window anchored on a transition phrase
    TopicTransition,
    /// Window anchored on a question
    QuestionAnswer,
}

impl ClipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipType::Segment => "segment",
            ClipType::Combined => "combined",
            ClipType::Sentence => "sentence",
            ClipType::TopicTransition => "topic_transition",
            ClipType::QuestionAnswer => "question_answer",
        }
    }
}

impl fmt::Display for ClipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed clip span with score and metadata, prior to final selection.
///
/// Owns a copy of the concatenated segment text. `end - start == duration`
/// and `duration > 0` hold for every constructed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipCandidate {
    /// Concatenated text of the covered segments
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Heuristic score (multiplied by the topic boost when topics are given)
    pub score: f64,

    /// Strategy that produced this candidate
    pub clip_type: ClipType,

    /// Max similarity to the caller's topics, in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_similarity: Option<f64>,

    /// Composite quality score, in [0, 10]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<f64>,

    /// Whether the quality analyzer recommends this clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<bool>,
}

impl ClipCandidate {
    /// Create a candidate for `[start, end)`.
    pub fn new(
        text: impl Into<String>,
        start: f64,
        end: f64,
        score: f64,
        clip_type: ClipType,
    ) -> ModelResult<Self> {
        if !(start.is_finite() && end.is_finite()) || end <= start || start < 0.0 {
            return Err(ModelError::InvalidSpan { start, end });
        }

        Ok(Self {
            text: text.into(),
            start,
            end,
            duration: end - start,
            score: score.max(0.0),
            clip_type,
            topic_similarity: None,
            ai_score: None,
            recommended: None,
        })
    }

    /// Build a candidate covering a contiguous run of segments.
    ///
    /// Text is joined with single spaces. The span runs from the first
    /// segment's start to the last segment's end, gaps included.
    pub fn from_segments(
        segments: &[TranscriptSegment],
        clip_type: ClipType,
    ) -> ModelResult<Self> {
        let (first, last) = match (segments.first(), segments.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ModelError::InvalidSpan { start: 0.0, end: 0.0 }),
        };

        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self::new(text, first.start, last.end(), 0.0, clip_type)
    }

    /// Return a copy carrying a new score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score.max(0.0);
        self
    }

    /// Apply the topic boost `score * (1 + similarity)`.
    ///
    /// Similarity is clamped to [0, 1] so the boost can never lower a score.
    pub fn with_topic_similarity(mut self, similarity: f64) -> Self {
        let similarity = if similarity.is_finite() {
            similarity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.topic_similarity = Some(similarity);
        self.score *= 1.0 + similarity;
        self
    }

    /// Attach the quality analyzer verdict.
    pub fn with_quality(mut self, overall_score: f64, recommended: bool) -> Self {
        self.ai_score = Some(overall_score.clamp(0.0, 10.0));
        self.recommended = Some(recommended);
        self
    }

    /// Length of the intersection with another candidate, in seconds.
    pub fn intersection_secs(&self, other: &ClipCandidate) -> f64 {
        (self.end.min(other.end) - self.start.max(other.start)).max(0.0)
    }

    /// Short human-readable label, e.g. `00:01:05-00:01:40 (combined)`.
    pub fn label(&self) -> String {
        format!(
            "{}-{} ({})",
            format_seconds(self.start),
            format_seconds(self.end),
            self.clip_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_enforces_span() {
        let clip = ClipCandidate::new("text", 2.0, 8.0, 0.5, ClipType::Combined).unwrap();
        assert_eq!(clip.duration, 6.0);
        assert_eq!(clip.end - clip.start, clip.duration);

        assert!(ClipCandidate::new("text", 8.0, 8.0, 0.5, ClipType::Combined).is_err());
        assert!(ClipCandidate::new("text", 8.0, 2.0, 0.5, ClipType::Combined).is_err());
        assert!(ClipCandidate::new("text", f64::NAN, 2.0, 0.5, ClipType::Combined).is_err());
    }

    #[test]
    fn test_from_segments_joins_text() {
        let segments = vec![
            TranscriptSegment::new("Hello there.", 0.0, 2.0),
            TranscriptSegment::new("This is amazing.", 2.5, 3.0),
        ];
        let clip = ClipCandidate::from_segments(&segments, ClipType::Combined).unwrap();
        assert_eq!(clip.text, "Hello there. This is amazing.");
        assert_eq!(clip.start, 0.0);
        assert_eq!(clip.end, 5.5);
        assert_eq!(clip.duration, 5.5);
    }

    #[test]
    fn test_topic_boost_never_decreases() {
        let clip = ClipCandidate::new("t", 0.0, 10.0, 0.4, ClipType::Sentence).unwrap();
        assert_eq!(clip.clone().with_topic_similarity(-0.5).score, 0.4);
        assert!((clip.clone().with_topic_similarity(0.5).score - 0.6).abs() < 1e-9);
        assert!((clip.with_topic_similarity(3.0).score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_intersection() {
        let a = ClipCandidate::new("a", 0.0, 10.0, 0.9, ClipType::Combined).unwrap();
        let b = ClipCandidate::new("b", 2.0, 8.0, 0.95, ClipType::Combined).unwrap();
        let c = ClipCandidate::new("c", 12.0, 20.0, 0.5, ClipType::Combined).unwrap();
        assert_eq!(a.intersection_secs(&b), 6.0);
        assert_eq!(a.intersection_secs(&c), 0.0);
    }

    #[test]
    fn test_optional_fields_skipped_in_json() {
        let clip = ClipCandidate::new("a", 0.0, 10.0, 0.9, ClipType::QuestionAnswer).unwrap();
        let json = serde_json::to_string(&clip).unwrap();
        assert!(json.contains("\"clip_type\":\"question_answer\""));
        assert!(!json.contains("ai_score"));
    }
}
