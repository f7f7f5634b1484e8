//! Timed transcript segments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ModelError, ModelResult};

/// One timed caption line as delivered by a transcript provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Caption text
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End time in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    fn is_usable(&self) -> bool {
        !self.text.trim().is_empty()
            && self.duration.is_finite()
            && self.duration > 0.0
            && self.start.is_finite()
            && self.start >= 0.0
    }
}

/// Ordered, validated sequence of transcript segments.
///
/// Start times are monotonically non-decreasing and every segment has a
/// positive duration and non-empty text.
///
/// Deserializing goes through [`Transcript::new`], so the same rules hold
/// for JSON input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TranscriptSegment>", into = "Vec<TranscriptSegment>")]
pub struct Transcript {
    segments: Vec<TranscriptSegment>,
}

impl TryFrom<Vec<TranscriptSegment>> for Transcript {
    type Error = ModelError;

    fn try_from(segments: Vec<TranscriptSegment>) -> ModelResult<Self> {
        Self::new(segments)
    }
}

impl From<Transcript> for Vec<TranscriptSegment> {
    fn from(transcript: Transcript) -> Self {
        transcript.segments
    }
}

impl JsonSchema for Transcript {
    fn schema_name() -> String {
        "Transcript".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <Vec<TranscriptSegment>>::json_schema(gen)
    }
}

impl Transcript {
    /// Validate raw provider output.
    ///
    /// Segments with empty text or a non-positive duration are dropped.
    /// Out-of-order start times are rejected rather than re-sorted.
    pub fn new(segments: Vec<TranscriptSegment>) -> ModelResult<Self> {
        let mut kept: Vec<TranscriptSegment> = Vec::with_capacity(segments.len());
        let mut dropped = 0usize;

        for (index, mut segment) in segments.into_iter().enumerate() {
            if !segment.is_usable() {
                debug!(
                    index,
                    start = segment.start,
                    duration = segment.duration,
                    "Dropping unusable transcript segment"
                );
                dropped += 1;
                continue;
            }
            if let Some(previous) = kept.last() {
                if segment.start < previous.start {
                    return Err(ModelError::UnorderedSegments {
                        index,
                        start: segment.start,
                        previous: previous.start,
                    });
                }
            }
            segment.text = segment.text.trim().to_string();
            kept.push(segment);
        }

        if dropped > 0 {
            warn!(dropped, kept = kept.len(), "Dropped unusable transcript segments");
        }

        if kept.is_empty() {
            return Err(ModelError::EmptyTranscript);
        }

        Ok(Self { segments: kept })
    }

    /// Load a transcript from a JSON array of `{text, start, duration}`.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let segments: Vec<TranscriptSegment> = serde_json::from_str(json)?;
        Self::new(segments)
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total covered time from the first start to the last end.
    pub fn span_secs(&self) -> f64 {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => last.end() - first.start,
            _ => 0.0,
        }
    }

    /// Segments overlapping the half-open window `[start, end)`.
    pub fn overlapping(&self, start: f64, end: f64) -> impl Iterator<Item = &TranscriptSegment> {
        self.segments
            .iter()
            .filter(move |s| s.end() > start && s.start < end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_unusable_segments() {
        let transcript = Transcript::new(vec![
            TranscriptSegment::new("  Hello there. ", 0.0, 2.0),
            TranscriptSegment::new("", 2.0, 1.0),
            TranscriptSegment::new("zero", 3.0, 0.0),
            TranscriptSegment::new("The end.", 5.0, 1.5),
        ])
        .unwrap();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.segments()[0].text, "Hello there.");
        assert!((transcript.span_secs() - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_unordered_segments() {
        let err = Transcript::new(vec![
            TranscriptSegment::new("b", 5.0, 1.0),
            TranscriptSegment::new("a", 1.0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, ModelError::UnorderedSegments { index: 1, .. }));
    }

    #[test]
    fn test_empty_transcript_is_error() {
        assert!(matches!(
            Transcript::new(vec![]),
            Err(ModelError::EmptyTranscript)
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{"text":"Hello there.","start":0,"duration":2},
                       {"text":"The end.","start":2,"duration":1.5}]"#;
        let transcript = Transcript::from_json(json).unwrap();
        assert_eq!(transcript.len(), 2);
        assert!((transcript.segments()[1].end() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_validates() {
        let unordered = r#"[{"text":"b","start":5,"duration":1},{"text":"a","start":1,"duration":1}]"#;
        assert!(serde_json::from_str::<Transcript>(unordered).is_err());
        assert!(serde_json::from_str::<Transcript>(r#"[{"text":"","start":0,"duration":1}]"#).is_err());

        let transcript: Transcript = serde_json::from_str(
            r#"[{"text":" ok ","start":0,"duration":1},{"text":"zero","start":1,"duration":0}]"#,
        )
        .unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.segments()[0].text, "ok");

        let round: serde_json::Value = serde_json::to_value(&transcript).unwrap();
        assert!(round.is_array());
    }

    #[test]
    fn test_overlapping_window() {
        let transcript = Transcript::new(vec![
            TranscriptSegment::new("a", 0.0, 2.0),
            TranscriptSegment::new("b", 2.0, 2.0),
            TranscriptSegment::new("c", 4.0, 2.0),
        ])
        .unwrap();
        let texts: Vec<&str> = transcript
            .overlapping(1.0, 4.0)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
