//! Tunable scoring constants and lexicons.
//!
//! Every multiplicative factor and word list used by the heuristic scorer,
//! the candidate generator and the heuristic quality fallback lives here so
//! that it can be overridden from a JSON profile instead of being baked in.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidate::ClipType;
use crate::error::ModelResult;

/// Lowercase word tokens of `text`, with surrounding punctuation stripped.
///
/// Apostrophes inside words are kept (`here's`, `don't`).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.replace('\u{2019}', "'")
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .trim_matches('\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// True if `text` ends in sentence-terminal punctuation.
///
/// Closing quotes and brackets after the punctuation are ignored.
pub fn ends_with_terminal(text: &str) -> bool {
    text.trim_end()
        .trim_end_matches(|c: char| matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}'))
        .ends_with(['.', '!', '?'])
}

/// A fixed list of words and multi-word phrases.
///
/// Terms are normalized like text (lowercase, no surrounding punctuation),
/// including terms read from a JSON profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Lexicon {
    terms: Vec<String>,
}

impl From<Vec<String>> for Lexicon {
    fn from(terms: Vec<String>) -> Self {
        Self::new(terms)
    }
}

impl From<Lexicon> for Vec<String> {
    fn from(lexicon: Lexicon) -> Self {
        lexicon.terms
    }
}

impl JsonSchema for Lexicon {
    fn schema_name() -> String {
        "Lexicon".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <Vec<String>>::json_schema(gen)
    }
}

impl Lexicon {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| tokenize(t.as_ref()).join(" "))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of term occurrences in a tokenized text.
    ///
    /// A multi-word phrase counts once per occurrence.
    pub fn count_hits(&self, words: &[String]) -> usize {
        self.terms
            .iter()
            .map(|term| {
                let parts: Vec<&str> = term.split(' ').collect();
                if parts.len() > words.len() {
                    return 0;
                }
                words
                    .windows(parts.len())
                    .filter(|window| window.iter().zip(&parts).all(|(w, p)| w == p))
                    .count()
            })
            .sum()
    }

    pub fn contains_any(&self, words: &[String]) -> bool {
        self.count_hits(words) > 0
    }

    /// Convenience wrapper that tokenizes `text` first.
    pub fn matches_text(&self, text: &str) -> bool {
        self.contains_any(&tokenize(text))
    }
}

/// Duration peaks per clip type, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DurationTargets {
    pub segment: f64,
    pub combined: f64,
    pub sentence: f64,
    pub topic_transition: f64,
    pub question_answer: f64,
}

impl Default for DurationTargets {
    fn default() -> Self {
        Self {
            segment: 30.0,
            combined: 37.5,
            sentence: 37.5,
            topic_transition: 45.0,
            question_answer: 40.0,
        }
    }
}

impl DurationTargets {
    pub fn for_type(&self, clip_type: ClipType) -> f64 {
        match clip_type {
            ClipType::Segment => self.segment,
            ClipType::Combined => self.combined,
            ClipType::Sentence => self.sentence,
            ClipType::TopicTransition => self.topic_transition,
            ClipType::QuestionAnswer => self.question_answer,
        }
    }
}

/// Hand-tuned scoring constants. Defaults reproduce the shipped behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScoringProfile {
    /// Word count at which content density saturates at 1.0
    pub content_saturation_words: f64,

    /// Duration peaks per clip type
    pub duration_targets: DurationTargets,

    /// Lower bound of the duration-fit factor
    pub duration_floor: f64,

    /// Factor applied when text ends in terminal punctuation
    pub completeness_bonus: f64,

    /// Factor applied when it does not
    pub incomplete_penalty: f64,

    /// Engagement factor is `1 + engagement_weight * engagement_ratio`
    pub engagement_weight: f64,

    /// Factor applied when an attention word or a question mark is present
    pub hook_bonus: f64,

    /// Filler factor is `max(1 - filler_weight * filler_ratio, filler_floor)`
    pub filler_weight: f64,

    /// Lower bound of the filler factor
    pub filler_floor: f64,

    /// Duration peak of the heuristic quality fallback
    pub quality_duration_peak: f64,

    /// Filler words and phrases
    pub filler_words: Lexicon,

    /// Second-person/inclusive pronouns and cognition verbs
    pub engagement_words: Lexicon,

    /// Attention-grabbing words and phrases
    pub hook_words: Lexicon,

    /// Cue words that close a natural-boundary clip
    pub transition_cues: Lexicon,

    /// Phrases that anchor a topic-transition window
    pub topic_transition_phrases: Lexicon,

    /// Phrases associated with highly shareable moments
    pub viral_phrases: Lexicon,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            content_saturation_words: 50.0,
            duration_targets: DurationTargets::default(),
            duration_floor: 0.1,
            completeness_bonus: 1.2,
            incomplete_penalty: 0.9,
            engagement_weight: 2.0,
            hook_bonus: 1.15,
            filler_weight: 2.0,
            filler_floor: 0.3,
            quality_duration_peak: 37.5,
            filler_words: Lexicon::new([
                "um", "uh", "like", "you know", "so", "well", "i mean", "basically",
            ]),
            engagement_words: Lexicon::new([
                "you", "your", "you're", "yourself", "we", "us", "our", "let's", "imagine",
                "think", "know", "believe", "realize", "understand", "remember", "consider",
                "feel",
            ]),
            hook_words: Lexicon::new([
                "secret", "amazing", "incredible", "shocking", "never", "truth", "mistake",
                "surprising", "crazy", "important", "listen", "here's why", "did you know",
                "the reason",
            ]),
            transition_cues: Lexicon::new([
                "first", "second", "third", "finally", "lastly", "next", "in conclusion",
                "to summarize", "moving on", "another thing",
            ]),
            topic_transition_phrases: Lexicon::new([
                "here's the thing", "the problem is", "let me tell you", "the key is",
                "what's interesting", "the truth is", "the point is", "now let's talk about",
                "the reason is", "it turns out",
            ]),
            viral_phrases: Lexicon::new([
                "you won't believe", "game changer", "mind blowing", "nobody talks about",
                "the secret", "changed my life", "this is why", "stop doing", "the best",
                "the worst",
            ]),
        }
    }
}

impl ScoringProfile {
    /// Load a profile from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
