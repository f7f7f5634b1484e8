//! Deterministic quality fallback.
//!
//! Lexicon hit rates and a duration term mapped onto the same five 0-10
//! axes the external judge uses.

use std::sync::Arc;

use clipsift_models::scoring::{ends_with_terminal, tokenize};
use clipsift_models::{
    AnalyzerSource, AxisScores, ClipCandidate, QualityAssessment, ScoringProfile,
};

const AXIS_BASE: f64 = 3.0;
const HOOK_PER_HIT: f64 = 2.0;
const QUESTION_HOOK_BONUS: f64 = 2.0;
const ENGAGEMENT_RATIO_WEIGHT: f64 = 40.0;
const VIRAL_PER_HIT: f64 = 2.5;
const COHERENCE_COMPLETE: f64 = 7.0;
const COHERENCE_INCOMPLETE: f64 = 5.0;
const TECHNICAL_FLOOR: f64 = 0.2;
const FILLER_PENALTY_PER_HIT: f64 = 0.3;
const MAX_FILLER_PENALTY: f64 = 3.0;

/// Text-only quality analyzer.
#[derive(Debug, Clone)]
pub struct HeuristicAnalyzer {
    profile: Arc<ScoringProfile>,
}

impl HeuristicAnalyzer {
    pub fn new(profile: Arc<ScoringProfile>) -> Self {
        Self { profile }
    }

    pub fn axes(&self, text: &str, duration: f64) -> AxisScores {
        let p = &self.profile;
        let words = tokenize(text);
        let word_count = words.len().max(1) as f64;

        let hook_hits = p.hook_words.count_hits(&words) as f64;
        let question = if text.contains('?') {
            QUESTION_HOOK_BONUS
        } else {
            0.0
        };
        let engagement_ratio = p.engagement_words.count_hits(&words) as f64 / word_count;
        let viral_hits = p.viral_phrases.count_hits(&words) as f64;

        let peak = p.quality_duration_peak.max(f64::EPSILON);
        let duration_term = if duration.is_finite() {
            (1.0 - (duration - peak).abs() / peak).max(TECHNICAL_FLOOR)
        } else {
            TECHNICAL_FLOOR
        };

        AxisScores {
            viral_potential: AXIS_BASE + VIRAL_PER_HIT * viral_hits,
            coherence: if ends_with_terminal(text) {
                COHERENCE_COMPLETE
            } else {
                COHERENCE_INCOMPLETE
            },
            engagement: AXIS_BASE + ENGAGEMENT_RATIO_WEIGHT * engagement_ratio,
            technical_quality: 10.0 * duration_term,
            hook_strength: AXIS_BASE + HOOK_PER_HIT * hook_hits + question,
        }
        .clamped()
    }

    /// Weighted composite of the axes minus a capped filler penalty.
    pub fn assess(&self, candidate: &ClipCandidate) -> QualityAssessment {
        let axes = self.axes(&candidate.text, candidate.duration);
        let filler_hits = self.profile.filler_words.count_hits(&tokenize(&candidate.text)) as f64;
        let penalty = (FILLER_PENALTY_PER_HIT * filler_hits).min(MAX_FILLER_PENALTY);

        QualityAssessment::with_overall(axes, axes.composite() - penalty, AnalyzerSource::Heuristic)
            .with_explanation(format!(
                "heuristic: {:.0}s clip, {} filler words",
                candidate.duration, filler_hits
            ))
    }
}
