//! Heuristic text scorer.
//!
//! The score is a product of independent factors. A clip that is weak on
//! any one axis stays low no matter how well it does on the others.

use std::sync::Arc;

use clipsift_models::scoring::{ends_with_terminal, tokenize};
use clipsift_models::{ClipType, ScoringProfile};

/// Individual factors of a heuristic score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub content_density: f64,
    pub duration_fit: f64,
    pub completeness: f64,
    pub engagement: f64,
    pub hook: f64,
    pub filler: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.content_density
            * self.duration_fit
            * self.completeness
            * self.engagement
            * self.hook
            * self.filler
    }
}

/// Pure `(text, duration) -> score` function driven by a [`ScoringProfile`].
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    profile: Arc<ScoringProfile>,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new(Arc::new(ScoringProfile::default()))
    }
}

impl HeuristicScorer {
    pub fn new(profile: Arc<ScoringProfile>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    /// Score with the combined-clip duration target.
    pub fn score(&self, text: &str, duration: f64) -> f64 {
        self.score_for(text, duration, ClipType::Combined)
    }

    /// Score with the duration target of `clip_type`.
    pub fn score_for(&self, text: &str, duration: f64, clip_type: ClipType) -> f64 {
        self.breakdown(text, duration, clip_type)
            .map(|b| b.total())
            .unwrap_or(0.0)
    }

    /// Per-factor breakdown. `None` for text without words.
    pub fn breakdown(&self, text: &str, duration: f64, clip_type: ClipType) -> Option<ScoreBreakdown> {
        let words = tokenize(text);
        if words.is_empty() {
            return None;
        }
        let p = &self.profile;
        let word_count = words.len() as f64;

        let content_density = (word_count / p.content_saturation_words.max(1.0)).min(1.0);

        let target = p.duration_targets.for_type(clip_type).max(f64::EPSILON);
        let duration_fit = if duration.is_finite() {
            (1.0 - (duration - target).abs() / target).max(p.duration_floor)
        } else {
            p.duration_floor
        };

        let completeness = if ends_with_terminal(text) {
            p.completeness_bonus
        } else {
            p.incomplete_penalty
        };

        let engagement_ratio = p.engagement_words.count_hits(&words) as f64 / word_count;
        let engagement = 1.0 + p.engagement_weight * engagement_ratio.min(1.0);

        let hook = if text.contains('?') || p.hook_words.contains_any(&words) {
            p.hook_bonus
        } else {
            1.0
        };

        let filler_ratio = p.filler_words.count_hits(&words) as f64 / word_count;
        let filler = (1.0 - p.filler_weight * filler_ratio).max(p.filler_floor);

        Some(ScoreBreakdown {
            content_density,
            duration_fit,
            completeness,
            engagement,
            hook,
            filler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> HeuristicScorer {
        HeuristicScorer::default()
    }

    #[test]
    fn test_score_is_idempotent() {
        let s = scorer();
        let text = "Here's the thing you need to know about Rust. It is amazing?";
        let first = s.score(text, 32.0);
        for _ in 0..10 {
            assert_eq!(s.score(text, 32.0), first);
        }
        assert!(first > 0.0);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(scorer().score("  ...  ", 30.0), 0.0);
    }

    #[test]
    fn test_completeness_bonus() {
        let s = scorer();
        let complete = s.score("This is amazing and incredible. The end.", 6.5);
        let incomplete = s.score("This is amazing and incredible and the", 6.5);
        assert!(complete > incomplete);
    }

    #[test]
    fn test_duration_peaks_at_target() {
        let s = scorer();
        let text = "A steady sentence with plain words in it.";
        let at_target = s.score_for(text, 30.0, ClipType::Segment);
        let off_target = s.score_for(text, 50.0, ClipType::Segment);
        assert!(at_target > off_target);

        let b = s.breakdown(text, 500.0, ClipType::Segment).unwrap();
        assert_eq!(b.duration_fit, 0.1);
    }

    #[test]
    fn test_filler_penalty_is_floored() {
        let s = scorer();
        let b = s
            .breakdown("um uh um uh like um so well", 30.0, ClipType::Segment)
            .unwrap();
        assert_eq!(b.filler, 0.3);
        assert!(b.total() > 0.0);
    }

    #[test]
    fn test_hook_and_engagement() {
        let s = scorer();
        let hooked = s
            .breakdown("Did you know this secret?", 30.0, ClipType::Segment)
            .unwrap();
        assert_eq!(hooked.hook, 1.15);
        assert!(hooked.engagement > 1.0);

        let flat = s
            .breakdown("The cat sat on the mat.", 30.0, ClipType::Segment)
            .unwrap();
        assert_eq!(flat.hook, 1.0);
        assert_eq!(flat.engagement, 1.0);
    }
}
