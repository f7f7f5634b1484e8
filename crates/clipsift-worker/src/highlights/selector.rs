//! Final clip selection.

use std::cmp::Ordering;

use clipsift_models::config::THRESHOLD_FALLBACK_COUNT;
use clipsift_models::{PipelineConfig, SelectionPolicy};

use crate::quality::ScoredClip;

/// Descending score, earlier start first on ties.
pub fn by_rank(a: &ScoredClip, b: &ScoredClip) -> Ordering {
    b.candidate
        .score
        .total_cmp(&a.candidate.score)
        .then_with(|| a.candidate.start.total_cmp(&b.candidate.start))
}

/// Reduce scored clips to the final set.
///
/// Threshold policy keeps every clip whose overall quality reaches
/// `quality_threshold`, or the best three by score when none does.
/// Fixed-count policy keeps the best `top_n` by score.
pub fn select(clips: Vec<ScoredClip>, config: &PipelineConfig) -> Vec<ScoredClip> {
    let mut ranked = clips;
    ranked.sort_by(by_rank);

    match config.selection {
        SelectionPolicy::FixedCount => {
            ranked.truncate(config.top_n);
            ranked
        }
        SelectionPolicy::Threshold => {
            let passing: Vec<ScoredClip> = ranked
                .iter()
                .filter(|c| c.assessment.overall_score >= config.quality_threshold)
                .cloned()
                .collect();
            if passing.is_empty() {
                ranked.truncate(THRESHOLD_FALLBACK_COUNT);
                ranked
            } else {
                passing
            }
        }
    }
}
