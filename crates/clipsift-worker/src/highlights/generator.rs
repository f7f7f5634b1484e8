//! Candidate generation strategies.
//!
//! Each strategy proposes clip spans from the ordered segment list on its
//! own; the generator unions their output in strategy order. Overlap
//! between proposals is expected and resolved later.
//!
//! Every emitted candidate satisfies `min_duration <= duration <= max_duration`.

use rayon::prelude::*;
use tracing::debug;

use clipsift_models::scoring::ends_with_terminal;
use clipsift_models::{ClipCandidate, ClipType, PipelineConfig, Transcript, TranscriptSegment};

use super::scorer::HeuristicScorer;

/// Silence between segments that closes a natural-boundary clip (seconds)
pub const PAUSE_THRESHOLD_SECS: f64 = 2.0;
/// Segments before a transition phrase included in its window
pub const TOPIC_LOOKBACK: usize = 2;
/// Segments after a transition phrase the window may extend over
pub const TOPIC_LOOKAHEAD: usize = 10;
/// Segments before a question included in its window
pub const QUESTION_LOOKBACK: usize = 1;
/// Segments after a question the window may extend over
pub const QUESTION_LOOKAHEAD: usize = 15;

const DURATION_EPSILON: f64 = 1e-9;

/// Inputs shared by every strategy.
pub struct GenerationContext<'a> {
    pub segments: &'a [TranscriptSegment],
    pub min_duration: f64,
    pub max_duration: f64,
    pub scorer: &'a HeuristicScorer,
}

impl GenerationContext<'_> {
    /// Span duration of `segments[first..=last]`, gaps included.
    fn span(&self, first: usize, last: usize) -> f64 {
        self.segments[last].end() - self.segments[first].start
    }

    fn in_range(&self, duration: f64) -> bool {
        duration + DURATION_EPSILON >= self.min_duration
            && duration <= self.max_duration + DURATION_EPSILON
    }

    /// Scored candidate for `segments[first..=last]`, if its duration fits.
    fn candidate(&self, first: usize, last: usize, clip_type: ClipType) -> Option<ClipCandidate> {
        let clip = ClipCandidate::from_segments(&self.segments[first..=last], clip_type).ok()?;
        if !self.in_range(clip.duration) {
            return None;
        }
        let score = self
            .scorer
            .score_for(&clip.text, clip.duration, clip_type);
        Some(clip.with_score(score))
    }
}

/// One generation method.
pub trait CandidateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(&self, ctx: &GenerationContext<'_>) -> Vec<ClipCandidate>;
}

/// Every segment whose own duration fits the window.
#[derive(Debug, Default)]
pub struct SingleSegmentStrategy;

impl CandidateStrategy for SingleSegmentStrategy {
    fn name(&self) -> &'static str {
        "single_segment"
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Vec<ClipCandidate> {
        (0..ctx.segments.len())
            .filter_map(|i| ctx.candidate(i, i, ClipType::Segment))
            .collect()
    }
}

/// Every run of two or more contiguous segments that fits the window.
///
/// Span duration only grows as the end index advances, so the inner loop
/// stops at the first span longer than `max_duration`.
#[derive(Debug, Default)]
pub struct SlidingCombinationStrategy;

impl CandidateStrategy for SlidingCombinationStrategy {
    fn name(&self) -> &'static str {
        "sliding_combination"
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Vec<ClipCandidate> {
        let n = ctx.segments.len();
        (0..n)
            .into_par_iter()
            .flat_map_iter(|first| {
                let mut out = Vec::new();
                for last in (first + 1)..n {
                    let duration = ctx.span(first, last);
                    if duration > ctx.max_duration + DURATION_EPSILON {
                        break;
                    }
                    if let Some(clip) = ctx.candidate(first, last, ClipType::Combined) {
                        out.push(clip);
                    }
                }
                out
            })
            .collect()
    }
}

/// Greedy segmentation on natural boundaries.
///
/// A running clip closes at terminal punctuation, at a pause longer than
/// [`PAUSE_THRESHOLD_SECS`] or once it contains a transition cue, each only
/// once it has reached `min_duration`. Adding a segment that would push it
/// past `max_duration` forces a close; a forced clip shorter than
/// `min_duration` is dropped.
#[derive(Debug, Default)]
pub struct SentenceStrategy;

impl CandidateStrategy for SentenceStrategy {
    fn name(&self) -> &'static str {
        "sentence"
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Vec<ClipCandidate> {
        let segments = ctx.segments;
        let cues = &ctx.scorer.profile().transition_cues;
        let mut out = Vec::new();
        let mut first: Option<usize> = None;
        let mut has_cue = false;

        for i in 0..segments.len() {
            if let Some(begin) = first {
                if ctx.span(begin, i) > ctx.max_duration + DURATION_EPSILON {
                    if i > begin {
                        out.extend(ctx.candidate(begin, i - 1, ClipType::Sentence));
                    }
                    first = None;
                    has_cue = false;
                }
            }

            let begin = *first.get_or_insert(i);
            if ctx.span(begin, i) > ctx.max_duration + DURATION_EPSILON {
                // A single segment longer than the window.
                first = None;
                has_cue = false;
                continue;
            }

            has_cue |= cues.matches_text(&segments[i].text);
            let duration = ctx.span(begin, i);
            let long_enough = duration + DURATION_EPSILON >= ctx.min_duration;
            let pause = segments
                .get(i + 1)
                .map(|next| next.start - segments[i].end() > PAUSE_THRESHOLD_SECS)
                .unwrap_or(false);
            let at_max = duration + DURATION_EPSILON >= ctx.max_duration;

            let close = at_max
                || (long_enough && (ends_with_terminal(&segments[i].text) || pause || has_cue));

            if close {
                out.extend(ctx.candidate(begin, i, ClipType::Sentence));
                first = None;
                has_cue = false;
            }
        }

        if let Some(begin) = first {
            out.extend(ctx.candidate(begin, segments.len() - 1, ClipType::Sentence));
        }

        out
    }
}

/// Shared window search for the anchored strategies.
///
/// Walks `last` forward from `scan_from` up to `limit`, stopping once the
/// span exceeds `max_duration`. Returns the first end index accepted by
/// `closes`, or the furthest in-range end index when nothing closes.
/// [`WindowStep::StopBefore`] ends the window on the previous segment,
/// which may lie before `scan_from`.
fn anchored_window<F>(
    ctx: &GenerationContext<'_>,
    begin: usize,
    scan_from: usize,
    limit: usize,
    mut closes: F,
) -> Option<usize>
where
    F: FnMut(usize) -> WindowStep,
{
    let mut furthest = None;
    for last in scan_from..=limit.min(ctx.segments.len() - 1) {
        let duration = ctx.span(begin, last);
        if duration > ctx.max_duration + DURATION_EPSILON {
            break;
        }
        let fits = ctx.in_range(duration);
        match closes(last) {
            WindowStep::Close if fits => return Some(last),
            WindowStep::StopBefore => {
                let previous = last.checked_sub(1).filter(|p| *p >= begin)?;
                return ctx.in_range(ctx.span(begin, previous)).then_some(previous);
            }
            _ => {}
        }
        if fits {
            furthest = Some(last);
        }
    }
    furthest
}

enum WindowStep {
    Continue,
    Close,
    /// `last` must not be part of the window
    StopBefore,
}

/// Windows anchored two segments before a transition phrase.
#[derive(Debug, Default)]
pub struct TopicTransitionStrategy;

impl CandidateStrategy for TopicTransitionStrategy {
    fn name(&self) -> &'static str {
        "topic_transition"
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Vec<ClipCandidate> {
        let segments = ctx.segments;
        let phrases = &ctx.scorer.profile().topic_transition_phrases;

        segments
            .iter()
            .enumerate()
            .filter(|(_, s)| phrases.matches_text(&s.text))
            .filter_map(|(anchor, _)| {
                let begin = anchor.saturating_sub(TOPIC_LOOKBACK);
                let last = anchored_window(ctx, begin, anchor, anchor + TOPIC_LOOKAHEAD, |i| {
                    if ends_with_terminal(&segments[i].text) {
                        WindowStep::Close
                    } else {
                        WindowStep::Continue
                    }
                })?;
                ctx.candidate(begin, last, ClipType::TopicTransition)
            })
            .collect()
    }
}

/// Windows anchored one segment before a question.
///
/// The answer ends at the first terminal boundary after the question, or
/// just before the next question.
#[derive(Debug, Default)]
pub struct QuestionAnswerStrategy;

impl CandidateStrategy for QuestionAnswerStrategy {
    fn name(&self) -> &'static str {
        "question_answer"
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Vec<ClipCandidate> {
        let segments = ctx.segments;

        segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.text.contains('?'))
            .filter_map(|(anchor, _)| {
                let begin = anchor.saturating_sub(QUESTION_LOOKBACK);
                let last = anchored_window(
                    ctx,
                    begin,
                    anchor + 1,
                    anchor + QUESTION_LOOKAHEAD,
                    |i| {
                        if segments[i].text.contains('?') {
                            WindowStep::StopBefore
                        } else if ends_with_terminal(&segments[i].text) {
                            WindowStep::Close
                        } else {
                            WindowStep::Continue
                        }
                    },
                )?;
                ctx.candidate(begin, last, ClipType::QuestionAnswer)
            })
            .collect()
    }
}

/// Runs every strategy and unions the results.
pub struct CandidateGenerator {
    scorer: HeuristicScorer,
    strategies: Vec<Box<dyn CandidateStrategy>>,
}

impl CandidateGenerator {
    /// Generator with all five strategies.
    pub fn new(scorer: HeuristicScorer) -> Self {
        Self::with_strategies(
            scorer,
            vec![
                Box::new(SingleSegmentStrategy),
                Box::new(SlidingCombinationStrategy),
                Box::new(SentenceStrategy),
                Box::new(TopicTransitionStrategy),
                Box::new(QuestionAnswerStrategy),
            ],
        )
    }

    pub fn with_strategies(scorer: HeuristicScorer, strategies: Vec<Box<dyn CandidateStrategy>>) -> Self {
        Self { scorer, strategies }
    }

    pub fn scorer(&self) -> &HeuristicScorer {
        &self.scorer
    }

    /// Proposals from every strategy, in strategy order. Not deduplicated.
    pub fn generate(&self, transcript: &Transcript, config: &PipelineConfig) -> Vec<ClipCandidate> {
        let segments = transcript.segments();
        if segments.is_empty() {
            return Vec::new();
        }
        self.generate_from(segments, config)
    }

    /// Same as [`CandidateGenerator::generate`] over a raw segment slice.
    pub fn generate_from(&self, segments: &[TranscriptSegment], config: &PipelineConfig) -> Vec<ClipCandidate> {
        if segments.is_empty() {
            return Vec::new();
        }

        let ctx = GenerationContext {
            segments,
            min_duration: config.min_duration,
            max_duration: config.max_duration,
            scorer: &self.scorer,
        };

        let mut all = Vec::new();
        for strategy in &self.strategies {
            let produced = strategy.generate(&ctx);
            debug!(
                strategy = strategy.name(),
                count = produced.len(),
                "Generated candidates"
            );
            all.extend(produced);
        }
        all
    }
}
