//! End-to-end selection runs with stubbed external services.

use std::sync::Arc;

use async_trait::async_trait;

use clipsift_ml_client::{MlError, MlResult, SimilarityService};
use clipsift_models::{
    AnalysisContext, AnalyzerSource, AxisScores, ClipCandidate, PipelineConfig, ScoringProfile,
    SelectionPolicy, Stage, Transcript, TranscriptSegment,
};
use clipsift_worker::highlights::{overlap_ratio, TopicFilter};
use clipsift_worker::quality::Judgement;
use clipsift_worker::{AnalysisError, ClipJudge, ClipPipeline, QualityAnalyzer};

/// Scores everything 8 except clips mentioning "boring", which fail.
struct StubJudge;

#[async_trait]
impl ClipJudge for StubJudge {
    fn name(&self) -> &str {
        "stub"
    }

    async fn judge(
        &self,
        candidate: &ClipCandidate,
        _context: &AnalysisContext,
    ) -> Result<Judgement, AnalysisError> {
        if candidate.text.contains("boring") {
            return Err(AnalysisError::transport("connection reset"));
        }
        Ok(Judgement::new(AxisScores {
            viral_potential: 8.0,
            coherence: 8.0,
            engagement: 8.0,
            technical_quality: 8.0,
            hook_strength: 8.0,
        })
        .with_explanation("clear payoff"))
    }
}

struct HalfSimilarity;

#[async_trait]
impl SimilarityService for HalfSimilarity {
    async fn similarity(&self, texts: &[String], topics: &[String]) -> MlResult<Vec<Vec<f32>>> {
        Ok(vec![vec![0.5; topics.len()]; texts.len()])
    }
}

struct DownSimilarity;

#[async_trait]
impl SimilarityService for DownSimilarity {
    async fn similarity(&self, _texts: &[String], _topics: &[String]) -> MlResult<Vec<Vec<f32>>> {
        Err(MlError::ServiceUnavailable("down".into()))
    }
}

fn transcript() -> Transcript {
    let lines = [
        "Have you ever wondered why most startups fail?",
        "The answer is surprisingly simple and honestly shocking.",
        "They build things nobody actually wants.",
        "Um, so, this next part is kind of boring, you know.",
        "We spent two years writing code before talking to a customer.",
        "That was the biggest mistake of my entire career.",
        "So let's talk about what we did differently the second time.",
        "We interviewed fifty people before writing a single line.",
        "What did they tell us?",
        "They wanted something completely different from our plan.",
        "Moving on, here is the secret nobody tells you.",
        "Talk to your users every single week, no exceptions.",
    ];
    let segments = lines
        .iter()
        .enumerate()
        .map(|(i, text)| TranscriptSegment::new(*text, i as f64 * 8.0, 7.5))
        .collect();
    Transcript::new(segments).unwrap()
}

fn pipeline() -> ClipPipeline {
    let profile = Arc::new(ScoringProfile::default());
    let judge: Arc<dyn ClipJudge> = Arc::new(StubJudge);
    ClipPipeline::new(
        Arc::clone(&profile),
        QualityAnalyzer::new(Some(judge), profile),
    )
}

fn config() -> PipelineConfig {
    PipelineConfig::default().with_durations(10.0, 30.0)
}

#[tokio::test]
async fn test_selected_clips_respect_bounds_and_overlap() {
    let config = config();
    let output = pipeline()
        .run(&transcript(), &config, &AnalysisContext::default())
        .await
        .unwrap();

    assert!(!output.selected.is_empty());
    assert!(output.selected.len() <= config.top_n);
    for clip in &output.selected {
        let c = &clip.candidate;
        assert!(c.duration >= config.min_duration && c.duration <= config.max_duration);
        assert!(c.ai_score.is_some());
    }
    for (i, a) in output.selected.iter().enumerate() {
        for b in &output.selected[i + 1..] {
            assert!(overlap_ratio(&a.candidate, &b.candidate) <= config.overlap_threshold);
        }
    }
}

#[tokio::test]
async fn test_judge_failures_fall_back_per_candidate() {
    let output = pipeline()
        .run(&transcript(), &config(), &AnalysisContext::default())
        .await
        .unwrap();

    let report = &output.report;
    assert!(report.judged > 0);
    assert!(report.judge_fallbacks > 0);
    assert_eq!(report.judged + report.judge_fallbacks, report.deduplicated);
    assert_eq!(
        report.failures_for(Stage::Quality).count(),
        report.judge_fallbacks
    );

    for clip in &output.selected {
        let expected = if clip.candidate.text.contains("boring") {
            AnalyzerSource::Heuristic
        } else {
            AnalyzerSource::ExternalJudge
        };
        assert_eq!(clip.assessment.source, expected);
        if expected == AnalyzerSource::ExternalJudge {
            assert_eq!(clip.assessment.explanation.as_deref(), Some("clear payoff"));
        }
    }
}

#[tokio::test]
async fn test_threshold_falls_back_to_top_three() {
    let config = PipelineConfig {
        quality_threshold: 10.0,
        ..config()
    }
    .with_selection(SelectionPolicy::Threshold);

    let output = pipeline()
        .run(&transcript(), &config, &AnalysisContext::default())
        .await
        .unwrap();

    assert!(output.report.deduplicated >= 3);
    assert_eq!(output.selected.len(), 3);
    let scores: Vec<f64> = output.selected.iter().map(|c| c.candidate.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_topic_boost_never_decreases_scores() {
    let context = AnalysisContext::default().with_topics(vec!["startups".into()]);
    let baseline = pipeline()
        .run(&transcript(), &config(), &AnalysisContext::default())
        .await
        .unwrap();
    let boosted = pipeline()
        .with_topic_filter(TopicFilter::new(Arc::new(HalfSimilarity)))
        .run(&transcript(), &config(), &context)
        .await
        .unwrap();

    assert_eq!(boosted.report.topic_boosted, boosted.report.deduplicated);
    for clip in &boosted.selected {
        assert_eq!(clip.candidate.topic_similarity, Some(0.5));
    }

    let best = |clips: &[clipsift_worker::ScoredClip]| {
        clips
            .iter()
            .map(|c| c.candidate.score)
            .fold(f64::MIN, f64::max)
    };
    assert!(best(&boosted.selected) >= best(&baseline.selected));
}

#[tokio::test]
async fn test_similarity_outage_keeps_unboosted_scores() {
    let context = AnalysisContext::default().with_topics(vec!["startups".into()]);
    let output = pipeline()
        .with_topic_filter(TopicFilter::new(Arc::new(DownSimilarity)))
        .run(&transcript(), &config(), &context)
        .await
        .unwrap();

    assert_eq!(output.report.failures_for(Stage::TopicFilter).count(), 1);
    assert_eq!(output.report.topic_boosted, 0);
    assert!(!output.selected.is_empty());
    assert!(output
        .selected
        .iter()
        .all(|c| c.candidate.topic_similarity.is_none()));
}
