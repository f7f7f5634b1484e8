//! Pipeline orchestration.
//!
//! generate -> resolve overlaps -> topic boost -> quality analysis -> select,
//! then optionally render. Only invalid configuration and a missing
//! transcript abort a run; every other failure is recorded in the
//! [`RunReport`] and the run continues.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::Instrument;

use clipsift_media::{compute_reframe, probe_frame_size, reframe_filter, ORIGINAL_ASPECT_FILTER};
use clipsift_models::{
    AnalysisContext, AnalyzerSource, ClipCandidate, FrameSize, PipelineConfig, ReframeGeometry,
    RunId, RunReport, ScoringProfile, Stage, StageFailure, Transcript,
};

use crate::error::{WorkerError, WorkerResult};
use crate::highlights::{resolve_overlaps, select, CandidateGenerator, HeuristicScorer, TopicFilter};
use crate::logging::RunLogger;
use crate::metrics;
use crate::quality::{QualityAnalyzer, ScoredClip};
use crate::render::{ClipRenderer, RenderedClip};

/// File name of the serialized run output.
pub const REPORT_FILE: &str = "report.json";

/// Result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub report: RunReport,
    /// Final clips, best first
    pub selected: Vec<ScoredClip>,
    /// Geometry used for rendering, when clips were reframed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<ReframeGeometry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rendered: Vec<RenderedClip>,
}

impl PipelineOutput {
    /// Write `report.json` into `dir`.
    pub async fn write_report(&self, dir: impl AsRef<Path>) -> WorkerResult<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(REPORT_FILE);
        tokio::fs::write(&path, serde_json::to_vec_pretty(self)?).await?;
        Ok(path)
    }
}

/// How selected clips are framed when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Reframe to the configured aspect ratio and policy
    Reframe,
    /// Keep the source aspect, scaled to 1080 px high
    Original,
}

/// The transcript-to-clips pipeline.
pub struct ClipPipeline {
    generator: CandidateGenerator,
    topic_filter: Option<TopicFilter>,
    analyzer: QualityAnalyzer,
    run_timeout: Duration,
}

impl ClipPipeline {
    pub fn new(profile: Arc<ScoringProfile>, analyzer: QualityAnalyzer) -> Self {
        Self {
            generator: CandidateGenerator::new(HeuristicScorer::new(profile)),
            topic_filter: None,
            analyzer,
            run_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_generator(mut self, generator: CandidateGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_topic_filter(mut self, filter: TopicFilter) -> Self {
        self.topic_filter = Some(filter);
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Select clips from `transcript`.
    pub async fn run(
        &self,
        transcript: &Transcript,
        config: &PipelineConfig,
        context: &AnalysisContext,
    ) -> WorkerResult<PipelineOutput> {
        config.validate().map_err(WorkerError::from_model)?;
        if transcript.is_empty() {
            return Err(WorkerError::input_missing("transcript has no segments"));
        }

        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "select_clips");
        let span = logger.create_span();

        self.run_stages(run_id, logger, transcript, config, context)
            .instrument(span)
            .await
    }

    async fn run_stages(
        &self,
        run_id: RunId,
        logger: RunLogger,
        transcript: &Transcript,
        config: &PipelineConfig,
        context: &AnalysisContext,
    ) -> WorkerResult<PipelineOutput> {
        let deadline = Instant::now() + self.run_timeout;
        let mut report = RunReport::new(run_id);
        report.segments = transcript.len();
        logger.log_start(&format!(
            "{} segments, {:.0}s of transcript",
            transcript.len(),
            transcript.span_secs()
        ));

        let generated = self.generator.generate(transcript, config);
        report.generated = generated.len();
        if generated.is_empty() {
            logger.log_warning("no candidate fits the duration window");
            report.record_failure(StageFailure::new(
                Stage::Generate,
                format!(
                    "no candidate between {}s and {}s",
                    config.min_duration, config.max_duration
                ),
            ));
        }

        let deduplicated = resolve_overlaps(generated, config.overlap_threshold);
        report.deduplicated = deduplicated.len();
        metrics::record_candidates(report.generated, report.deduplicated);
        logger.log_progress(&format!(
            "{} candidates generated, {} after overlap resolution",
            report.generated, report.deduplicated
        ));

        let mut boosted = self
            .boost_topics(deduplicated, &context.topics, &mut report, &logger)
            .await;
        boosted.sort_by(|a, b| b.score.total_cmp(&a.score));

        let scored = self.analyzer.analyze_all(boosted, context, deadline).await;
        self.record_quality(&scored, &mut report);
        logger.log_progress(&format!(
            "{} judged, {} heuristic fallbacks",
            report.judged, report.judge_fallbacks
        ));

        let selected = select(scored, config);
        report.selected = selected.len();
        metrics::record_selected(selected.len());

        report.finish();
        metrics::record_run("completed", report.elapsed_secs().unwrap_or(0.0));
        logger.log_completion(&format!(
            "{} generated, {} deduplicated, {} selected, {} failures",
            report.generated,
            report.deduplicated,
            report.selected,
            report.failures.len()
        ));

        Ok(PipelineOutput {
            report,
            selected,
            geometry: None,
            rendered: Vec::new(),
        })
    }

    async fn boost_topics(
        &self,
        candidates: Vec<ClipCandidate>,
        topics: &[String],
        report: &mut RunReport,
        logger: &RunLogger,
    ) -> Vec<ClipCandidate> {
        if topics.iter().all(|t| t.trim().is_empty()) {
            return candidates;
        }

        let filter = match &self.topic_filter {
            Some(filter) => filter,
            None => {
                logger.log_warning("topics given but no similarity service configured");
                report.record_failure(StageFailure::new(
                    Stage::TopicFilter,
                    "similarity service not configured",
                ));
                return candidates;
            }
        };

        match filter.apply(&candidates, topics).await {
            Ok(boosted) => {
                report.topic_boosted = boosted
                    .iter()
                    .filter(|c| c.topic_similarity.unwrap_or(0.0) > 0.0)
                    .count();
                boosted
            }
            Err(e) => {
                logger.log_warning(&format!("topic boost skipped: {}", e));
                metrics::record_topic_filter_failure();
                report.record_failure(StageFailure::new(Stage::TopicFilter, e.to_string()));
                candidates
            }
        }
    }

    fn record_quality(&self, scored: &[ScoredClip], report: &mut RunReport) {
        for clip in scored {
            match clip.assessment.source {
                AnalyzerSource::ExternalJudge => report.judged += 1,
                AnalyzerSource::Heuristic if self.analyzer.has_judge() => {
                    report.judge_fallbacks += 1;
                    let reason = clip
                        .assessment
                        .fallback_reason
                        .clone()
                        .unwrap_or_else(|| "judge unavailable".to_string());
                    report.record_failure(
                        StageFailure::new(Stage::Quality, reason).with_subject(clip.candidate.label()),
                    );
                }
                AnalyzerSource::Heuristic => {}
            }
        }
    }

    /// Render the selected clips of `output` from `source`.
    ///
    /// A failed probe falls back to a 1920x1080 source. Clip failures are
    /// recorded and the remaining clips still render.
    pub async fn render(
        &self,
        output: &mut PipelineOutput,
        transcript: &Transcript,
        source: &Path,
        config: &PipelineConfig,
        renderer: &ClipRenderer,
        framing: Framing,
    ) {
        let logger = RunLogger::new(&output.report.run_id, "render_clips");
        let span = logger.create_span();

        async {
            logger.log_start(&format!(
                "{} clips from {} into {}",
                output.selected.len(),
                source.display(),
                renderer.output_dir().display()
            ));

            let filter = match framing {
                Framing::Original => ORIGINAL_ASPECT_FILTER.to_string(),
                Framing::Reframe => {
                    let frame = match probe_frame_size(source).await {
                        Ok(frame) => frame,
                        Err(e) => {
                            logger.log_warning(&format!(
                                "probe failed, assuming {}: {}",
                                FrameSize::FALLBACK_SOURCE,
                                e
                            ));
                            output.report.record_failure(
                                StageFailure::new(Stage::Probe, e.to_string())
                                    .with_subject(source.display().to_string()),
                            );
                            FrameSize::FALLBACK_SOURCE
                        }
                    };
                    let geometry =
                        compute_reframe(frame.width, frame.height, config.target_aspect, config.reframe);
                    output.geometry = Some(geometry);
                    reframe_filter(&geometry)
                }
            };

            let outcome = renderer
                .render_all(source, &output.selected, transcript, &filter)
                .await;

            output.report.rendered = outcome.rendered.len();
            output.report.render_failures = outcome.failures.len();
            for failure in outcome.failures {
                output.report.record_failure(failure);
            }
            if outcome.rendered.is_empty() && output.report.render_failures > 0 {
                logger.log_error("every clip failed to render");
            }
            output.rendered = outcome.rendered;
            output.report.finish();

            logger.log_completion(&format!(
                "{} rendered, {} failed",
                output.report.rendered, output.report.render_failures
            ));
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsift_models::{SelectionPolicy, TranscriptSegment};

    fn pipeline() -> ClipPipeline {
        let profile = Arc::new(ScoringProfile::default());
        ClipPipeline::new(Arc::clone(&profile), QualityAnalyzer::heuristic_only(profile))
    }

    fn transcript() -> Transcript {
        Transcript::new(vec![
            TranscriptSegment::new("Hello there.", 0.0, 2.0),
            TranscriptSegment::new("This is amazing and incredible.", 2.0, 3.0),
            TranscriptSegment::new("The end.", 5.0, 1.5),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_stages() {
        let config = PipelineConfig::default().with_durations(10.0, 3.0);
        let err = pipeline()
            .run(&transcript(), &config, &AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[tokio::test]
    async fn test_run_reports_counts() {
        let config = PipelineConfig::default()
            .with_durations(3.0, 10.0)
            .with_selection(SelectionPolicy::Threshold);
        let output = pipeline()
            .run(&transcript(), &config, &AnalysisContext::default())
            .await
            .unwrap();

        let report = &output.report;
        assert_eq!(report.segments, 3);
        assert!(report.generated >= report.deduplicated);
        assert!(report.deduplicated >= report.selected);
        assert!(report.selected >= 1);
        assert!(report.finished_at.is_some());
        assert_eq!(report.judged, 0);
        assert_eq!(report.judge_fallbacks, 0);
    }

    #[tokio::test]
    async fn test_topics_without_service_are_recorded() {
        let config = PipelineConfig::default().with_durations(3.0, 10.0);
        let context = AnalysisContext::default().with_topics(vec!["rust".into()]);
        let output = pipeline().run(&transcript(), &config, &context).await.unwrap();
        assert_eq!(output.report.failures_for(Stage::TopicFilter).count(), 1);
        assert!(!output.selected.is_empty());
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default().with_durations(3.0, 10.0);
        let output = pipeline()
            .run(&transcript(), &config, &AnalysisContext::default())
            .await
            .unwrap();

        let path = output.write_report(dir.path()).await.unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["report"]["segments"], 3);
        assert!(json["selected"].as_array().unwrap().len() <= 5);
    }
}
