//! Bounded render pool for selected clips.
//!
//! Each clip is encoded to `clip_NN.mp4` with an `.srt` sidecar, which can
//! also be burned into the frame. Failures are per clip and never stop the
//! other renders.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use clipsift_media::{
    cues_for_window, render_clip, with_burned_subtitles, write_srt, ClipSpec, FfmpegRunner,
    StreamMapping,
};
use clipsift_models::{EncodingConfig, Stage, StageFailure, Transcript};

use crate::metrics;
use crate::quality::ScoredClip;

/// One successfully encoded clip.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedClip {
    /// 1-based position in selection order
    pub index: usize,
    pub video_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_path: Option<PathBuf>,
    /// Subtitles are burned into the video
    pub burned_subtitles: bool,
    pub explicit_mapping: bool,
}

/// Results of rendering a batch.
#[derive(Debug, Default)]
pub struct RenderOutcome {
    pub rendered: Vec<RenderedClip>,
    pub failures: Vec<StageFailure>,
}

/// Output file name for the clip at 1-based `index`.
pub fn clip_file_name(index: usize) -> String {
    format!("clip_{:02}.mp4", index)
}

/// Renders clips with at most `concurrency` FFmpeg processes.
#[derive(Debug, Clone)]
pub struct ClipRenderer {
    runner: FfmpegRunner,
    encoding: EncodingConfig,
    concurrency: usize,
    output_dir: PathBuf,
    burn_subtitles: bool,
}

impl ClipRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, concurrency: usize) -> Self {
        Self {
            runner: FfmpegRunner::new(),
            encoding: EncodingConfig::default(),
            concurrency: concurrency.max(1),
            output_dir: output_dir.into(),
            burn_subtitles: false,
        }
    }

    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Burn each clip's captions into the video as well.
    pub fn with_burned_subtitles(mut self, burn: bool) -> Self {
        self.burn_subtitles = burn;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render `clips` from `source`, applying `filter` to every clip.
    pub async fn render_all(
        &self,
        source: &Path,
        clips: &[ScoredClip],
        transcript: &Transcript,
        filter: &str,
    ) -> RenderOutcome {
        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            let failure = StageFailure::new(
                Stage::Render,
                format!("cannot create {}: {}", self.output_dir.display(), e),
            );
            return RenderOutcome {
                rendered: Vec::new(),
                failures: vec![failure],
            };
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let tasks = clips.iter().enumerate().map(|(i, clip)| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                match semaphore.acquire_owned().await {
                    Ok(_permit) => self.render_one(i + 1, source, clip, transcript, filter).await,
                    Err(e) => RenderOutcome {
                        rendered: Vec::new(),
                        failures: vec![StageFailure::new(Stage::Render, e.to_string())
                            .with_subject(clip.candidate.label())],
                    },
                }
            }
        });

        let mut outcome = RenderOutcome::default();
        for clip_outcome in join_all(tasks).await {
            outcome.rendered.extend(clip_outcome.rendered);
            outcome.failures.extend(clip_outcome.failures);
        }
        outcome
    }

    /// Render one clip. A failed subtitle write is recorded and the clip
    /// still renders, without burned-in captions.
    async fn render_one(
        &self,
        index: usize,
        source: &Path,
        clip: &ScoredClip,
        transcript: &Transcript,
        filter: &str,
    ) -> RenderOutcome {
        let candidate = &clip.candidate;
        let video_path = self.output_dir.join(clip_file_name(index));
        let srt_path = video_path.with_extension("srt");
        let mut outcome = RenderOutcome::default();

        let cues = cues_for_window(transcript, candidate.start, candidate.end);
        let subtitle_path = match write_srt(&srt_path, &cues).await {
            Ok(()) => Some(srt_path),
            Err(e) => {
                warn!(clip = index, "Failed to write subtitles: {}", e);
                outcome.failures.push(
                    StageFailure::new(Stage::Render, format!("subtitles not written: {}", e))
                        .with_subject(candidate.label()),
                );
                None
            }
        };

        let burned_subtitles = self.burn_subtitles && subtitle_path.is_some();
        let filter = match (&subtitle_path, burned_subtitles) {
            (Some(srt), true) => with_burned_subtitles(filter, srt),
            _ => filter.to_string(),
        };
        let spec = ClipSpec::new(candidate.start, candidate.duration).with_filter(filter);

        let started = Instant::now();
        let result = render_clip(source, &video_path, &spec, &self.encoding, &self.runner).await;
        metrics::record_render(result.is_ok(), started.elapsed().as_secs_f64());

        match result {
            Ok(mapping) => {
                info!(clip = index, "Rendered {} -> {}", candidate.label(), video_path.display());
                outcome.rendered.push(RenderedClip {
                    index,
                    video_path,
                    subtitle_path,
                    burned_subtitles,
                    explicit_mapping: mapping == StreamMapping::Explicit,
                });
            }
            Err(e) => {
                warn!(clip = index, "Render failed for {}: {}", candidate.label(), e);
                outcome.failures.push(
                    StageFailure::new(Stage::Render, e.to_string()).with_subject(candidate.label()),
                );
            }
        }
        outcome
    }
}
