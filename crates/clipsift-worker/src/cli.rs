//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use clipsift_models::config::{
    DEFAULT_MAX_DURATION, DEFAULT_MIN_DURATION, DEFAULT_OVERLAP_THRESHOLD, DEFAULT_TOP_N,
};
use clipsift_models::{AnalysisContext, AspectRatio, PipelineConfig, ReframePolicy, SelectionPolicy};

use crate::pipeline::Framing;

#[derive(Parser, Debug)]
#[command(name = "clipsift", version, about = "Cut short clips out of a long video by its transcript")]
pub struct Cli {
    /// Video URL (used for captions and the source download)
    pub source: String,

    /// Read the transcript from a JSON file instead of downloading captions
    #[arg(long, value_name = "FILE")]
    pub transcript: Option<PathBuf>,

    /// Use a local video file instead of downloading the source
    #[arg(long, value_name = "FILE")]
    pub video: Option<PathBuf>,

    /// Topics to boost, comma separated
    #[arg(long, value_delimiter = ',')]
    pub topics: Vec<String>,

    /// Number of clips to keep
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Minimum clip duration in seconds
    #[arg(long, default_value_t = DEFAULT_MIN_DURATION)]
    pub min_duration: f64,

    /// Maximum clip duration in seconds
    #[arg(long, default_value_t = DEFAULT_MAX_DURATION)]
    pub max_duration: f64,

    /// Keep every clip scoring at least this (0-10) instead of a fixed count
    #[arg(long)]
    pub quality_threshold: Option<f64>,

    /// Maximum overlap ratio between kept clips
    #[arg(long, default_value_t = DEFAULT_OVERLAP_THRESHOLD)]
    pub overlap_threshold: f64,

    /// Output directory for clips and report.json
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Keep the source aspect ratio (no reframing)
    #[arg(long, conflicts_with = "fit")]
    pub no_crop: bool,

    /// Pad instead of crop when reframing
    #[arg(long)]
    pub fit: bool,

    /// Target aspect ratio, W:H
    #[arg(long, default_value = "9:16")]
    pub aspect: AspectRatio,

    /// Source title passed to the quality judge
    #[arg(long)]
    pub title: Option<String>,

    /// Score clips heuristically without calling the judge
    #[arg(long)]
    pub no_judge: bool,

    /// Select clips and write the report without rendering
    #[arg(long)]
    pub dry_run: bool,

    /// Burn captions into the rendered clips
    #[arg(long, conflicts_with = "dry_run")]
    pub burn_subtitles: bool,
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default().with_durations(self.min_duration, self.max_duration);
        config.overlap_threshold = self.overlap_threshold;
        config.top_n = self.count.unwrap_or(DEFAULT_TOP_N);
        config.target_aspect = self.aspect;
        config.reframe = if self.fit {
            ReframePolicy::Fit
        } else {
            ReframePolicy::Crop
        };
        if let Some(threshold) = self.quality_threshold {
            config.quality_threshold = threshold;
            config = config.with_selection(SelectionPolicy::Threshold);
        }
        config
    }

    pub fn framing(&self) -> Framing {
        if self.no_crop {
            Framing::Original
        } else {
            Framing::Reframe
        }
    }

    pub fn analysis_context(&self) -> AnalysisContext {
        let context = AnalysisContext::default().with_topics(
            self.topics
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        );
        match &self.title {
            Some(title) => context.with_title(title.clone()),
            None => context,
        }
    }
}
