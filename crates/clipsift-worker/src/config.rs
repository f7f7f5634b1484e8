//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use clipsift_models::EncodingConfig;

/// Gemini models tried in order for each judged clip.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent external judge calls
    pub judge_concurrency: usize,
    /// Timeout for a single judge call
    pub judge_timeout: Duration,
    /// Maximum candidates sent to the judge; the rest are scored heuristically
    pub max_judged_candidates: usize,
    /// Deadline for the whole run; judge calls still in flight fall back
    pub run_timeout: Duration,
    /// Maximum concurrent FFmpeg renders
    pub render_concurrency: usize,
    /// Timeout for one FFmpeg render
    pub render_timeout: Duration,
    /// Work directory for downloads and captions
    pub work_dir: PathBuf,
    /// Output directory for clips and the run report
    pub output_dir: PathBuf,
    /// Gemini model fallback list
    pub gemini_models: Vec<String>,
    /// Optional JSON file overriding the scoring profile
    pub scoring_profile_path: Option<PathBuf>,
    /// Caption languages tried in order
    pub caption_languages: Vec<String>,
    /// Encoder settings for rendered clips
    pub encoding: EncodingConfig,
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            judge_concurrency: 4,
            judge_timeout: Duration::from_secs(30),
            max_judged_candidates: 40,
            run_timeout: Duration::from_secs(600),
            render_concurrency: available_cores(),
            render_timeout: Duration::from_secs(900),
            work_dir: PathBuf::from("/tmp/clipsift"),
            output_dir: PathBuf::from("clips"),
            gemini_models: DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            scoring_profile_path: None,
            caption_languages: vec!["en".to_string()],
            encoding: EncodingConfig::default(),
        }
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Apply CRF and preset overrides. An unparseable CRF is ignored.
fn encoding_overrides(base: EncodingConfig, crf: Option<&str>, preset: Option<&str>) -> EncodingConfig {
    let mut encoding = base;
    if let Some(crf) = crf.and_then(|s| s.trim().parse::<u8>().ok()).filter(|c| *c <= 51) {
        encoding = encoding.with_crf(crf);
    }
    if let Some(preset) = preset.map(str::trim).filter(|p| !p.is_empty()) {
        encoding = encoding.with_preset(preset);
    }
    encoding
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            judge_concurrency: std::env::var("CLIPSIFT_JUDGE_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.judge_concurrency),
            judge_timeout: Duration::from_secs(
                std::env::var("CLIPSIFT_JUDGE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_judged_candidates: std::env::var("CLIPSIFT_MAX_JUDGED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_judged_candidates),
            run_timeout: Duration::from_secs(
                std::env::var("CLIPSIFT_RUN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            render_concurrency: std::env::var("CLIPSIFT_RENDER_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.render_concurrency),
            render_timeout: Duration::from_secs(
                std::env::var("CLIPSIFT_RENDER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            work_dir: std::env::var("CLIPSIFT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("CLIPSIFT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            gemini_models: std::env::var("CLIPSIFT_GEMINI_MODELS")
                .ok()
                .map(|s| parse_list(&s))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.gemini_models),
            scoring_profile_path: std::env::var("CLIPSIFT_SCORING_PROFILE")
                .ok()
                .map(PathBuf::from),
            caption_languages: std::env::var("CLIPSIFT_CAPTION_LANGS")
                .ok()
                .map(|s| parse_list(&s))
                .filter(|langs| !langs.is_empty())
                .unwrap_or(defaults.caption_languages),
            encoding: encoding_overrides(
                defaults.encoding,
                std::env::var("CLIPSIFT_CRF").ok().as_deref(),
                std::env::var("CLIPSIFT_PRESET").ok().as_deref(),
            ),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}
