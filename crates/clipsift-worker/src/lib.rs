//! Transcript-to-clips pipeline.
//!
//! This crate provides:
//! - Transcript providers (yt-dlp captions, JSON files)
//! - Candidate generation, heuristic scoring and overlap resolution
//! - Topic relevance boosting through the similarity service
//! - Quality analysis with a Gemini judge and a heuristic fallback
//! - Final selection, a bounded render pool and the run report

pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod highlights;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod render;
pub mod retry;
pub mod transcript;

pub use config::WorkerConfig;
pub use error::{AnalysisError, WorkerError, WorkerResult};
pub use gemini::GeminiJudge;
pub use logging::RunLogger;
pub use pipeline::{ClipPipeline, Framing, PipelineOutput};
pub use quality::{AnalyzerLimits, ClipJudge, Judgement, QualityAnalyzer, ScoredClip};
pub use render::{ClipRenderer, RenderedClip};
pub use transcript::{JsonTranscriptProvider, TranscriptProvider, YtDlpTranscriptProvider};
