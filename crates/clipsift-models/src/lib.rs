//! Shared data models for the clipsift pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Timed transcript segments
//! - Clip candidates and their quality assessments
//! - Pipeline thresholds and tunable scoring profiles
//! - Reframe geometry and encoding configuration
//! - Run reports

pub mod candidate;
pub mod config;
pub mod encoding;
pub mod error;
pub mod geometry;
pub mod quality;
pub mod report;
pub mod scoring;
pub mod segment;
pub mod timestamp;
pub mod utils;

// Re-export common types
pub use candidate::{ClipCandidate, ClipType};
pub use config::{PipelineConfig, SelectionPolicy};
pub use encoding::EncodingConfig;
pub use error::{ModelError, ModelResult};
pub use geometry::{AspectRatio, FrameSize, ReframeGeometry, ReframePolicy};
pub use quality::{AnalysisContext, AnalyzerSource, AxisScores, QualityAssessment};
pub use report::{RunId, RunReport, Stage, StageFailure};
pub use scoring::{DurationTargets, Lexicon, ScoringProfile};
pub use segment::{Transcript, TranscriptSegment};
pub use utils::extract_youtube_id;
