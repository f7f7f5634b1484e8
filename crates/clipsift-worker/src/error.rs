//! Worker error types.

use thiserror::Error;

use clipsift_media::MediaError;
use clipsift_ml_client::MlError;
use clipsift_models::ModelError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Run-level errors.
///
/// Only [`WorkerError::InputMissing`] and [`WorkerError::Config`] abort a
/// pipeline run. Everything scoped to one candidate or one clip is recorded
/// in the run report instead.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Input missing: {0}")]
    InputMissing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptFailed(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Similarity service error: {0}")]
    Ml(#[from] MlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn input_missing(msg: impl Into<String>) -> Self {
        Self::InputMissing(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transcript_failed(msg: impl Into<String>) -> Self {
        Self::TranscriptFailed(msg.into())
    }

    /// Lift a model validation error into the run taxonomy.
    ///
    /// An empty or unusable transcript is missing input, invalid thresholds
    /// are configuration errors.
    pub fn from_model(err: ModelError) -> Self {
        match err {
            ModelError::EmptyTranscript | ModelError::UnorderedSegments { .. } => {
                Self::InputMissing(err.to_string())
            }
            ModelError::InvalidConfig(msg) => Self::Config(msg),
            other => Self::Model(other),
        }
    }

    /// Errors that end the run before any clip is produced.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            WorkerError::InputMissing(_) | WorkerError::Config(_) | WorkerError::TranscriptFailed(_)
        )
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Ml(e) => e.is_retryable(),
            WorkerError::Media(MediaError::Timeout(_)) => true,
            WorkerError::TranscriptFailed(_) => true,
            _ => false,
        }
    }
}

/// Why the external judge could not score one candidate.
///
/// Always resolved into a heuristic assessment at the candidate boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("judge not configured: {0}")]
    NotConfigured(String),

    #[error("judge request failed: {0}")]
    Transport(String),

    #[error("judge returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("judge response malformed: {0}")]
    Malformed(String),

    #[error("judge call timed out after {0}s")]
    Timeout(u64),

    #[error("run deadline reached")]
    DeadlineExceeded,
}

impl AnalysisError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Transient failures worth another attempt against the same model.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Transport(_) | AnalysisError::Timeout(_) => true,
            AnalysisError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
