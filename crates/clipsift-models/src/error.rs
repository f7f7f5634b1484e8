//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Transcript contains no usable segments")]
    EmptyTranscript,

    #[error("Segment {index} starts at {start:.3}s, before the previous segment at {previous:.3}s")]
    UnorderedSegments {
        index: usize,
        start: f64,
        previous: f64,
    },

    #[error("Invalid clip span: start={start:.3}s end={end:.3}s")]
    InvalidSpan { start: f64, end: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Score out of range: {0}")]
    ScoreOutOfRange(String),

    #[error("Invalid aspect ratio: {0}")]
    InvalidAspectRatio(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
