//! Timestamp parsing and formatting.
//!
//! Supports `HH:MM:SS`, `HH:MM:SS.mmm`, `MM:SS` and `SS` on input, and the
//! `HH:MM:SS` / SRT `HH:MM:SS,mmm` forms on output.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("empty timestamp")]
    Empty,

    #[error("invalid {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("negative timestamp")]
    Negative,

    #[error("invalid timestamp format: {0}")]
    InvalidFormat(String),
}

/// Parse a timestamp string to total seconds.
///
/// VTT/SRT style `,` millisecond separators are accepted.
///
/// ```
/// use clipsift_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("00:00:01,500").unwrap(), 1.5);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }
    let normalized = ts.replace(',', ".");

    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    const NAMES: [&str; 3] = ["hours", "minutes", "seconds"];
    let offset = 3 - parts.len();
    let mut total = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let name = NAMES[offset + i];
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(name, part.to_string()))?;
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        total = total * 60.0 + value;
    }

    Ok(total)
}

fn split_millis(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60, ms)
}

/// Format seconds as `HH:MM:SS` (milliseconds rounded away).
pub fn format_seconds(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    let (h, m, s) = if ms >= 500 {
        let total = h * 3600 + m * 60 + s + 1;
        (total / 3600, (total % 3600) / 60, total % 60)
    } else {
        (h, m, s)
    };
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Format seconds as an SRT cue time, `HH:MM:SS,mmm`.
pub fn format_srt_time(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}
