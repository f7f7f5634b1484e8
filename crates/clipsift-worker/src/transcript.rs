//! Transcript providers.
//!
//! A run needs an ordered list of timed segments. They come either from
//! WebVTT captions downloaded with yt-dlp or from a JSON file on disk.
//! A missing transcript ends the run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use clipsift_media::download_captions;
use clipsift_models::timestamp::parse_timestamp;
use clipsift_models::{Transcript, TranscriptSegment};

use crate::error::{WorkerError, WorkerResult};

/// Source of timed transcript segments.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch and validate the transcript for `source`.
    async fn fetch(&self, source: &str) -> WorkerResult<Transcript>;
}

/// Reads `[{text, start, duration}]` from a JSON file. `source` is the path.
#[derive(Debug, Clone, Default)]
pub struct JsonTranscriptProvider;

#[async_trait]
impl TranscriptProvider for JsonTranscriptProvider {
    async fn fetch(&self, source: &str) -> WorkerResult<Transcript> {
        let content = tokio::fs::read_to_string(source).await.map_err(|e| {
            WorkerError::input_missing(format!("cannot read transcript {}: {}", source, e))
        })?;
        let transcript = Transcript::from_json(&content).map_err(WorkerError::from_model)?;
        info!("Loaded {} transcript segments from {}", transcript.len(), source);
        Ok(transcript)
    }
}

/// Downloads captions with yt-dlp and parses the WebVTT cues.
#[derive(Debug, Clone)]
pub struct YtDlpTranscriptProvider {
    work_dir: PathBuf,
    languages: Vec<String>,
}

impl YtDlpTranscriptProvider {
    /// `languages` are tried in order; `en` is appended when missing.
    pub fn new(work_dir: impl Into<PathBuf>, languages: Vec<String>) -> Self {
        let mut languages: Vec<String> = languages
            .into_iter()
            .filter(|l| !l.trim().is_empty())
            .collect();
        if !languages.iter().any(|l| l == "en") {
            languages.push("en".to_string());
        }
        Self {
            work_dir: work_dir.into(),
            languages,
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    async fn read_captions(&self, path: &Path) -> WorkerResult<Transcript> {
        let content = tokio::fs::read_to_string(path).await?;
        let segments = parse_vtt(&content)?;
        info!(
            "Parsed {} caption segments from {}",
            segments.len(),
            path.display()
        );
        Transcript::new(segments).map_err(WorkerError::from_model)
    }
}

#[async_trait]
impl TranscriptProvider for YtDlpTranscriptProvider {
    async fn fetch(&self, source: &str) -> WorkerResult<Transcript> {
        info!("Fetching captions for {} ({:?})", source, self.languages);

        let captions = download_captions(source, &self.languages, &self.work_dir)
            .await
            .map_err(|e| WorkerError::transcript_failed(e.to_string()))?;

        match captions {
            Some(path) => self.read_captions(&path).await,
            None => {
                warn!("No captions available for {}", source);
                Err(WorkerError::input_missing(format!(
                    "no captions for {} in languages {:?}",
                    source, self.languages
                )))
            }
        }
    }
}

/// Parse WebVTT cues into transcript segments.
///
/// Inline tags are stripped. Rolling auto-captions repeat the previous line
/// at the top of each cue; repeated lines are dropped so each segment only
/// carries the new text.
pub fn parse_vtt(content: &str) -> WorkerResult<Vec<TranscriptSegment>> {
    let ts_pattern = Regex::new(
        r"((?:\d{2}:)?\d{2}:\d{2}\.\d{3})\s+-->\s+((?:\d{2}:)?\d{2}:\d{2}\.\d{3})",
    )
    .map_err(|e| WorkerError::transcript_failed(e.to_string()))?;
    let tag_pattern =
        Regex::new(r"<[^>]+>").map_err(|e| WorkerError::transcript_failed(e.to_string()))?;

    let mut segments = Vec::new();
    let mut cue: Option<(f64, f64)> = None;
    let mut cue_lines: Vec<String> = Vec::new();
    let mut previous_line = String::new();

    let mut flush = |cue: Option<(f64, f64)>, lines: &mut Vec<String>| {
        if let Some((start, end)) = cue {
            let text = lines.join(" ");
            if !text.is_empty() && end > start {
                segments.push(TranscriptSegment::new(text, start, end - start));
            }
        }
        lines.clear();
    };

    for raw in content.lines() {
        let line = tag_pattern.replace_all(raw.trim(), "").trim().to_string();

        if let Some(caps) = ts_pattern.captures(&line) {
            flush(cue.take(), &mut cue_lines);
            let start = parse_timestamp(&caps[1]).ok();
            let end = parse_timestamp(&caps[2]).ok();
            cue = start.zip(end);
            continue;
        }

        if line.is_empty()
            || line == "WEBVTT"
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.starts_with("NOTE")
            || line.chars().all(|c| c.is_ascii_digit())
            || cue.is_none()
        {
            continue;
        }

        if line != previous_line {
            cue_lines.push(line.clone());
            previous_line = line;
        }
    }
    flush(cue.take(), &mut cue_lines);

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLLING_VTT: &str = "WEBVTT
Kind: captions
Language: en

00:00:00.000 --> 00:00:02.000
<c>hello</c> <00:00:00.500><c>there</c>

00:00:02.000 --> 00:00:02.010
hello there

00:00:02.010 --> 00:00:05.000
hello there
this is amazing

00:00:05.000 --> 00:00:06.500
this is amazing
the end.
";

    #[test]
    fn test_parse_vtt_dedupes_rolling_captions() {
        let segments = parse_vtt(ROLLING_VTT).unwrap();
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["hello there", "this is amazing", "the end."]);
        assert_eq!(segments[1].start, 2.01);
        assert!((segments[2].duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_vtt_short_timestamps() {
        let vtt = "WEBVTT\n\n1\n00:01.000 --> 00:03.500\nFirst line\n\n2\n00:03.500 --> 00:04.000\nSecond line\n";
        let segments = parse_vtt(vtt).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, 1.0);
        assert_eq!(segments[0].duration, 2.5);
        assert_eq!(segments[1].text, "Second line");
    }

    #[test]
    fn test_provider_appends_english() {
        let provider = YtDlpTranscriptProvider::new("/tmp", vec!["de".to_string()]);
        assert_eq!(provider.languages(), &["de".to_string(), "en".to_string()]);
    }

    #[tokio::test]
    async fn test_json_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.json");
        std::fs::write(
            &path,
            r#"[{"text":"Hello there.","start":0,"duration":2},{"text":"The end.","start":2,"duration":1.5}]"#,
        )
        .unwrap();

        let transcript = JsonTranscriptProvider
            .fetch(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_json_provider_missing_file_is_input_missing() {
        let err = JsonTranscriptProvider
            .fetch("/nonexistent/transcript.json")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::InputMissing(_)));
    }

    #[tokio::test]
    async fn test_json_provider_empty_is_input_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "[]").unwrap();

        let err = JsonTranscriptProvider
            .fetch(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::InputMissing(_)));
    }
}
